// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queued mutation events
//!
//! An [`EventRecord`] is written once by the emitter and mutated only
//! through its status columns by the dispatcher that holds the claim.

use crate::id::DispatcherId;
use crate::request::RequestType;
use crate::scope::{Scope, ScopeIds};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use uuid::Uuid;

/// Reverse-DNS prefix of every event type the pipeline emits.
pub const EVENT_TYPE_PREFIX: &str = "io.libops.";

/// Version suffix of the current event vocabulary.
pub const EVENT_TYPE_VERSION: &str = ".v1";

/// Dotted event type name, e.g. `io.libops.site.member.created.v1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(SmolStr);

impl EventType {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    /// Build a vocabulary name: `io.libops.<scope>.<action>.v1`.
    pub fn compose(scope: Scope, action: &str) -> Self {
        Self(SmolStr::new(format!("{EVENT_TYPE_PREFIX}{scope}.{action}{EVENT_TYPE_VERSION}")))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The `<scope>.<action>` part, without prefix and version.
    fn stem(&self) -> Option<&str> {
        self.0
            .as_str()
            .strip_prefix(EVENT_TYPE_PREFIX)?
            .strip_suffix(EVENT_TYPE_VERSION)
    }

    /// Scope token embedded in the type name.
    pub fn scope(&self) -> Option<Scope> {
        let stem = self.stem()?;
        let token = stem.split('.').next()?;
        Scope::from_token(token)
    }

    /// The action part after the scope token (`member.created`, `updated`, ...).
    pub fn action(&self) -> Option<&str> {
        let stem = self.stem()?;
        let token_len = stem.split('.').next()?.len();
        stem.get(token_len + 1..)
    }

    /// Reconciliation category this event maps to.
    ///
    /// Total: unrecognized actions classify as `Full`, which re-reads every
    /// desired-state surface and therefore covers whatever the event was.
    pub fn category(&self) -> RequestType {
        let action = match self.action() {
            Some(a) => a,
            None => return RequestType::Full,
        };
        let noun = action.split('.').next().unwrap_or(action);
        match noun {
            "member" => RequestType::SshKeys,
            "secret" => RequestType::Secrets,
            "firewall" => RequestType::Firewall,
            "deployment" => RequestType::Deployment,
            _ => RequestType::Full,
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

/// Queue status of an event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Processing,
    Sent,
    Failed,
    DeadLetter,
}

crate::simple_display! {
    EventStatus {
        Pending => "pending",
        Processing => "processing",
        Sent => "sent",
        Failed => "failed",
        DeadLetter => "dead_letter",
    }
}

impl EventStatus {
    /// Terminal states are never claimed again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Sent | EventStatus::DeadLetter)
    }
}

/// A mutation event as the emitter hands it to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub event_id: Uuid,
    pub event_type: EventType,
    pub source: String,
    pub subject: String,
    pub scope: ScopeIds,
    #[serde(with = "payload_bytes")]
    pub data: Vec<u8>,
    pub content_type: String,
}

/// A durable queue row.
///
/// `id` is dense and monotonic (assigned by the store); `event_id` is the
/// global de-dup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    pub event_id: Uuid,
    pub event_type: EventType,
    pub source: String,
    pub subject: String,
    pub scope: ScopeIds,
    #[serde(with = "payload_bytes")]
    pub data: Vec<u8>,
    pub content_type: String,
    pub status: EventStatus,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_retry_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_by: Option<DispatcherId>,
}

impl EventRecord {
    /// Whether a dispatcher may claim this row.
    ///
    /// `failed` rows stay claimable until their retries are exhausted; the
    /// next poll picks them up again.
    pub fn claimable(&self, max_retries: u32) -> bool {
        match self.status {
            EventStatus::Pending => self.retry_count < max_retries,
            EventStatus::Failed => self.retry_count < max_retries,
            _ => false,
        }
    }

    /// Whether a `processing` claim has outlived the staleness window.
    pub fn stale(&self, now_ms: u64, window_ms: u64) -> bool {
        self.status == EventStatus::Processing
            && self
                .claimed_at_ms
                .map(|at| now_ms.saturating_sub(at) >= window_ms)
                .unwrap_or(true)
    }
}

/// Opaque payload bytes serialized as base64 so WAL lines stay valid JSON.
mod payload_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
