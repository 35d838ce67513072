// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push-message envelope and the reconciliation request it carries.
//!
//! The bus delivers `{message: {data: base64-json, ...}, subscription}`;
//! the inner JSON is a [`PushRequest`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use libops_core::RequestType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Errors from envelope encode/decode
#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// The reconciliation request as it travels to the proxy.
///
/// Scope is conveyed by which public ids are present: a site-scoped request
/// has all three, a project-scoped one has project + org, an org-scoped one
/// only the org.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_public_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_public_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_public_id: Option<Uuid>,
    pub request_type: RequestType,
    pub event_ids: Vec<Uuid>,
    pub timestamp: DateTime<Utc>,
}

/// Inner message of a push delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    /// Base64-encoded JSON of a [`PushRequest`].
    pub data: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub message_id: String,
    pub publish_time: DateTime<Utc>,
}

/// The envelope the bus POSTs to push consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    pub subscription: String,
}

impl PushEnvelope {
    /// Wrap a request for publishing.
    ///
    /// `request_type` is duplicated into the attributes so subscriptions can
    /// filter without decoding the payload.
    pub fn wrap(
        request: &PushRequest,
        message_id: impl Into<String>,
        subscription: impl Into<String>,
    ) -> Result<Self, WireError> {
        let json = serde_json::to_vec(request)?;
        let mut attributes = HashMap::new();
        attributes.insert("request_type".to_string(), request.request_type.to_string());
        Ok(Self {
            message: PushMessage {
                data: STANDARD.encode(json),
                attributes,
                message_id: message_id.into(),
                publish_time: request.timestamp,
            },
            subscription: subscription.into(),
        })
    }

    /// Decode the inner request.
    pub fn decode(&self) -> Result<PushRequest, WireError> {
        let json = STANDARD.decode(&self.message.data)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
