// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event emitter: descriptor in, queue row out.
//!
//! Mutating RPC handlers describe their successful writes explicitly; the
//! emitter never reflects on message shapes. Read-only, delete-with-manual-
//! emission and account-scoped procedures simply never produce a descriptor.
//!
//! The descriptor names the innermost scope only; the emitter back-fills
//! ancestors (site → project → organization) through the admin directory so
//! the dispatcher can detect overlap without further lookups.

use libops_adapters::{AdminAdapter, AdminError};
use libops_core::{Clock, EventType, IdGen, NewEvent, ScopeIds, UuidIdGen};
use libops_storage::{EventQueue, StoreError};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Errors from event emission
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("scope resolution failed: {0}")]
    Admin(#[from] AdminError),
    #[error("enqueue failed: {0}")]
    Store(#[from] StoreError),
}

/// Innermost scope of a mutation, as the RPC layer knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum ScopeRef {
    Organization(i64),
    Project(i64),
    Site(i64),
}

/// What a mutating RPC handler reports about a successful write.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDescriptor {
    pub event_type: EventType,
    pub source: String,
    pub subject: String,
    #[serde(flatten)]
    pub scope: ScopeRef,
    pub payload: serde_json::Value,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Turns descriptors into durable queue rows.
pub struct Emitter<A: AdminAdapter, C: Clock, G: IdGen = UuidIdGen> {
    queue: Arc<Mutex<EventQueue<C>>>,
    admin: A,
    idgen: G,
}

impl<A: AdminAdapter, C: Clock> Emitter<A, C, UuidIdGen> {
    pub fn new(queue: Arc<Mutex<EventQueue<C>>>, admin: A) -> Self {
        Self { queue, admin, idgen: UuidIdGen }
    }
}

impl<A: AdminAdapter, C: Clock, G: IdGen> Emitter<A, C, G> {
    pub fn with_idgen(queue: Arc<Mutex<EventQueue<C>>>, admin: A, idgen: G) -> Self {
        Self { queue, admin, idgen }
    }

    /// Enqueue one event for the descriptor.
    ///
    /// The RPC that produced the descriptor already committed, so failures
    /// here are logged and swallowed; the write stays durable either way and
    /// the periodic reconciler eventually converges the site.
    pub async fn emit(&self, descriptor: EventDescriptor) {
        let event_type = descriptor.event_type.clone();
        match self.try_emit(descriptor).await {
            Ok(row) => info!(row, %event_type, "event enqueued"),
            Err(e) => error!(%event_type, error = %e, "failed to enqueue event"),
        }
    }

    /// Enqueue and report the row id.
    pub async fn try_emit(&self, descriptor: EventDescriptor) -> Result<u64, EmitError> {
        let scope = self.backfill(descriptor.scope).await?;

        let data = serde_json::to_vec(&descriptor.payload).unwrap_or_default();
        let new = NewEvent {
            event_id: self.idgen.next(),
            event_type: descriptor.event_type,
            source: descriptor.source,
            subject: descriptor.subject,
            scope,
            data,
            content_type: descriptor.content_type,
        };

        Ok(self.queue.lock().enqueue(new)?)
    }

    /// Resolve the full ancestor chain for the innermost scope id.
    async fn backfill(&self, scope: ScopeRef) -> Result<ScopeIds, EmitError> {
        Ok(match scope {
            ScopeRef::Organization(org_id) => ScopeIds::organization(org_id),
            ScopeRef::Project(project_id) => {
                let project = self.admin.project(project_id).await?;
                ScopeIds::project(project.organization_id, project_id)
            }
            ScopeRef::Site(site_id) => {
                let site = self.admin.site(site_id).await?;
                let project = self.admin.project(site.project_id).await?;
                ScopeIds::site(project.organization_id, site.project_id, site_id)
            }
        })
    }
}

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;
