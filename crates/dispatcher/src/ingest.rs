// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingest endpoint: the RPC layer POSTs event descriptors here.
//!
//! `POST /events` carries one [`EventDescriptor`] per successful mutating
//! RPC. The response only acknowledges enqueueing; reconciliation is
//! eventual. `GET /health` serves liveness probes.

use crate::emitter::{EmitError, Emitter, EventDescriptor};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use libops_adapters::{AdminAdapter, AdminError};
use libops_core::Clock;
use std::sync::Arc;
use tracing::warn;

/// Shared state of the ingest server.
pub struct IngestState<A: AdminAdapter, C: Clock> {
    pub emitter: Emitter<A, C>,
    /// Required bearer token; empty disables auth (development only).
    pub token: String,
}

/// Build the ingest router.
pub fn router<A: AdminAdapter, C: Clock>(state: Arc<IngestState<A, C>>) -> Router {
    Router::new()
        .route("/events", post(ingest_event::<A, C>))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn ingest_event<A: AdminAdapter, C: Clock>(
    State(state): State<Arc<IngestState<A, C>>>,
    headers: HeaderMap,
    Json(descriptor): Json<EventDescriptor>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    if !state.token.is_empty() {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(state.token.as_str()) {
            return Err(StatusCode::UNAUTHORIZED);
        }
    }

    match state.emitter.try_emit(descriptor).await {
        Ok(row) => Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "row": row })))),
        Err(EmitError::Admin(AdminError::NotFound(what))) => {
            warn!(what, "ingest rejected: unknown scope");
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => {
            warn!(error = %e, "ingest failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
