// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface of the site controller.
//!
//! One POST endpoint per reconciliation type plus `general` (everything but
//! deployment) and a health probe. Reconcile routes require the platform
//! bearer token and share one rate-limit bucket.

use crate::ratelimit::TokenBucket;
use crate::reconcile::Reconciler;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use libops_adapters::{AdminAdapter, DeployAdapter, FilterAdapter, UsersAdapter};
use libops_core::{Clock, RequestType};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Shared state of the controller server.
///
/// Holds the same `Reconciler` the periodic loop uses, so pushes and the
/// periodic pass serialize on the same per-type locks.
pub struct ServerState<A, U, F, D, C> {
    pub reconciler: Arc<Reconciler<A, U, F, D, C>>,
    pub bucket: Mutex<TokenBucket>,
    /// Required bearer token; empty disables auth (development only).
    pub token: String,
}

/// Build the controller router.
pub fn router<A, U, F, D, C>(state: Arc<ServerState<A, U, F, D, C>>) -> Router
where
    A: AdminAdapter,
    U: UsersAdapter,
    F: FilterAdapter,
    D: DeployAdapter,
    C: Clock,
{
    Router::new()
        .route("/reconcile/{kind}", post(reconcile::<A, U, F, D, C>))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn reconcile<A, U, F, D, C>(
    State(state): State<Arc<ServerState<A, U, F, D, C>>>,
    Path(kind): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, String)
where
    A: AdminAdapter,
    U: UsersAdapter,
    F: FilterAdapter,
    D: DeployAdapter,
    C: Clock,
{
    if !state.token.is_empty() {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if presented != Some(state.token.as_str()) {
            return (StatusCode::UNAUTHORIZED, "missing or invalid bearer token".to_string());
        }
    }

    let Some(request_type) = RequestType::from_path_segment(&kind) else {
        return (StatusCode::NOT_FOUND, format!("unknown reconciliation type: {kind}"));
    };

    if !state.bucket.lock().try_acquire(Instant::now()) {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limited".to_string());
    }

    info!(%request_type, "reconciliation triggered by push");
    let result = match request_type {
        RequestType::SshKeys => state.reconciler.ssh_keys().await,
        RequestType::Secrets => state.reconciler.secrets().await,
        RequestType::Firewall => state.reconciler.firewall().await,
        RequestType::Deployment => state.reconciler.deployment().await,
        RequestType::Full => state.reconciler.general().await,
    };

    match result {
        Ok(()) => (StatusCode::OK, "OK".to_string()),
        Err(e) => {
            warn!(%request_type, error = %e, "reconciliation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
