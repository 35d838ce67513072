// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface of the proxy: the bus push endpoint and health.

use crate::controller_client::ControllerClient;
use crate::forward::{handle_push, PushOutcome};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use libops_adapters::AdminAdapter;
use libops_wire::PushEnvelope;
use std::sync::Arc;

/// Shared state of the push server.
pub struct ProxyState<A: AdminAdapter, CC: ControllerClient> {
    pub admin: A,
    pub controllers: CC,
}

/// Build the proxy router.
pub fn router<A: AdminAdapter, CC: ControllerClient>(state: Arc<ProxyState<A, CC>>) -> Router {
    Router::new()
        .route("/push", post(push::<A, CC>))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn push<A: AdminAdapter, CC: ControllerClient>(
    State(state): State<Arc<ProxyState<A, CC>>>,
    Json(envelope): Json<PushEnvelope>,
) -> (StatusCode, String) {
    match handle_push(&state.admin, &state.controllers, &envelope).await {
        PushOutcome::Delivered { .. } => (StatusCode::OK, String::new()),
        PushOutcome::Malformed(message) => (StatusCode::BAD_REQUEST, message),
        PushOutcome::Retry(message) => (StatusCode::BAD_GATEWAY, message),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
