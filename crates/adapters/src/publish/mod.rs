// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging bus publisher
//!
//! The dispatcher hands a [`PushRequest`] to this adapter; the bus's own
//! at-least-once delivery covers redelivery to push consumers. Publish
//! failure is the dispatcher's retry signal.

mod http;

pub use http::HttpPublishAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePublishAdapter;

use async_trait::async_trait;
use libops_wire::{PushRequest, WireError};
use thiserror::Error;

/// Errors from publish operations
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("encode error: {0}")]
    Encode(#[from] WireError),
    #[error("publish request failed: {0}")]
    Transport(String),
    #[error("bus returned status {0}")]
    Status(u16),
}

/// Adapter for publishing reconciliation requests to the bus.
#[async_trait]
pub trait PublishAdapter: Clone + Send + Sync + 'static {
    async fn publish(&self, request: &PushRequest) -> Result<(), PublishError>;
}
