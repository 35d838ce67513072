// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer token sources for admin API auth.
//!
//! Site controllers and the proxy authenticate with a short-lived token
//! fetched from the platform metadata endpoint; tests and development use a
//! static token.

mod metadata;

pub use metadata::MetadataTokenSource;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from token acquisition
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("metadata request failed: {0}")]
    Transport(String),
    #[error("metadata endpoint returned status {0}")]
    Status(u16),
    #[error("token decode error: {0}")]
    Decode(String),
}

/// Source of bearer tokens for outbound admin API calls.
#[async_trait]
pub trait TokenSource: Clone + Send + Sync + 'static {
    /// A token currently valid for at least a short grace period.
    async fn token(&self) -> Result<String, TokenError>;
}

/// Fixed token, for tests and local development.
#[derive(Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<String, TokenError> {
        Ok(self.token.clone())
    }
}
