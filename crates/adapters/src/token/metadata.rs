// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token source backed by the platform metadata endpoint.
//!
//! The VM's metadata service issues short-lived service-account tokens;
//! this source caches each token and refreshes ahead of expiry.

use super::{TokenError, TokenSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Refresh when less than this much lifetime remains.
const EXPIRY_GRACE: Duration = Duration::from_secs(60);

/// Deadline for metadata calls; the endpoint is link-local and fast.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Caching client for the metadata token endpoint.
#[derive(Clone)]
pub struct MetadataTokenSource {
    client: reqwest::Client,
    url: String,
    cache: Arc<Mutex<Option<CachedToken>>>,
}

impl MetadataTokenSource {
    pub fn new(url: impl Into<String>) -> Result<Self, TokenError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TokenError::Transport(e.to_string()))?;
        Ok(Self { client, url: url.into(), cache: Arc::new(Mutex::new(None)) })
    }

    async fn fetch(&self) -> Result<CachedToken, TokenError> {
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| TokenError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TokenError::Status(status.as_u16()));
        }

        let body: TokenResponse =
            response.json().await.map_err(|e| TokenError::Decode(e.to_string()))?;

        Ok(CachedToken {
            token: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        })
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn token(&self) -> Result<String, TokenError> {
        {
            let cache = self.cache.lock();
            if let Some(cached) = cache.as_ref() {
                if cached.expires_at.saturating_duration_since(Instant::now()) > EXPIRY_GRACE {
                    return Ok(cached.token.clone());
                }
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *self.cache.lock() = Some(fresh);
        Ok(token)
    }
}
