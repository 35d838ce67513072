// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound calls to site controllers.

use async_trait::async_trait;
use libops_wire::{PushRequest, HEADER_EVENT_IDS, HEADER_REQUEST_TYPE};
use std::time::Duration;
use thiserror::Error;

/// Deadline for a single controller call; the apply happens asynchronously
/// on the site, the endpoint only acknowledges the trigger.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from forwarding to a site controller
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("controller request failed: {0}")]
    Transport(String),
    #[error("controller returned status {0}")]
    Status(u16),
}

/// Adapter for the site controller HTTP surface
#[async_trait]
pub trait ControllerClient: Clone + Send + Sync + 'static {
    /// POST the request to `http://<address>:<port>/reconcile/<type>`.
    async fn reconcile(&self, address: &str, request: &PushRequest) -> Result<(), ForwardError>;
}

/// Production client speaking to real site controllers.
#[derive(Clone)]
pub struct HttpControllerClient {
    client: reqwest::Client,
    port: u16,
    token: String,
}

impl HttpControllerClient {
    pub fn new(port: u16, token: impl Into<String>) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ForwardError::Transport(e.to_string()))?;
        Ok(Self { client, port, token: token.into() })
    }
}

#[async_trait]
impl ControllerClient for HttpControllerClient {
    async fn reconcile(&self, address: &str, request: &PushRequest) -> Result<(), ForwardError> {
        let url = format!(
            "http://{}:{}/reconcile/{}",
            address,
            self.port,
            request.request_type.path_segment()
        );

        let event_ids = request
            .event_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(HEADER_REQUEST_TYPE, request.request_type.to_string())
            .header(HEADER_EVENT_IDS, event_ids)
            .json(request)
            .send()
            .await
            .map_err(|e| ForwardError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::Status(status.as_u16()));
        }
        Ok(())
    }
}

// Test support
#[cfg(test)]
pub use fake::FakeControllerClient;
