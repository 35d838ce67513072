// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP publisher: wraps requests in the push envelope and POSTs them to
//! the bus topic endpoint.

use super::{PublishAdapter, PublishError};
use async_trait::async_trait;
use libops_wire::{PushEnvelope, PushRequest};
use std::time::Duration;
use uuid::Uuid;

/// Deadline for publish calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Publishes to a bus topic over HTTP.
#[derive(Clone)]
pub struct HttpPublishAdapter {
    client: reqwest::Client,
    topic_url: String,
    subscription: String,
}

impl HttpPublishAdapter {
    pub fn new(
        topic_url: impl Into<String>,
        subscription: impl Into<String>,
    ) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        Ok(Self { client, topic_url: topic_url.into(), subscription: subscription.into() })
    }
}

#[async_trait]
impl PublishAdapter for HttpPublishAdapter {
    async fn publish(&self, request: &PushRequest) -> Result<(), PublishError> {
        let envelope =
            PushEnvelope::wrap(request, Uuid::new_v4().to_string(), self.subscription.clone())?;

        let response = self
            .client
            .post(&self.topic_url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Status(status.as_u16()));
        }
        Ok(())
    }
}
