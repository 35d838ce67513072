// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake publisher for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PublishAdapter, PublishError};
use async_trait::async_trait;
use libops_wire::PushRequest;
use parking_lot::Mutex;
use std::sync::Arc;

struct FakePublishState {
    published: Vec<PushRequest>,
    fail_remaining: u32,
    fail_always: bool,
}

/// Records published requests; can fail the next N publishes or all of them.
#[derive(Clone)]
pub struct FakePublishAdapter {
    inner: Arc<Mutex<FakePublishState>>,
}

impl Default for FakePublishAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakePublishState {
                published: Vec::new(),
                fail_remaining: 0,
                fail_always: false,
            })),
        }
    }
}

impl FakePublishAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All successfully published requests, in order.
    pub fn published(&self) -> Vec<PushRequest> {
        self.inner.lock().published.clone()
    }

    /// Fail the next `n` publish calls with a transport error.
    pub fn fail_times(&self, n: u32) {
        self.inner.lock().fail_remaining = n;
    }

    /// Fail every publish until `recover` is called.
    pub fn fail_always(&self) {
        self.inner.lock().fail_always = true;
    }

    /// Stop failing.
    pub fn recover(&self) {
        let mut state = self.inner.lock();
        state.fail_always = false;
        state.fail_remaining = 0;
    }
}

#[async_trait]
impl PublishAdapter for FakePublishAdapter {
    async fn publish(&self, request: &PushRequest) -> Result<(), PublishError> {
        let mut state = self.inner.lock();
        if state.fail_always {
            return Err(PublishError::Transport("bus unavailable".to_string()));
        }
        if state.fail_remaining > 0 {
            state.fail_remaining -= 1;
            return Err(PublishError::Transport("bus unavailable".to_string()));
        }
        state.published.push(request.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
