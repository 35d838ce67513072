// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git checkout and compose stack management for the deployment reconciler.

use super::HostError;
use crate::subprocess::{run_checked, COMPOSE_COMMAND_TIMEOUT, GIT_COMMAND_TIMEOUT};
use async_trait::async_trait;
use libops_core::DeploymentSpec;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Adapter for deployment host operations
#[async_trait]
pub trait DeployAdapter: Clone + Send + Sync + 'static {
    /// Bring the checkout at `spec.path` up to date with `spec.git_ref`:
    /// clone if absent, otherwise fetch + checkout + pull. Returns the
    /// resulting HEAD commit sha.
    async fn sync_repo(&self, spec: &DeploymentSpec) -> Result<String, HostError>;

    /// `compose pull` for the stack. Failures here are warn-only upstream.
    async fn compose_pull(&self, spec: &DeploymentSpec) -> Result<(), HostError>;

    /// `compose down` for the stack.
    async fn compose_down(&self, spec: &DeploymentSpec) -> Result<(), HostError>;

    /// `compose up -d --remove-orphans` for the stack.
    async fn compose_up(&self, spec: &DeploymentSpec) -> Result<(), HostError>;
}

/// Production adapter driving git and docker compose.
#[derive(Clone, Default)]
pub struct ComposeDeployAdapter;

impl ComposeDeployAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Inject the access token into an https remote URL.
    fn authenticated_url(repo: &str, token: &str) -> String {
        if token.is_empty() {
            return repo.to_string();
        }
        match repo.strip_prefix("https://") {
            Some(rest) => format!("https://x-access-token:{token}@{rest}"),
            None => repo.to_string(),
        }
    }

    async fn git(args: &[&str], cwd: Option<&Path>, description: &str) -> Result<String, HostError> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        let output = run_checked(cmd, GIT_COMMAND_TIMEOUT, description)
            .await
            .map_err(HostError::Command)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn compose(spec: &DeploymentSpec, args: &[&str], description: &str) -> Result<(), HostError> {
        let mut cmd = Command::new("docker");
        cmd.args(["compose", "-f", &spec.compose_file]);
        cmd.args(args);
        cmd.current_dir(&spec.path);
        run_checked(cmd, COMPOSE_COMMAND_TIMEOUT, description)
            .await
            .map_err(HostError::Command)?;
        Ok(())
    }
}

#[async_trait]
impl DeployAdapter for ComposeDeployAdapter {
    async fn sync_repo(&self, spec: &DeploymentSpec) -> Result<String, HostError> {
        let path = Path::new(&spec.path);
        let url = Self::authenticated_url(&spec.repo, &spec.token);
        debug!(path = %path.display(), git_ref = %spec.git_ref, "syncing checkout");

        if !path.join(".git").is_dir() {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            Self::git(&["clone", &url, &spec.path], None, "git clone").await?;
        } else {
            // Keep the remote current in case the token rotated.
            Self::git(&["remote", "set-url", "origin", &url], Some(path), "git remote set-url")
                .await?;
            Self::git(&["fetch", "origin"], Some(path), "git fetch").await?;
        }

        Self::git(&["checkout", &spec.git_ref], Some(path), "git checkout").await?;
        Self::git(&["pull", "--ff-only", "origin", &spec.git_ref], Some(path), "git pull").await?;
        Self::git(&["rev-parse", "HEAD"], Some(path), "git rev-parse").await
    }

    async fn compose_pull(&self, spec: &DeploymentSpec) -> Result<(), HostError> {
        Self::compose(spec, &["pull"], "compose pull").await
    }

    async fn compose_down(&self, spec: &DeploymentSpec) -> Result<(), HostError> {
        Self::compose(spec, &["down"], "compose down").await
    }

    async fn compose_up(&self, spec: &DeploymentSpec) -> Result<(), HostError> {
        Self::compose(spec, &["up", "-d", "--remove-orphans"], "compose up").await
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDeployAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeDeployState {
        head_sha: String,
        calls: Vec<String>,
        fail_step: Option<String>,
    }

    /// Scripted deploy adapter recording the step sequence.
    #[derive(Clone)]
    pub struct FakeDeployAdapter {
        inner: Arc<Mutex<FakeDeployState>>,
    }

    impl Default for FakeDeployAdapter {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeDeployState {
                    head_sha: "deadbeef".repeat(5),
                    calls: Vec::new(),
                    fail_step: None,
                })),
            }
        }
    }

    impl FakeDeployAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the sha `sync_repo` reports as HEAD.
        pub fn set_head_sha(&self, sha: impl Into<String>) {
            self.inner.lock().head_sha = sha.into();
        }

        /// Step names invoked so far (`sync_repo`, `compose_pull`, ...).
        pub fn calls(&self) -> Vec<String> {
            self.inner.lock().calls.clone()
        }

        /// Fail the named step with a command error.
        pub fn fail_step(&self, step: &str) {
            self.inner.lock().fail_step = Some(step.to_string());
        }

        fn record(&self, step: &str) -> Result<(), HostError> {
            let mut state = self.inner.lock();
            if state.fail_step.as_deref() == Some(step) {
                return Err(HostError::Command(format!("{step} failed")));
            }
            state.calls.push(step.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl DeployAdapter for FakeDeployAdapter {
        async fn sync_repo(&self, _spec: &DeploymentSpec) -> Result<String, HostError> {
            self.record("sync_repo")?;
            Ok(self.inner.lock().head_sha.clone())
        }

        async fn compose_pull(&self, _spec: &DeploymentSpec) -> Result<(), HostError> {
            self.record("compose_pull")
        }

        async fn compose_down(&self, _spec: &DeploymentSpec) -> Result<(), HostError> {
            self.record("compose_down")
        }

        async fn compose_up(&self, _spec: &DeploymentSpec) -> Result<(), HostError> {
            self.record("compose_up")
        }
    }
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
