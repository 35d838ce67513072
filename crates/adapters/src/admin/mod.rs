// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin API adapter
//!
//! One surface for every central read and write the pipeline performs:
//! directory lookups (sites/projects/organizations), desired-state
//! snapshots, check-ins and status reports. The emitter, dispatcher, proxy
//! and site controller all speak to the admin API through this trait.

mod http;

pub use http::HttpAdminAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAdminAdapter;

use crate::token::TokenError;
use async_trait::async_trait;
use libops_core::{
    DeploymentSpec, FirewallRule, Member, OrgDescriptor, ProjectDescriptor, Secret, SiteDescriptor,
};
use libops_wire::{CheckinPayload, DeploymentStatusReport, SiteStatusReport};
use thiserror::Error;
use uuid::Uuid;

/// Errors from admin API operations
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {endpoint}")]
    Status { status: u16, endpoint: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("token error: {0}")]
    Token(#[from] TokenError),
}

impl AdminError {
    /// Transient errors worth retrying on the owning loop's next pass.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdminError::Transport(_) | AdminError::Token(_) => true,
            AdminError::Status { status, .. } => *status >= 500,
            AdminError::Decode(_) | AdminError::NotFound(_) => false,
        }
    }
}

/// Adapter for the central admin API
#[async_trait]
pub trait AdminAdapter: Clone + Send + Sync + 'static {
    // Directory reads

    async fn site(&self, site_id: i64) -> Result<SiteDescriptor, AdminError>;

    async fn site_by_public(&self, public_id: Uuid) -> Result<SiteDescriptor, AdminError>;

    async fn project(&self, project_id: i64) -> Result<ProjectDescriptor, AdminError>;

    async fn organization(&self, org_id: i64) -> Result<OrgDescriptor, AdminError>;

    /// All sites under a project, for proxy fan-out of project-scoped requests.
    async fn sites_in_project(&self, public_id: Uuid) -> Result<Vec<SiteDescriptor>, AdminError>;

    /// All sites under an organization, for proxy fan-out of org-scoped requests.
    async fn sites_in_org(&self, public_id: Uuid) -> Result<Vec<SiteDescriptor>, AdminError>;

    // Desired-state snapshots

    async fn members(&self, site_id: i64) -> Result<Vec<Member>, AdminError>;

    async fn secrets(&self, site_id: i64) -> Result<Vec<Secret>, AdminError>;

    async fn firewall_rules(&self, site_id: i64) -> Result<Vec<FirewallRule>, AdminError>;

    /// `None` when the site has no deployment configured.
    async fn deployment(&self, site_id: i64) -> Result<Option<DeploymentSpec>, AdminError>;

    // Writes

    async fn checkin(&self, site_id: i64, payload: &CheckinPayload) -> Result<(), AdminError>;

    async fn report_site_status(
        &self,
        site_id: i64,
        report: &SiteStatusReport,
    ) -> Result<(), AdminError>;

    async fn report_deployment_status(
        &self,
        deployment_id: &str,
        report: &DeploymentStatusReport,
    ) -> Result<(), AdminError>;
}
