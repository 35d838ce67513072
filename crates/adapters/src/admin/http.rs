// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP admin API client with bearer auth from a token source.

use super::{AdminAdapter, AdminError};
use crate::token::TokenSource;
use async_trait::async_trait;
use libops_core::{
    DeploymentSpec, FirewallRule, Member, OrgDescriptor, ProjectDescriptor, Secret, SiteDescriptor,
};
use libops_wire::{CheckinPayload, DeploymentStatusReport, SiteStatusReport};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Deadline for individual admin API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the admin API.
///
/// Cheap to clone; the underlying `reqwest::Client` is an Arc.
#[derive(Clone)]
pub struct HttpAdminAdapter<T: TokenSource> {
    client: reqwest::Client,
    base_url: String,
    tokens: T,
}

// List endpoints wrap their payload in a keyed object.
#[derive(Deserialize)]
struct MembersBody {
    members: Vec<Member>,
}

#[derive(Deserialize)]
struct SecretsBody {
    secrets: Vec<Secret>,
}

#[derive(Deserialize)]
struct RulesBody {
    rules: Vec<FirewallRule>,
}

#[derive(Deserialize)]
struct SitesBody {
    sites: Vec<SiteDescriptor>,
}

impl<T: TokenSource> HttpAdminAdapter<T> {
    pub fn new(base_url: impl Into<String>, tokens: T) -> Result<Self, AdminError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AdminError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, AdminError> {
        let token = self.tokens.token().await?;
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AdminError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(AdminError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(AdminError::Status { status: status.as_u16(), endpoint: path.to_string() });
        }

        response.json().await.map_err(|e| AdminError::Decode(e.to_string()))
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), AdminError> {
        let token = self.tokens.token().await?;
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| AdminError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdminError::Status { status: status.as_u16(), endpoint: path.to_string() });
        }
        Ok(())
    }
}

#[async_trait]
impl<T: TokenSource> AdminAdapter for HttpAdminAdapter<T> {
    async fn site(&self, site_id: i64) -> Result<SiteDescriptor, AdminError> {
        self.get_json(&format!("/admin/sites/{site_id}")).await
    }

    async fn site_by_public(&self, public_id: Uuid) -> Result<SiteDescriptor, AdminError> {
        self.get_json(&format!("/admin/sites/by-public-id/{public_id}")).await
    }

    async fn project(&self, project_id: i64) -> Result<ProjectDescriptor, AdminError> {
        self.get_json(&format!("/admin/projects/{project_id}")).await
    }

    async fn organization(&self, org_id: i64) -> Result<OrgDescriptor, AdminError> {
        self.get_json(&format!("/admin/organizations/{org_id}")).await
    }

    async fn sites_in_project(&self, public_id: Uuid) -> Result<Vec<SiteDescriptor>, AdminError> {
        let body: SitesBody =
            self.get_json(&format!("/admin/projects/by-public-id/{public_id}/sites")).await?;
        Ok(body.sites)
    }

    async fn sites_in_org(&self, public_id: Uuid) -> Result<Vec<SiteDescriptor>, AdminError> {
        let body: SitesBody =
            self.get_json(&format!("/admin/organizations/by-public-id/{public_id}/sites")).await?;
        Ok(body.sites)
    }

    async fn members(&self, site_id: i64) -> Result<Vec<Member>, AdminError> {
        let body: MembersBody = self.get_json(&format!("/admin/sites/{site_id}/members")).await?;
        Ok(body.members)
    }

    async fn secrets(&self, site_id: i64) -> Result<Vec<Secret>, AdminError> {
        let body: SecretsBody = self.get_json(&format!("/admin/sites/{site_id}/secrets")).await?;
        Ok(body.secrets)
    }

    async fn firewall_rules(&self, site_id: i64) -> Result<Vec<FirewallRule>, AdminError> {
        let body: RulesBody = self.get_json(&format!("/admin/sites/{site_id}/firewall")).await?;
        Ok(body.rules)
    }

    async fn deployment(&self, site_id: i64) -> Result<Option<DeploymentSpec>, AdminError> {
        match self.get_json(&format!("/admin/sites/{site_id}/deployment")).await {
            Ok(spec) => Ok(Some(spec)),
            Err(AdminError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn checkin(&self, site_id: i64, payload: &CheckinPayload) -> Result<(), AdminError> {
        self.post_json(&format!("/admin/sites/{site_id}/checkin"), payload).await
    }

    async fn report_site_status(
        &self,
        site_id: i64,
        report: &SiteStatusReport,
    ) -> Result<(), AdminError> {
        self.post_json(&format!("/admin/sites/{site_id}/reconciliation/status"), report).await
    }

    async fn report_deployment_status(
        &self,
        deployment_id: &str,
        report: &DeploymentStatusReport,
    ) -> Result<(), AdminError> {
        self.post_json(&format!("/admin/deployments/{deployment_id}/status"), report).await
    }
}
