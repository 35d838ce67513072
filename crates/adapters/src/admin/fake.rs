// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake admin API adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AdminAdapter, AdminError};
use async_trait::async_trait;
use libops_core::{
    DeploymentSpec, FirewallRule, Member, OrgDescriptor, ProjectDescriptor, Secret, SiteDescriptor,
    SiteStatus,
};
use libops_wire::{CheckinPayload, DeploymentStatusReport, SiteStatusReport};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct FakeAdminState {
    sites: HashMap<i64, SiteDescriptor>,
    projects: HashMap<i64, ProjectDescriptor>,
    orgs: HashMap<i64, OrgDescriptor>,
    members: HashMap<i64, Vec<Member>>,
    secrets: HashMap<i64, Vec<Secret>>,
    rules: HashMap<i64, Vec<FirewallRule>>,
    deployments: HashMap<i64, DeploymentSpec>,
    site_reports: Vec<(i64, SiteStatusReport)>,
    deployment_reports: Vec<(String, DeploymentStatusReport)>,
    checkins: Vec<(i64, CheckinPayload)>,
    fail_message: Option<String>,
    fail_reports_message: Option<String>,
}

/// In-memory admin API with recorded writes and failure injection.
#[derive(Clone, Default)]
pub struct FakeAdminAdapter {
    inner: Arc<Mutex<FakeAdminState>>,
}

impl FakeAdminAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an org → project → site chain with fresh public ids.
    ///
    /// Existing org/project rows are kept, so chains can share ancestors.
    /// Returns the three descriptors for assertions.
    pub fn insert_chain(
        &self,
        org_id: i64,
        project_id: i64,
        site_id: i64,
    ) -> (OrgDescriptor, ProjectDescriptor, SiteDescriptor) {
        let mut state = self.inner.lock();
        let org = state
            .orgs
            .entry(org_id)
            .or_insert_with(|| OrgDescriptor { id: org_id, public_id: Uuid::new_v4() })
            .clone();
        let project = state
            .projects
            .entry(project_id)
            .or_insert_with(|| ProjectDescriptor {
                id: project_id,
                public_id: Uuid::new_v4(),
                organization_id: org_id,
            })
            .clone();
        let site = state
            .sites
            .entry(site_id)
            .or_insert_with(|| SiteDescriptor {
                id: site_id,
                public_id: Uuid::new_v4(),
                project_id,
                external_address: Some(format!("203.0.113.{}", site_id.rem_euclid(250))),
                status: SiteStatus::Active,
            })
            .clone();
        (org, project, site)
    }

    pub fn upsert_site(&self, site: SiteDescriptor) {
        self.inner.lock().sites.insert(site.id, site);
    }

    pub fn set_members(&self, site_id: i64, members: Vec<Member>) {
        self.inner.lock().members.insert(site_id, members);
    }

    pub fn set_secrets(&self, site_id: i64, secrets: Vec<Secret>) {
        self.inner.lock().secrets.insert(site_id, secrets);
    }

    pub fn set_firewall_rules(&self, site_id: i64, rules: Vec<FirewallRule>) {
        self.inner.lock().rules.insert(site_id, rules);
    }

    pub fn set_deployment(&self, site_id: i64, spec: DeploymentSpec) {
        self.inner.lock().deployments.insert(site_id, spec);
    }

    /// All recorded reconciliation status reports.
    pub fn site_reports(&self) -> Vec<(i64, SiteStatusReport)> {
        self.inner.lock().site_reports.clone()
    }

    /// All recorded deployment status reports.
    pub fn deployment_reports(&self) -> Vec<(String, DeploymentStatusReport)> {
        self.inner.lock().deployment_reports.clone()
    }

    /// All recorded check-ins.
    pub fn checkins(&self) -> Vec<(i64, CheckinPayload)> {
        self.inner.lock().checkins.clone()
    }

    /// Make every call fail with a transport error until cleared.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.inner.lock().fail_message = Some(message.into());
    }

    pub fn clear_failure(&self) {
        let mut state = self.inner.lock();
        state.fail_message = None;
        state.fail_reports_message = None;
    }

    /// Fail only the write-back calls (reports, check-ins); reads keep
    /// working. For exercising report-failure tolerance.
    pub fn fail_reports_with(&self, message: impl Into<String>) {
        self.inner.lock().fail_reports_message = Some(message.into());
    }

    fn check_failure(&self) -> Result<(), AdminError> {
        match &self.inner.lock().fail_message {
            Some(message) => Err(AdminError::Transport(message.clone())),
            None => Ok(()),
        }
    }

    fn check_report_failure(&self) -> Result<(), AdminError> {
        self.check_failure()?;
        match &self.inner.lock().fail_reports_message {
            Some(message) => Err(AdminError::Transport(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AdminAdapter for FakeAdminAdapter {
    async fn site(&self, site_id: i64) -> Result<SiteDescriptor, AdminError> {
        self.check_failure()?;
        self.inner
            .lock()
            .sites
            .get(&site_id)
            .cloned()
            .ok_or_else(|| AdminError::NotFound(format!("site {site_id}")))
    }

    async fn site_by_public(&self, public_id: Uuid) -> Result<SiteDescriptor, AdminError> {
        self.check_failure()?;
        self.inner
            .lock()
            .sites
            .values()
            .find(|s| s.public_id == public_id)
            .cloned()
            .ok_or_else(|| AdminError::NotFound(format!("site {public_id}")))
    }

    async fn project(&self, project_id: i64) -> Result<ProjectDescriptor, AdminError> {
        self.check_failure()?;
        self.inner
            .lock()
            .projects
            .get(&project_id)
            .cloned()
            .ok_or_else(|| AdminError::NotFound(format!("project {project_id}")))
    }

    async fn organization(&self, org_id: i64) -> Result<OrgDescriptor, AdminError> {
        self.check_failure()?;
        self.inner
            .lock()
            .orgs
            .get(&org_id)
            .cloned()
            .ok_or_else(|| AdminError::NotFound(format!("organization {org_id}")))
    }

    async fn sites_in_project(&self, public_id: Uuid) -> Result<Vec<SiteDescriptor>, AdminError> {
        self.check_failure()?;
        let state = self.inner.lock();
        let project = state
            .projects
            .values()
            .find(|p| p.public_id == public_id)
            .ok_or_else(|| AdminError::NotFound(format!("project {public_id}")))?;
        Ok(state.sites.values().filter(|s| s.project_id == project.id).cloned().collect())
    }

    async fn sites_in_org(&self, public_id: Uuid) -> Result<Vec<SiteDescriptor>, AdminError> {
        self.check_failure()?;
        let state = self.inner.lock();
        let org = state
            .orgs
            .values()
            .find(|o| o.public_id == public_id)
            .ok_or_else(|| AdminError::NotFound(format!("organization {public_id}")))?;
        let project_ids: Vec<i64> = state
            .projects
            .values()
            .filter(|p| p.organization_id == org.id)
            .map(|p| p.id)
            .collect();
        Ok(state
            .sites
            .values()
            .filter(|s| project_ids.contains(&s.project_id))
            .cloned()
            .collect())
    }

    async fn members(&self, site_id: i64) -> Result<Vec<Member>, AdminError> {
        self.check_failure()?;
        Ok(self.inner.lock().members.get(&site_id).cloned().unwrap_or_default())
    }

    async fn secrets(&self, site_id: i64) -> Result<Vec<Secret>, AdminError> {
        self.check_failure()?;
        Ok(self.inner.lock().secrets.get(&site_id).cloned().unwrap_or_default())
    }

    async fn firewall_rules(&self, site_id: i64) -> Result<Vec<FirewallRule>, AdminError> {
        self.check_failure()?;
        Ok(self.inner.lock().rules.get(&site_id).cloned().unwrap_or_default())
    }

    async fn deployment(&self, site_id: i64) -> Result<Option<DeploymentSpec>, AdminError> {
        self.check_failure()?;
        Ok(self.inner.lock().deployments.get(&site_id).cloned())
    }

    async fn checkin(&self, site_id: i64, payload: &CheckinPayload) -> Result<(), AdminError> {
        self.check_report_failure()?;
        self.inner.lock().checkins.push((site_id, payload.clone()));
        Ok(())
    }

    async fn report_site_status(
        &self,
        site_id: i64,
        report: &SiteStatusReport,
    ) -> Result<(), AdminError> {
        self.check_report_failure()?;
        self.inner.lock().site_reports.push((site_id, report.clone()));
        Ok(())
    }

    async fn report_deployment_status(
        &self,
        deployment_id: &str,
        report: &DeploymentStatusReport,
    ) -> Result<(), AdminError> {
        self.check_report_failure()?;
        self.inner
            .lock()
            .deployment_reports
            .push((deployment_id.to_string(), report.clone()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
