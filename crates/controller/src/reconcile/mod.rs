// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation of the host against desired state.
//!
//! Each sub-reconciler fetches its snapshot from the admin API, diffs and
//! applies it to the host, then reports per-resource status back. A
//! per-type mutex serializes applies: only one reconciliation of a given
//! type runs on a site at a time. Status report failures are logged and
//! never re-fail the reconciliation that produced them.

pub mod deployment;
pub mod firewall;
pub mod secrets;
pub mod ssh_keys;

use libops_adapters::{
    AdminAdapter, AdminError, DeployAdapter, FilterAdapter, HostError, UsersAdapter,
};
use libops_core::{Clock, RequestType};
use libops_wire::{DeploymentStatusReport, ReportStatus, SiteStatusReport};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Errors from reconciliation
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("desired-state fetch failed: {0}")]
    Admin(#[from] AdminError),
    #[error("host apply failed: {0}")]
    Host(#[from] HostError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HEAD is {actual} but deployment pins {expected}")]
    ShaMismatch { expected: String, actual: String },
    #[error("{0}")]
    Partial(String),
}

/// Host adapter bundle.
#[derive(Clone)]
pub struct HostDeps<U, F, D> {
    pub users: U,
    pub filter: F,
    pub deploy: D,
}

/// Where managed state lives on this host.
#[derive(Debug, Clone)]
pub struct ApplySettings {
    pub home_root: PathBuf,
    pub exec_group: String,
    pub secrets_path: PathBuf,
    pub firewall_chain: String,
}

/// Per-type apply locks; one reconciliation of a type at a time.
#[derive(Default)]
struct TypeLocks {
    ssh_keys: Mutex<()>,
    secrets: Mutex<()>,
    firewall: Mutex<()>,
    deployment: Mutex<()>,
}

/// The site's reconciliation engine.
pub struct Reconciler<A, U, F, D, C> {
    site_id: i64,
    admin: A,
    hosts: HostDeps<U, F, D>,
    settings: ApplySettings,
    clock: C,
    locks: TypeLocks,
}

impl<A, U, F, D, C> Reconciler<A, U, F, D, C>
where
    A: AdminAdapter,
    U: UsersAdapter,
    F: FilterAdapter,
    D: DeployAdapter,
    C: Clock,
{
    pub fn new(
        site_id: i64,
        admin: A,
        hosts: HostDeps<U, F, D>,
        settings: ApplySettings,
        clock: C,
    ) -> Self {
        Self { site_id, admin, hosts, settings, clock, locks: TypeLocks::default() }
    }

    /// Converge host users and authorized_keys with the member list.
    pub async fn ssh_keys(&self) -> Result<(), ReconcileError> {
        let _guard = self.locks.ssh_keys.lock().await;

        let members = match self.admin.members(self.site_id).await {
            Ok(members) => members,
            Err(e) => {
                self.report(RequestType::SshKeys, Vec::new(), Err(&e.to_string())).await;
                return Err(e.into());
            }
        };
        let resource_ids: Vec<String> =
            members.iter().map(|m| m.public_id.to_string()).collect();

        let result = ssh_keys::apply(&self.hosts.users, &self.settings, &members).await;
        self.report_outcome(RequestType::SshKeys, resource_ids, &result).await;
        result
    }

    /// Rewrite the secrets env file from the secret list.
    pub async fn secrets(&self) -> Result<(), ReconcileError> {
        let _guard = self.locks.secrets.lock().await;

        let secrets = match self.admin.secrets(self.site_id).await {
            Ok(secrets) => secrets,
            Err(e) => {
                self.report(RequestType::Secrets, Vec::new(), Err(&e.to_string())).await;
                return Err(e.into());
            }
        };
        let resource_ids: Vec<String> = secrets.iter().map(|s| s.id.to_string()).collect();

        let result = secrets::apply(&self.settings, &secrets);
        self.report_outcome(RequestType::Secrets, resource_ids, &result).await;
        result
    }

    /// Rebuild the managed packet-filter chain from the rule list.
    pub async fn firewall(&self) -> Result<(), ReconcileError> {
        let _guard = self.locks.firewall.lock().await;

        let rules = match self.admin.firewall_rules(self.site_id).await {
            Ok(rules) => rules,
            Err(e) => {
                self.report(RequestType::Firewall, Vec::new(), Err(&e.to_string())).await;
                return Err(e.into());
            }
        };
        let resource_ids: Vec<String> = rules.iter().map(|r| r.id.to_string()).collect();

        let result =
            firewall::apply(&self.hosts.filter, &self.settings.firewall_chain, &rules).await;
        self.report_outcome(RequestType::Firewall, resource_ids, &result).await;
        result
    }

    /// Converge the deployment checkout and compose stack.
    ///
    /// A site without a configured deployment is a successful no-op.
    pub async fn deployment(&self) -> Result<(), ReconcileError> {
        let _guard = self.locks.deployment.lock().await;

        let spec = match self.admin.deployment(self.site_id).await {
            Ok(Some(spec)) => spec,
            Ok(None) => {
                info!("no deployment configured, skipping");
                return Ok(());
            }
            Err(e) => {
                self.report(RequestType::Deployment, Vec::new(), Err(&e.to_string())).await;
                return Err(e.into());
            }
        };

        let result = deployment::apply(&self.hosts.deploy, &spec).await;
        self.report_outcome(
            RequestType::Deployment,
            vec![spec.deployment_id.clone()],
            &result,
        )
        .await;

        let deployment_report = DeploymentStatusReport {
            status: if result.is_ok() { ReportStatus::Active } else { ReportStatus::Failed },
            error: result.as_ref().err().map(ToString::to_string),
        };
        if let Err(e) =
            self.admin.report_deployment_status(&spec.deployment_id, &deployment_report).await
        {
            warn!(deployment_id = %spec.deployment_id, error = %e, "deployment status report failed");
        }

        result
    }

    /// The non-deployment surfaces, sequentially.
    ///
    /// One sub-reconciler's failure does not stop its siblings; the first
    /// failures are folded into the returned error. Deployment is excluded
    /// on purpose (push/manual only).
    pub async fn general(&self) -> Result<(), ReconcileError> {
        let mut failures = Vec::new();

        if let Err(e) = self.ssh_keys().await {
            failures.push(format!("ssh_keys: {e}"));
        }
        if let Err(e) = self.secrets().await {
            failures.push(format!("secrets: {e}"));
        }
        if let Err(e) = self.firewall().await {
            failures.push(format!("firewall: {e}"));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReconcileError::Partial(failures.join("; ")))
        }
    }

    async fn report_outcome(
        &self,
        request_type: RequestType,
        resource_ids: Vec<String>,
        result: &Result<(), ReconcileError>,
    ) {
        let outcome = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(e.to_string()),
        };
        self.report(request_type, resource_ids, outcome.as_ref().map(|_| ()).map_err(String::as_str))
            .await;
    }

    /// POST the per-resource status report; failures never propagate.
    async fn report(
        &self,
        request_type: RequestType,
        resource_ids: Vec<String>,
        outcome: Result<(), &str>,
    ) {
        let at = self.clock.timestamp();
        let report = match outcome {
            Ok(()) => SiteStatusReport::active(request_type, resource_ids, at),
            Err(error) => SiteStatusReport::failed(request_type, resource_ids, error, at),
        };
        if let Err(e) = self.admin.report_site_status(self.site_id, &report).await {
            warn!(%request_type, error = %e, "status report failed");
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
