// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Site descriptors and desired-state snapshots
//!
//! Snapshots are read-only views at fetch time; each reconciliation pass
//! operates on the snapshot it fetched and never writes these back.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a site VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Active,
    Provisioning,
    Failed,
    Suspended,
    Deleted,
}

crate::simple_display! {
    SiteStatus {
        Active => "active",
        Provisioning => "provisioning",
        Failed => "failed",
        Suspended => "suspended",
        Deleted => "deleted",
    }
}

/// Routing view of a site, as the proxy consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub id: i64,
    pub public_id: Uuid,
    pub project_id: i64,
    /// Absent until the VM has finished provisioning and registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_address: Option<String>,
    pub status: SiteStatus,
}

/// Directory view of a project, enough to climb the scope chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub id: i64,
    pub public_id: Uuid,
    pub organization_id: i64,
}

/// Directory view of an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgDescriptor {
    pub id: i64,
    pub public_id: Uuid,
}

/// One SSH public key of a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKey {
    pub public_key: String,
    /// `SHA256:<base64>` fingerprint, precomputed by the admin API.
    pub fingerprint: String,
}

/// A member entitled to log in to the site's VM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// UUID-shaped; doubles as the managed Unix account name.
    pub public_id: Uuid,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub ssh_keys: Vec<SshKey>,
}

/// A secret rendered into the site's env file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub id: i64,
    pub key: String,
    pub value: String,
}

/// Transport protocol of a firewall rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

crate::simple_display! {
    Protocol {
        Tcp => "tcp",
        Udp => "udp",
        Icmp => "icmp",
    }
}

/// Verdict of a firewall rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
    Drop,
    Reject,
}

crate::simple_display! {
    RuleAction {
        Allow => "allow",
        Deny => "deny",
        Drop => "drop",
        Reject => "reject",
    }
}

impl RuleAction {
    /// The packet-filter target this action maps to.
    ///
    /// `deny` and `drop` are synonyms at the chain level.
    pub fn target(&self) -> &'static str {
        match self {
            RuleAction::Allow => "ACCEPT",
            RuleAction::Deny | RuleAction::Drop => "DROP",
            RuleAction::Reject => "REJECT",
        }
    }
}

/// One firewall rule; list order is apply order, duplicates included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub id: i64,
    pub protocol: Protocol,
    pub port: u16,
    #[serde(rename = "source")]
    pub source_cidr: String,
    pub action: RuleAction,
}

/// Desired deployment of a site: repo checkout plus compose stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub deployment_id: String,
    pub repo: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Access token injected into the clone/fetch remote URL. Never logged.
    #[serde(default)]
    pub token: String,
    pub path: String,
    #[serde(default = "default_compose_file")]
    pub compose_file: String,
    /// Env entries rendered to `<path>/.env`; insertion order is file order.
    #[serde(default)]
    pub env: indexmap::IndexMap<String, String>,
    /// When present, HEAD after checkout must equal this or the deployment fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

fn default_compose_file() -> String {
    "docker-compose.yml".to_string()
}

#[cfg(test)]
#[path = "site_tests.rs"]
mod tests;
