// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller → admin API payloads: reconciliation status and check-in.

use chrono::{DateTime, Utc};
use libops_core::RequestType;
use serde::{Deserialize, Serialize};

/// Outcome of a reconciliation for a set of resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Active,
    Failed,
}

libops_core::simple_display! {
    ReportStatus {
        Active => "active",
        Failed => "failed",
    }
}

/// Per-resource reconciliation outcome, POSTed to
/// `/admin/sites/<site_id>/reconciliation/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStatusReport {
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: ReportStatus,
    pub resource_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SiteStatusReport {
    pub fn active(request_type: RequestType, resource_ids: Vec<String>, at: DateTime<Utc>) -> Self {
        Self { request_type, status: ReportStatus::Active, resource_ids, error: None, timestamp: at }
    }

    pub fn failed(
        request_type: RequestType,
        resource_ids: Vec<String>,
        error: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            request_type,
            status: ReportStatus::Failed,
            resource_ids,
            error: Some(error.into()),
            timestamp: at,
        }
    }
}

/// Deployment outcome, POSTed to `/admin/deployments/<deployment_id>/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentStatusReport {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness ping, POSTed to `/admin/sites/<site_id>/checkin` every minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinPayload {
    pub version: String,
    pub uptime_secs: u64,
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
