// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation request types

use serde::{Deserialize, Serialize};

/// What a reconciliation request asks a site to converge.
///
/// `Full` re-reads every non-deployment surface and subsumes the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    SshKeys,
    Secrets,
    Firewall,
    Deployment,
    Full,
}

crate::simple_display! {
    RequestType {
        SshKeys => "ssh_keys",
        Secrets => "secrets",
        Firewall => "firewall",
        Deployment => "deployment",
        Full => "full",
    }
}

impl RequestType {
    /// URL path segment on the site controller (`/reconcile/<segment>`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            RequestType::SshKeys => "ssh-keys",
            RequestType::Secrets => "secrets",
            RequestType::Firewall => "firewall",
            RequestType::Deployment => "deployment",
            RequestType::Full => "general",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "ssh-keys" => Some(RequestType::SshKeys),
            "secrets" => Some(RequestType::Secrets),
            "firewall" => Some(RequestType::Firewall),
            "deployment" => Some(RequestType::Deployment),
            "general" => Some(RequestType::Full),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
