// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Push handling: decode, resolve affected sites, forward.
//!
//! Scope fan-out happens here: a site-scoped request reaches one site, a
//! project- or org-scoped request reaches every descendant site. Sites
//! without an external address are skipped and acked; redelivering cannot
//! make an unaddressable site reachable.

use crate::controller_client::ControllerClient;
use libops_adapters::{AdminAdapter, AdminError};
use libops_core::SiteDescriptor;
use libops_wire::{PushEnvelope, PushRequest};
use tracing::{info, warn};

/// What the proxy should answer the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Delivered to every reachable affected site (including "none were
    /// reachable"); ack the message.
    Delivered { forwarded: usize, skipped: usize },
    /// The payload can never be processed; ack-with-error (4xx).
    Malformed(String),
    /// Transient failure; nack (5xx) so the bus redelivers.
    Retry(String),
}

/// Handle one push delivery end to end.
pub async fn handle_push<A: AdminAdapter, CC: ControllerClient>(
    admin: &A,
    controllers: &CC,
    envelope: &PushEnvelope,
) -> PushOutcome {
    let request = match envelope.decode() {
        Ok(request) => request,
        Err(e) => return PushOutcome::Malformed(format!("undecodable push payload: {e}")),
    };

    let sites = match affected_sites(admin, &request).await {
        Ok(sites) => sites,
        Err(AdminError::NotFound(what)) => {
            // The scope vanished between publish and delivery; nothing left
            // to reconcile.
            info!(what, "push target gone, acking");
            return PushOutcome::Delivered { forwarded: 0, skipped: 0 };
        }
        Err(e) => return PushOutcome::Retry(format!("site lookup failed: {e}")),
    };

    let mut forwarded = 0;
    let mut skipped = 0;
    let mut failures = Vec::new();

    for site in &sites {
        let Some(address) = site.external_address.as_deref() else {
            skipped += 1;
            continue;
        };
        match controllers.reconcile(address, &request).await {
            Ok(()) => forwarded += 1,
            Err(e) => {
                warn!(site = site.id, address, error = %e, "forward failed");
                failures.push(format!("site {}: {e}", site.id));
            }
        }
    }

    if !failures.is_empty() {
        return PushOutcome::Retry(failures.join("; "));
    }

    info!(
        request_type = %request.request_type,
        events = request.event_ids.len(),
        forwarded,
        skipped,
        "push delivered"
    );
    PushOutcome::Delivered { forwarded, skipped }
}

/// Sites covered by the request's scope, innermost first.
async fn affected_sites<A: AdminAdapter>(
    admin: &A,
    request: &PushRequest,
) -> Result<Vec<SiteDescriptor>, AdminError> {
    if let Some(site_public_id) = request.site_public_id {
        return Ok(vec![admin.site_by_public(site_public_id).await?]);
    }
    if let Some(project_public_id) = request.project_public_id {
        return admin.sites_in_project(project_public_id).await;
    }
    if let Some(org_public_id) = request.org_public_id {
        return admin.sites_in_org(org_public_id).await;
    }
    Err(AdminError::NotFound("request carries no scope ids".to_string()))
}

#[cfg(test)]
#[path = "forward_tests.rs"]
mod tests;
