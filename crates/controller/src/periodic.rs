// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic reconciliation: the eventual-consistency backstop.
//!
//! Every 12 hours the controller converges ssh_keys + secrets + firewall
//! even if every push was lost. Deployment is excluded: re-deploying on a
//! schedule would bounce healthy stacks (push/manual only).

use crate::reconcile::Reconciler;
use libops_adapters::{AdminAdapter, DeployAdapter, FilterAdapter, UsersAdapter};
use libops_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the periodic loop until cancelled.
///
/// The first pass fires immediately, covering the initial-connect case:
/// a freshly provisioned or rebooted VM converges without waiting for a
/// push.
pub async fn run<A, U, F, D, C>(
    reconciler: Arc<Reconciler<A, U, F, D, C>>,
    every: Duration,
    cancel: CancellationToken,
) where
    A: AdminAdapter,
    U: UsersAdapter,
    F: FilterAdapter,
    D: DeployAdapter,
    C: Clock,
{
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                info!("periodic reconciliation pass");
                if let Err(e) = reconciler.general().await {
                    warn!(error = %e, "periodic reconciliation incomplete");
                }
            }
            _ = cancel.cancelled() => {
                info!("periodic loop stopped");
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "periodic_tests.rs"]
mod tests;
