// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Check-in loop: a liveness ping to the admin API every minute.

use libops_adapters::AdminAdapter;
use libops_wire::CheckinPayload;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run the check-in loop until cancelled.
///
/// Failures are logged and retried on the next tick; a missed check-in
/// only delays the fleet view, never the controller.
pub async fn run<A: AdminAdapter>(
    admin: A,
    site_id: i64,
    interval: Duration,
    version: String,
    started: Instant,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let payload = CheckinPayload {
                    version: version.clone(),
                    uptime_secs: started.elapsed().as_secs(),
                };
                match admin.checkin(site_id, &payload).await {
                    Ok(()) => debug!(uptime_secs = payload.uptime_secs, "checked in"),
                    Err(e) => warn!(error = %e, "check-in failed"),
                }
            }
            _ = cancel.cancelled() => {
                info!("check-in loop stopped");
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "checkin_tests.rs"]
mod tests;
