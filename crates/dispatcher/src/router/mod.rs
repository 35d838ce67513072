// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatch loop: claim, debounce, collapse, classify, publish, mark.
//!
//! One [`Dispatcher`] instance owns a claim identity and an in-memory
//! [`GroupMap`] held across poll cycles (a group may wait out its debounce
//! window over several polls). All queue mutations go through the durable
//! store; the map is rebuilt from re-claimed rows after a crash.

mod classify;
mod group;

pub use group::{Group, GroupMap};

use crate::config::Tuning;
use libops_adapters::{AdminAdapter, AdminError, PublishAdapter, PublishError};
use libops_core::{Clock, DispatcherId, Scope};
use libops_storage::{EventQueue, StoreError};
use libops_wire::PushRequest;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Errors that abort a tick. Publish and admin failures do not: they feed
/// the per-event retry path instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("queue error: {0}")]
    Store(#[from] StoreError),
}

/// Why a group could not be published this round.
#[derive(Debug, Error)]
enum GroupFailure {
    #[error("scope resolution failed: {0}")]
    Admin(#[from] AdminError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

/// What one tick did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    pub recovered: usize,
    pub claimed: usize,
    pub published_requests: usize,
    pub sent: usize,
    pub failed: usize,
    pub dead_lettered: usize,
}

/// Cumulative counters for the hourly summary line.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counters {
    pub claimed: u64,
    pub published_requests: u64,
    pub sent: u64,
    pub failed: u64,
    pub dead_lettered: u64,
    pub recovered: u64,
}

impl Counters {
    fn absorb(&mut self, stats: &TickStats) {
        self.claimed += stats.claimed as u64;
        self.published_requests += stats.published_requests as u64;
        self.sent += stats.sent as u64;
        self.failed += stats.failed as u64;
        self.dead_lettered += stats.dead_lettered as u64;
        self.recovered += stats.recovered as u64;
    }
}

/// The event router.
pub struct Dispatcher<P: PublishAdapter, A: AdminAdapter, C: Clock> {
    id: DispatcherId,
    queue: Arc<Mutex<EventQueue<C>>>,
    publisher: P,
    admin: A,
    clock: C,
    tuning: Tuning,
    groups: GroupMap,
    counters: Counters,
}

impl<P: PublishAdapter, A: AdminAdapter, C: Clock> Dispatcher<P, A, C> {
    pub fn new(
        queue: Arc<Mutex<EventQueue<C>>>,
        publisher: P,
        admin: A,
        clock: C,
        tuning: Tuning,
    ) -> Self {
        Self {
            id: DispatcherId::new(),
            queue,
            publisher,
            admin,
            clock,
            tuning,
            groups: GroupMap::new(),
            counters: Counters::default(),
        }
    }

    pub fn id(&self) -> &DispatcherId {
        &self.id
    }

    /// One poll cycle: recover, claim, fold, emit due groups, mark.
    pub async fn tick(&mut self) -> Result<TickStats, DispatchError> {
        let mut stats = TickStats::default();

        // Stale recovery first: rows orphaned by a crashed instance (or by
        // this one before a restart) become claimable again.
        let released = self.queue.lock().recover_stale(self.tuning.stale_after())?;
        self.groups.forget_rows(&released);
        stats.recovered = released.len();

        let held = {
            let mut queue = self.queue.lock();
            stats.claimed =
                queue.claim(&self.id, self.tuning.max_retries, self.tuning.batch_size)?;
            queue.claimed_by(&self.id)
        };

        for record in &held {
            if !self.groups.fold(record) {
                // Unroutable without scope ids; park it for the operator.
                warn!(row = record.id, "event has no scope ids, dead-lettering");
                self.queue.lock().mark_dead_letter(record.id, "event has no scope ids")?;
                stats.dead_lettered += 1;
            }
        }

        let now_ms = self.clock.epoch_ms();
        let due = self.groups.take_due(now_ms, &self.tuning);
        for group in due {
            match self.publish_group(&group).await {
                Ok(request_count) => {
                    let mut queue = self.queue.lock();
                    for row in &group.rows {
                        queue.mark_sent(*row)?;
                    }
                    stats.sent += group.rows.len();
                    stats.published_requests += request_count;
                    debug!(
                        scope = %group.scope,
                        scope_id = group.scope_id,
                        events = group.rows.len(),
                        requests = request_count,
                        "group published"
                    );
                }
                Err(failure) => {
                    let message = failure.to_string();
                    warn!(
                        scope = %group.scope,
                        scope_id = group.scope_id,
                        events = group.rows.len(),
                        error = %message,
                        "group publish failed"
                    );
                    let mut queue = self.queue.lock();
                    for row in &group.rows {
                        let retries = queue.mark_failed(*row, &message)?;
                        stats.failed += 1;
                        if retries >= self.tuning.max_retries {
                            queue.mark_dead_letter(*row, &message)?;
                            stats.dead_lettered += 1;
                        }
                    }
                }
            }
        }

        self.counters.absorb(&stats);
        Ok(stats)
    }

    /// Groups currently waiting out their debounce window.
    pub fn held_groups(&self) -> usize {
        self.groups.len()
    }

    /// Emit the cumulative summary line.
    pub fn log_summary(&self) {
        let queue_stats = self.queue.lock().stats();
        info!(
            claimed = self.counters.claimed,
            published = self.counters.published_requests,
            sent = self.counters.sent,
            failed = self.counters.failed,
            dead_lettered = self.counters.dead_lettered,
            recovered = self.counters.recovered,
            pending = queue_stats.pending,
            "dispatcher summary"
        );
    }

    /// Publish one request per classified type for the group.
    ///
    /// All requests must succeed for the group to count as published; a
    /// partial failure retries the whole group (consumers re-read desired
    /// state, so duplicate delivery is harmless).
    async fn publish_group(&self, group: &Group) -> Result<usize, GroupFailure> {
        let (site, project, org) = self.scope_public_ids(group).await?;

        let types = classify::request_types(&group.categories);
        for request_type in &types {
            let request = PushRequest {
                site_public_id: site,
                project_public_id: project,
                org_public_id: org,
                request_type: *request_type,
                event_ids: group.event_ids.clone(),
                timestamp: self.clock.timestamp(),
            };
            self.publisher.publish(&request).await?;
        }
        Ok(types.len())
    }

    /// Public ids of the group's effective scope and its ancestors.
    async fn scope_public_ids(
        &self,
        group: &Group,
    ) -> Result<(Option<Uuid>, Option<Uuid>, Option<Uuid>), AdminError> {
        match group.scope {
            Scope::Site => {
                let site = self.admin.site(group.scope_id).await?;
                let project = self.admin.project(site.project_id).await?;
                let org = self.admin.organization(project.organization_id).await?;
                Ok((Some(site.public_id), Some(project.public_id), Some(org.public_id)))
            }
            Scope::Project => {
                let project = self.admin.project(group.scope_id).await?;
                let org = self.admin.organization(project.organization_id).await?;
                Ok((None, Some(project.public_id), Some(org.public_id)))
            }
            Scope::Organization => {
                let org = self.admin.organization(group.scope_id).await?;
                Ok((None, None, Some(org.public_id)))
            }
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
