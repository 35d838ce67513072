// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized queue state from WAL replay

use crate::op::QueueOp;
use libops_core::{DispatcherId, EventRecord, EventStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Materialized view of the event queue.
///
/// Built by folding [`QueueOp`]s in WAL order. Snapshots persist only the
/// row map; the de-dup index is rebuilt on load.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct QueueState {
    /// Rows by dense id. BTreeMap keeps claim order = insertion order.
    pub events: BTreeMap<u64, EventRecord>,
    /// Next id to assign on enqueue.
    pub next_id: u64,
    /// event_id → row id, for idempotent enqueue.
    #[serde(skip)]
    by_event_id: HashMap<Uuid, u64>,
}

/// Row counts by status, for the dispatcher's summary log line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub sent: usize,
    pub failed: usize,
    pub dead_letter: usize,
}

impl QueueState {
    /// Rebuild the de-dup index after snapshot load.
    pub fn rebuild_index(&mut self) {
        self.by_event_id = self.events.values().map(|r| (r.event_id, r.id)).collect();
        let max_id = self.events.keys().next_back().copied().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1).max(1);
    }

    pub fn get(&self, id: u64) -> Option<&EventRecord> {
        self.events.get(&id)
    }

    /// Row id already holding this `event_id`, if any.
    pub fn row_for_event(&self, event_id: Uuid) -> Option<u64> {
        self.by_event_id.get(&event_id).copied()
    }

    /// Rows a dispatcher may claim, oldest first, bounded by `limit`.
    pub fn claimable(&self, max_retries: u32, limit: usize) -> Vec<u64> {
        self.events
            .values()
            .filter(|r| r.claimable(max_retries))
            .take(limit)
            .map(|r| r.id)
            .collect()
    }

    /// Rows currently held by the given dispatcher.
    pub fn claimed_by(&self, by: &DispatcherId) -> Vec<EventRecord> {
        self.events
            .values()
            .filter(|r| r.status == EventStatus::Processing && r.processing_by.as_ref() == Some(by))
            .cloned()
            .collect()
    }

    /// `processing` rows whose claim is older than the staleness window.
    pub fn stale(&self, now_ms: u64, window_ms: u64) -> Vec<u64> {
        self.events
            .values()
            .filter(|r| r.stale(now_ms, window_ms))
            .map(|r| r.id)
            .collect()
    }

    /// `sent` rows older than the retention cutoff.
    pub fn gc_candidates(&self, cutoff_ms: u64) -> Vec<u64> {
        self.events
            .values()
            .filter(|r| {
                r.status == EventStatus::Sent
                    && r.sent_at_ms.map(|at| at < cutoff_ms).unwrap_or(false)
            })
            .map(|r| r.id)
            .collect()
    }

    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats::default();
        for record in self.events.values() {
            match record.status {
                EventStatus::Pending => stats.pending += 1,
                EventStatus::Processing => stats.processing += 1,
                EventStatus::Sent => stats.sent += 1,
                EventStatus::Failed => stats.failed += 1,
                EventStatus::DeadLetter => stats.dead_letter += 1,
            }
        }
        stats
    }

    /// Fold one operation into the view.
    ///
    /// Handlers are idempotent where replay could repeat them: enqueue is
    /// guarded by the de-dup index, terminal rows never regress, and status
    /// moves are plain assignments.
    pub fn apply(&mut self, op: &QueueOp) {
        match op {
            QueueOp::Enqueued { record } => {
                if self.by_event_id.contains_key(&record.event_id)
                    || self.events.contains_key(&record.id)
                {
                    return;
                }
                self.by_event_id.insert(record.event_id, record.id);
                self.next_id = self.next_id.max(record.id + 1);
                self.events.insert(record.id, record.clone());
            }

            QueueOp::Claimed { id, by, at_ms } => {
                if let Some(record) = self.events.get_mut(id) {
                    if record.status.is_terminal() {
                        return;
                    }
                    record.status = EventStatus::Processing;
                    record.processing_by = Some(*by);
                    record.claimed_at_ms = Some(*at_ms);
                }
            }

            QueueOp::Sent { id, at_ms } => {
                if let Some(record) = self.events.get_mut(id) {
                    record.status = EventStatus::Sent;
                    record.sent_at_ms = Some(*at_ms);
                }
            }

            QueueOp::Failed { id, error, at_ms } => {
                if let Some(record) = self.events.get_mut(id) {
                    if record.status.is_terminal() {
                        return;
                    }
                    record.status = EventStatus::Failed;
                    record.retry_count += 1;
                    record.last_error = Some(error.clone());
                    record.last_retry_at_ms = Some(*at_ms);
                }
            }

            QueueOp::DeadLettered { id, error, .. } => {
                if let Some(record) = self.events.get_mut(id) {
                    record.status = EventStatus::DeadLetter;
                    record.last_error = Some(error.clone());
                }
            }

            QueueOp::Released { id, .. } => {
                if let Some(record) = self.events.get_mut(id) {
                    if record.status != EventStatus::Processing {
                        return;
                    }
                    record.status = EventStatus::Pending;
                    record.processing_by = None;
                    record.claimed_at_ms = None;
                }
            }

            QueueOp::Purged { ids } => {
                for id in ids {
                    if let Some(record) = self.events.remove(id) {
                        self.by_event_id.remove(&record.event_id);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
