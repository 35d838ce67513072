// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable event queue: claim/status operations over WAL + state.
//!
//! Every mutation appends its operation to the WAL, flushes, then folds it
//! into the materialized view, so acknowledged operations survive a crash.
//! The claim step is a single `&mut self` section: with one store per
//! dispatcher deployment, no two dispatchers can claim the same row.

use crate::op::QueueOp;
use crate::snapshot;
use crate::state::{QueueState, QueueStats};
use crate::wal::{Wal, WalError};
use libops_core::{Clock, DispatcherId, EventRecord, NewEvent, EventStatus};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from queue operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] snapshot::SnapshotError),
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] crate::checkpoint::CheckpointError),
    #[error("no such event row: {0}")]
    NotFound(u64),
    #[error("row {id} is {status}, refusing {operation}")]
    InvalidTransition { id: u64, status: EventStatus, operation: &'static str },
}

/// On-disk layout of a queue.
#[derive(Debug, Clone)]
pub struct QueuePaths {
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
}

impl QueuePaths {
    /// Conventional layout under a state directory.
    pub fn under(state_dir: &Path) -> Self {
        Self {
            wal_path: state_dir.join("wal").join("queue.wal"),
            snapshot_path: state_dir.join("queue.snapshot"),
        }
    }
}

/// Durable claim-based event queue.
pub struct EventQueue<C: Clock> {
    wal: Wal,
    state: QueueState,
    clock: C,
}

impl<C: Clock> EventQueue<C> {
    /// Open a queue: snapshot restore + WAL replay.
    pub fn open(paths: &QueuePaths, clock: C) -> Result<Self, StoreError> {
        let (mut state, snapshot_seq) = match snapshot::load(&paths.snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (QueueState::default(), 0),
        };
        state.rebuild_index();

        let mut wal = Wal::open(&paths.wal_path, snapshot_seq)?;
        let entries = wal.entries_after(snapshot_seq)?;
        let replayed = entries.len();
        for entry in entries {
            state.apply(&entry.op);
        }

        if replayed > 0 || snapshot_seq > 0 {
            info!(
                snapshot_seq,
                replayed,
                rows = state.events.len(),
                "queue recovered from snapshot + WAL"
            );
        }

        Ok(Self { wal, state, clock })
    }

    /// Insert a new event with `status='pending'`, `retry_count=0`.
    ///
    /// Idempotent on `event_id`: a duplicate returns the existing row id
    /// without writing anything.
    pub fn enqueue(&mut self, new: NewEvent) -> Result<u64, StoreError> {
        if let Some(existing) = self.state.row_for_event(new.event_id) {
            debug!(event_id = %new.event_id, row = existing, "duplicate enqueue ignored");
            return Ok(existing);
        }

        let id = self.state.next_id.max(1);
        let record = EventRecord {
            id,
            event_id: new.event_id,
            event_type: new.event_type,
            source: new.source,
            subject: new.subject,
            scope: new.scope,
            data: new.data,
            content_type: new.content_type,
            status: EventStatus::Pending,
            retry_count: 0,
            last_error: None,
            created_at_ms: self.clock.epoch_ms(),
            claimed_at_ms: None,
            sent_at_ms: None,
            last_retry_at_ms: None,
            processing_by: None,
        };

        self.commit(QueueOp::Enqueued { record })?;
        Ok(id)
    }

    /// Atomically move up to `limit` claimable rows to `processing`,
    /// stamping this dispatcher. Returns the number of rows claimed.
    ///
    /// Rows whose `retry_count` has reached `max_retries` are skipped.
    pub fn claim(
        &mut self,
        by: &DispatcherId,
        max_retries: u32,
        limit: usize,
    ) -> Result<usize, StoreError> {
        let ids = self.state.claimable(max_retries, limit);
        let at_ms = self.clock.epoch_ms();
        for id in &ids {
            self.wal.append(&QueueOp::Claimed { id: *id, by: *by, at_ms })?;
        }
        self.wal.flush()?;
        for id in &ids {
            self.state.apply(&QueueOp::Claimed { id: *id, by: *by, at_ms });
        }
        Ok(ids.len())
    }

    /// Rows currently held by the given dispatcher.
    pub fn claimed_by(&self, by: &DispatcherId) -> Vec<EventRecord> {
        self.state.claimed_by(by)
    }

    /// Record a successful downstream publish.
    pub fn mark_sent(&mut self, id: u64) -> Result<(), StoreError> {
        self.require_active(id, "mark_sent")?;
        self.commit(QueueOp::Sent { id, at_ms: self.clock.epoch_ms() })
    }

    /// Record a failed publish; bumps `retry_count`. Returns the new count.
    pub fn mark_failed(&mut self, id: u64, error: &str) -> Result<u32, StoreError> {
        self.require_active(id, "mark_failed")?;
        self.commit(QueueOp::Failed {
            id,
            error: error.to_string(),
            at_ms: self.clock.epoch_ms(),
        })?;
        Ok(self.state.get(id).map(|r| r.retry_count).unwrap_or(0))
    }

    /// Move a row to the terminal `dead_letter` state.
    pub fn mark_dead_letter(&mut self, id: u64, error: &str) -> Result<(), StoreError> {
        self.require_active(id, "mark_dead_letter")?;
        self.commit(QueueOp::DeadLettered {
            id,
            error: error.to_string(),
            at_ms: self.clock.epoch_ms(),
        })
    }

    /// Return `processing` rows with claims older than `window` to `pending`.
    ///
    /// Does not bump `retry_count`: the previous dispatcher may have died
    /// before attempting any work. Returns the released row ids so callers
    /// can drop their in-memory copies.
    pub fn recover_stale(&mut self, window: Duration) -> Result<Vec<u64>, StoreError> {
        let now_ms = self.clock.epoch_ms();
        let ids = self.state.stale(now_ms, window.as_millis() as u64);
        if ids.is_empty() {
            return Ok(ids);
        }
        for id in &ids {
            self.wal.append(&QueueOp::Released { id: *id, at_ms: now_ms })?;
        }
        self.wal.flush()?;
        for id in &ids {
            self.state.apply(&QueueOp::Released { id: *id, at_ms: now_ms });
        }
        info!(count = ids.len(), "recovered stale claims");
        Ok(ids)
    }

    /// Delete `sent` rows older than the retention window.
    pub fn gc(&mut self, retain: Duration) -> Result<usize, StoreError> {
        let cutoff_ms = self.clock.epoch_ms().saturating_sub(retain.as_millis() as u64);
        let ids = self.state.gc_candidates(cutoff_ms);
        if ids.is_empty() {
            return Ok(0);
        }
        let count = ids.len();
        self.commit(QueueOp::Purged { ids })?;
        Ok(count)
    }

    /// Snapshot the current state and truncate the WAL behind it.
    pub fn checkpoint<W: crate::CheckpointWriter>(
        &mut self,
        checkpointer: &crate::Checkpointer<W>,
    ) -> Result<crate::CheckpointResult, StoreError> {
        self.wal.flush()?;
        let result = checkpointer.checkpoint_sync(self.wal.seq(), &self.state)?;
        self.wal.truncate_through(result.seq)?;
        Ok(result)
    }

    pub fn get(&self, id: u64) -> Option<&EventRecord> {
        self.state.get(id)
    }

    pub fn stats(&self) -> QueueStats {
        self.state.stats()
    }

    fn require_active(&self, id: u64, operation: &'static str) -> Result<(), StoreError> {
        let record = self.state.get(id).ok_or(StoreError::NotFound(id))?;
        if record.status.is_terminal() {
            return Err(StoreError::InvalidTransition {
                id,
                status: record.status,
                operation,
            });
        }
        Ok(())
    }

    fn commit(&mut self, op: QueueOp) -> Result<(), StoreError> {
        self.wal.append(&op)?;
        self.wal.flush()?;
        self.state.apply(&op);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
