// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue operations: the WAL vocabulary.
//!
//! Each operation is one durable line. [`QueueState::apply`] folds them into
//! the materialized view; replay after a crash applies the same fold.
//!
//! [`QueueState::apply`]: crate::state::QueueState::apply

use libops_core::{DispatcherId, EventRecord};
use serde::{Deserialize, Serialize};

/// One durable mutation of the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum QueueOp {
    /// A new event row, written by the emitter. `record.id` is final.
    Enqueued { record: EventRecord },
    /// A dispatcher took the row (`pending`/`failed` → `processing`).
    Claimed { id: u64, by: DispatcherId, at_ms: u64 },
    /// Downstream publish succeeded (`processing` → `sent`).
    Sent { id: u64, at_ms: u64 },
    /// Publish failed; retry budget spent by one (`processing` → `failed`).
    Failed { id: u64, error: String, at_ms: u64 },
    /// Retries exhausted (`processing`/`failed` → `dead_letter`, terminal).
    DeadLettered { id: u64, error: String, at_ms: u64 },
    /// Stale-claim recovery (`processing` → `pending`, no retry bump).
    Released { id: u64, at_ms: u64 },
    /// Retention GC removed `sent` rows.
    Purged { ids: Vec<u64> },
}
