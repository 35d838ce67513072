// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! libops-storage: durable event queue for the dispatcher
//!
//! The queue is an append-only JSONL write-ahead log of [`QueueOp`]s replayed
//! into a [`QueueState`] materialized view. Periodic checkpoints compress the
//! view into a zstd snapshot and truncate the log, bounding recovery time.
//!
//! Every status transition of an event row is its own WAL record, so crash
//! recovery reconstructs claims, retries and dead-letter decisions exactly.

mod checkpoint;
mod op;
mod snapshot;
mod state;
mod store;
mod wal;

pub use checkpoint::{
    CheckpointError, CheckpointResult, CheckpointWriter, Checkpointer, FsCheckpointWriter,
};
pub use op::QueueOp;
pub use snapshot::{load as load_snapshot, rotate_bak_path, Snapshot, SnapshotError};
pub use state::{QueueState, QueueStats};
pub use store::{EventQueue, QueuePaths, StoreError};
pub use wal::{Wal, WalEntry, WalError};
