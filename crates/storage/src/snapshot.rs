// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! Snapshots store the complete queue state at a point in time, identified
//! by the WAL sequence number. Recovery loads the snapshot and replays WAL
//! entries after that sequence. Files are zstd-compressed JSON, written by
//! the [`Checkpointer`](crate::Checkpointer).

use crate::state::QueueState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Current snapshot schema version. Older versions are rotated out rather
/// than migrated; the WAL replays the queue from scratch in that case.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// Errors that can occur in snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A snapshot of the queue state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// WAL sequence number at the time of snapshot
    pub seq: u64,
    /// The complete queue state
    pub state: QueueState,
    /// When this snapshot was created
    pub created_at: DateTime<Utc>,
}

/// Load a zstd-compressed snapshot if one exists.
///
/// Returns `Ok(None)` if the file doesn't exist, is corrupt, or carries an
/// unknown schema version. Unusable snapshots are moved to a `.bak` file so
/// the queue can recover via WAL replay.
pub fn load(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    let decoder = match zstd::stream::read::Decoder::new(file) {
        Ok(d) => d,
        Err(e) => return rotate_unusable(path, &format!("zstd: {e}")),
    };

    let snapshot: Snapshot = match serde_json::from_reader(decoder) {
        Ok(s) => s,
        Err(e) => return rotate_unusable(path, &e.to_string()),
    };

    if snapshot.version != CURRENT_SNAPSHOT_VERSION {
        return rotate_unusable(path, &format!("unknown version {}", snapshot.version));
    }

    Ok(Some(snapshot))
}

fn rotate_unusable(path: &Path, reason: &str) -> Result<Option<Snapshot>, SnapshotError> {
    let bak_path = rotate_bak_path(path);
    warn!(
        reason,
        path = %path.display(),
        bak = %bak_path.display(),
        "Unusable snapshot, moving to .bak and replaying WAL from scratch",
    );
    fs::rename(path, &bak_path)?;
    Ok(None)
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
pub fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    // Remove the oldest if at capacity
    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    // Shift existing backups up by one
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
