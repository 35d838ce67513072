// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpointing with zstd compression and durable fsync.
//!
//! The key invariant: the snapshot must be durable (including directory
//! fsync) before the WAL is truncated. The write order is therefore
//! write-tmp → fsync-tmp → rename → fsync-dir, and only then does the
//! store drop checkpointed WAL entries.
//!
//! The `CheckpointWriter` trait abstracts the I/O operations so tests can
//! inject failures and verify fsync ordering.

use crate::snapshot::{Snapshot, CURRENT_SNAPSHOT_VERSION};
use crate::state::QueueState;
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compress(String),
}

/// Result of a completed checkpoint
#[derive(Debug, Clone)]
pub struct CheckpointResult {
    /// Sequence number that was checkpointed
    pub seq: u64,
    /// Size of the compressed snapshot in bytes
    pub size_bytes: u64,
}

/// Trait abstracting checkpoint I/O for testability.
pub trait CheckpointWriter: Send + Sync + 'static {
    /// Write compressed snapshot data to a temporary file.
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), CheckpointError>;

    /// Fsync a file to ensure data is durable.
    fn fsync_file(&self, path: &Path) -> Result<(), CheckpointError>;

    /// Atomically rename tmp file to final path.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), CheckpointError>;

    /// Fsync directory to make rename durable.
    fn fsync_dir(&self, path: &Path) -> Result<(), CheckpointError>;

    /// Get file size (for the completion log line).
    fn file_size(&self, path: &Path) -> Result<u64, CheckpointError>;
}

/// Production checkpoint writer using real filesystem operations.
#[derive(Clone)]
pub struct FsCheckpointWriter;

impl CheckpointWriter for FsCheckpointWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), CheckpointError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn fsync_file(&self, path: &Path) -> Result<(), CheckpointError> {
        let file = File::open(path)?;
        file.sync_all()?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), CheckpointError> {
        std::fs::rename(from, to)?;
        Ok(())
    }

    fn fsync_dir(&self, path: &Path) -> Result<(), CheckpointError> {
        let dir = File::open(path)?;
        dir.sync_all()?;
        Ok(())
    }

    fn file_size(&self, path: &Path) -> Result<u64, CheckpointError> {
        Ok(std::fs::metadata(path)?.len())
    }
}

/// Writes snapshots of the queue state.
pub struct Checkpointer<W: CheckpointWriter = FsCheckpointWriter> {
    writer: W,
    snapshot_path: PathBuf,
    compression_level: i32,
}

impl Checkpointer<FsCheckpointWriter> {
    /// Create a new checkpointer with the default filesystem writer.
    pub fn new(snapshot_path: PathBuf) -> Self {
        Self::with_writer(FsCheckpointWriter, snapshot_path)
    }
}

impl<W: CheckpointWriter> Checkpointer<W> {
    /// Create a checkpointer with a custom writer (for testing).
    pub fn with_writer(writer: W, snapshot_path: PathBuf) -> Self {
        Self {
            writer,
            snapshot_path,
            // zstd level 3 is a good balance of speed and compression
            compression_level: 3,
        }
    }

    /// Write a durable snapshot of `state` at WAL position `seq`.
    ///
    /// Blocking; the dispatcher wraps this in `spawn_blocking`.
    pub fn checkpoint_sync(
        &self,
        seq: u64,
        state: &QueueState,
    ) -> Result<CheckpointResult, CheckpointError> {
        let tmp_path = self.snapshot_path.with_extension("tmp");

        let snapshot = Snapshot {
            version: CURRENT_SNAPSHOT_VERSION,
            seq,
            state: state.clone(),
            created_at: Utc::now(),
        };

        let json_bytes = serde_json::to_vec(&snapshot)?;

        let compressed = zstd::encode_all(json_bytes.as_slice(), self.compression_level)
            .map_err(|e| CheckpointError::Compress(e.to_string()))?;

        self.writer.write_tmp(&tmp_path, &compressed)?;
        self.writer.fsync_file(&tmp_path)?;
        self.writer.rename(&tmp_path, &self.snapshot_path)?;
        if let Some(parent) = self.snapshot_path.parent() {
            self.writer.fsync_dir(parent)?;
        }

        let size_bytes =
            self.writer.file_size(&self.snapshot_path).unwrap_or(compressed.len() as u64);

        Ok(CheckpointResult { seq, size_bytes })
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
