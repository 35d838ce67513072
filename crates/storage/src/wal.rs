// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL write-ahead log of queue operations.
//!
//! Operations are durably stored before they are acknowledged, enabling
//! crash recovery via snapshot + replay. Each entry is one line of JSON:
//! `{"seq":N,"op":{...}}\n`
//!
//! The store applies operations to its materialized view at write time; the
//! WAL is only read back on startup (replay) and during truncation.

use crate::op::QueueOp;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in Wal operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialization helper for writing WAL entries without cloning the op.
#[derive(Serialize)]
struct WalRecordRef<'a> {
    seq: u64,
    op: &'a QueueOp,
}

/// Deserialization helper for reading WAL entries.
#[derive(Deserialize)]
struct WalRecord {
    seq: u64,
    op: QueueOp,
}

/// A single WAL entry with sequence number
#[derive(Debug, Clone)]
pub struct WalEntry {
    pub seq: u64,
    pub op: QueueOp,
}

/// JSONL WAL for durable queue operations.
///
/// `append` buffers; `flush` writes everything out with a single fsync.
/// Callers flush before acknowledging any operation to their caller.
pub struct Wal {
    file: File,
    path: PathBuf,
    /// Highest sequence number written (buffered included)
    seq: u64,
    /// Buffered JSON lines waiting to be flushed (without trailing newline)
    write_buffer: Vec<Vec<u8>>,
}

impl Wal {
    /// Open or create a WAL at the given path.
    ///
    /// `base_seq` should come from the snapshot (or 0 without one): after a
    /// checkpoint truncates every entry, numbering must continue above the
    /// snapshot position or replay would skip fresh entries. A corrupt tail
    /// (partial write from a crash) is rotated to `.bak` and the valid
    /// prefix preserved.
    pub fn open(path: &Path, base_seq: u64) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).read(true).append(true).open(path)?;

        let (mut seq, corrupt) = Self::scan(&file)?;

        if corrupt {
            let valid_lines = Self::read_valid_lines(&file)?;
            drop(file);

            let bak_path = crate::snapshot::rotate_bak_path(path);
            warn!(
                path = %path.display(),
                bak = %bak_path.display(),
                valid_entries = valid_lines.len(),
                "Corrupt WAL detected, rotating to .bak and preserving valid entries",
            );
            std::fs::rename(path, &bak_path)?;

            {
                let mut new_file = File::create(path)?;
                for line in &valid_lines {
                    new_file.write_all(line.as_bytes())?;
                    new_file.write_all(b"\n")?;
                }
                new_file.sync_all()?;
            }

            file = OpenOptions::new().create(true).read(true).append(true).open(path)?;
            seq = Self::scan(&file)?.0;
        }

        Ok(Self { file, path: path.to_owned(), seq: seq.max(base_seq), write_buffer: Vec::new() })
    }

    /// Scan the WAL for the maximum sequence number.
    ///
    /// Returns `(max_seq, corrupt)` where `corrupt` is true if a parse error
    /// was encountered (not just EOF).
    fn scan(file: &File) -> Result<(u64, bool), WalError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut max_seq = 0u64;
        let mut corrupt = false;
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    corrupt = true;
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<WalRecord>(trimmed) {
                Ok(record) => max_seq = max_seq.max(record.seq),
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }

        Ok((max_seq, corrupt))
    }

    /// Read all valid (parseable) lines, stopping at the first corrupt entry.
    fn read_valid_lines(file: &File) -> Result<Vec<String>, WalError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut valid_lines = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if serde_json::from_str::<WalRecord>(trimmed).is_err() {
                break;
            }

            valid_lines.push(trimmed.to_string());
        }

        Ok(valid_lines)
    }

    /// Append an operation to the write buffer.
    ///
    /// Returns the assigned sequence number. The op is NOT durable until
    /// `flush()` returns.
    pub fn append(&mut self, op: &QueueOp) -> Result<u64, WalError> {
        self.seq += 1;
        let seq = self.seq;
        let record = WalRecordRef { seq, op };
        self.write_buffer.push(serde_json::to_vec(&record)?);
        Ok(seq)
    }

    /// Flush all buffered entries to disk with a single fsync.
    ///
    /// This is the durability point: after flush returns, every appended
    /// operation survives a crash.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }

        for mut json_bytes in self.write_buffer.drain(..) {
            json_bytes.push(b'\n');
            self.file.write_all(&json_bytes)?;
        }

        self.file.sync_all()?;
        Ok(())
    }

    /// Current write sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Iterate over all entries after the given sequence number.
    ///
    /// Used on startup to replay operations newer than the snapshot. Stops
    /// at the first corrupt entry with a warning.
    pub fn entries_after(&mut self, seq: u64) -> Result<Vec<WalEntry>, WalError> {
        self.flush()?;

        let mut reader = BufReader::new(self.file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut entries = Vec::new();
        let mut line = String::new();
        let mut offset = 0u64;

        loop {
            line.clear();
            let bytes_read = match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                Err(e) => return Err(e.into()),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                offset += bytes_read as u64;
                continue;
            }

            let record: WalRecord = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        offset,
                        error = %e,
                        "Corrupt WAL entry during replay, stopping at corruption point",
                    );
                    break;
                }
            };

            offset += bytes_read as u64;

            if record.seq > seq {
                entries.push(WalEntry { seq: record.seq, op: record.op });
            }
        }

        Ok(entries)
    }

    /// Drop entries with sequence number ≤ `seq`.
    ///
    /// Called after checkpoint to reclaim disk space. Rewrites the WAL with
    /// only newer entries via tmp-file + atomic rename.
    pub fn truncate_through(&mut self, seq: u64) -> Result<(), WalError> {
        self.flush()?;

        let tmp_path = self.path.with_extension("tmp");

        let mut reader = BufReader::new(self.file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut kept_lines: Vec<String> = Vec::new();
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let record: WalRecord = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(_) => break,
            };

            if record.seq > seq {
                kept_lines.push(trimmed.to_string());
            }
        }

        {
            let mut tmp_file = File::create(&tmp_path)?;
            for kept_line in &kept_lines {
                tmp_file.write_all(kept_line.as_bytes())?;
                tmp_file.write_all(b"\n")?;
            }
            tmp_file.sync_all()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;

        self.file = OpenOptions::new().create(true).read(true).append(true).open(&self.path)?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
