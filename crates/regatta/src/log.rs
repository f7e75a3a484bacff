// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Append-only command log.
//!
//! The authoritative registry state is the ordered sequence of commands in
//! this log; everything in the store is derived by replay. Records are
//! JSON lines holding only client-supplied data -- derived values (schema
//! ids, version numbers) never appear in the log, so any replica replaying
//! the same prefix reconstructs byte-identical state.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compat::CompatibilityLevel;
use crate::store::ConfigScope;

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A durably-logged state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Emitted only by the primary, after local compatibility checks.
    RegisterSchema {
        subject: String,
        canonical_text: String,
    },
    SetConfig {
        scope: ConfigScope,
        policy: CompatibilityLevel,
    },
}

// ---------------------------------------------------------------------------
// LogError
// ---------------------------------------------------------------------------

/// Command log failures.
///
/// `Corrupt` is fatal: a node that cannot replay its log refuses to serve
/// rather than diverge. `Io` on append is transient and retried by the
/// state machine.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt log record at offset {offset}: {detail}")]
    Corrupt { offset: u64, detail: String },

    #[error("encode error: {0}")]
    Encode(serde_json::Error),
}

// ---------------------------------------------------------------------------
// CommandLog
// ---------------------------------------------------------------------------

/// Ordered, durable command storage.
///
/// Offsets are dense record indexes starting at 0; `append` returns the
/// offset of the record it wrote.
pub trait CommandLog: Send + Sync {
    fn append(&self, command: &Command) -> Result<u64, LogError>;

    /// All commands at `offset` and later, in log order. The whole file is
    /// integrity-checked on every scan.
    fn read_from(&self, offset: u64) -> Result<Vec<Command>, LogError>;

    /// Number of committed records (the tail offset).
    fn len(&self) -> u64;
}

// ---------------------------------------------------------------------------
// FileCommandLog
// ---------------------------------------------------------------------------

/// JSON-lines file implementation, one record per line, fsynced per append.
#[derive(Debug)]
pub struct FileCommandLog {
    path: PathBuf,
    inner: Mutex<FileLogInner>,
}

#[derive(Debug)]
struct FileLogInner {
    writer: File,
    next_offset: u64,
}

impl FileCommandLog {
    /// Open (or create) the log at `path` and verify every existing record.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let existing = scan(&path, 0)?;
        let writer = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            inner: Mutex::new(FileLogInner {
                writer,
                next_offset: existing.len() as u64,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandLog for FileCommandLog {
    fn append(&self, command: &Command) -> Result<u64, LogError> {
        let mut line = serde_json::to_string(command).map_err(LogError::Encode)?;
        line.push('\n');

        let mut inner = self.inner.lock();
        inner.writer.write_all(line.as_bytes())?;
        inner.writer.sync_data()?;

        let offset = inner.next_offset;
        inner.next_offset += 1;
        Ok(offset)
    }

    fn read_from(&self, offset: u64) -> Result<Vec<Command>, LogError> {
        // Hold the append lock so a scan never sees a torn tail record.
        let _guard = self.inner.lock();
        scan(&self.path, offset)
    }

    fn len(&self) -> u64 {
        self.inner.lock().next_offset
    }
}

fn scan(path: &Path, from: u64) -> Result<Vec<Command>, LogError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut commands = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let offset = index as u64;
        let line = line?;
        let command: Command = serde_json::from_str(&line).map_err(|e| LogError::Corrupt {
            offset,
            detail: e.to_string(),
        })?;
        if offset >= from {
            commands.push(command);
        }
    }
    Ok(commands)
}

// ---------------------------------------------------------------------------
// MemoryCommandLog
// ---------------------------------------------------------------------------

/// Volatile implementation for tests and embedded use.
#[derive(Default)]
pub struct MemoryCommandLog {
    records: Mutex<Vec<Command>>,
}

impl MemoryCommandLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CommandLog for MemoryCommandLog {
    fn append(&self, command: &Command) -> Result<u64, LogError> {
        let mut records = self.records.lock();
        records.push(command.clone());
        Ok(records.len() as u64 - 1)
    }

    fn read_from(&self, offset: u64) -> Result<Vec<Command>, LogError> {
        let records = self.records.lock();
        Ok(records.iter().skip(offset as usize).cloned().collect())
    }

    fn len(&self) -> u64 {
        self.records.lock().len() as u64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn register(subject: &str, text: &str) -> Command {
        Command::RegisterSchema {
            subject: subject.to_string(),
            canonical_text: text.to_string(),
        }
    }

    #[test]
    fn wire_format_is_tagged_with_kind() {
        let json = serde_json::to_string(&register("t", "\"string\"")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "register_schema");
        assert_eq!(value["subject"], "t");
        assert_eq!(value["canonical_text"], "\"string\"");

        let config = Command::SetConfig {
            scope: ConfigScope::Subject("t".to_string()),
            policy: CompatibilityLevel::Full,
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(value["kind"], "set_config");
        assert_eq!(value["policy"], "FULL");
        assert_eq!(value["scope"]["subject"], "t");
    }

    #[test]
    fn file_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.log");

        {
            let log = FileCommandLog::open(&path).unwrap();
            assert_eq!(log.append(&register("a", "\"string\"")).unwrap(), 0);
            assert_eq!(log.append(&register("b", "\"int\"")).unwrap(), 1);
        }

        let log = FileCommandLog::open(&path).unwrap();
        assert_eq!(log.len(), 2);
        let commands = log.read_from(0).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], register("a", "\"string\""));

        assert_eq!(log.append(&register("c", "\"long\"")).unwrap(), 2);
        assert_eq!(log.read_from(2).unwrap(), vec![register("c", "\"long\"")]);
    }

    #[test]
    fn corrupt_record_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.log");

        let log = FileCommandLog::open(&path).unwrap();
        log.append(&register("a", "\"string\"")).unwrap();
        drop(log);

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"{\"kind\":\"register_schema\",\"subj").unwrap();
        drop(file);

        let err = FileCommandLog::open(&path).unwrap_err();
        assert!(matches!(err, LogError::Corrupt { offset: 1, .. }));
    }

    #[test]
    fn memory_log_offsets() {
        let log = MemoryCommandLog::new();
        assert_eq!(log.len(), 0);
        assert_eq!(log.append(&register("a", "\"string\"")).unwrap(), 0);
        assert_eq!(log.append(&register("a", "\"int\"")).unwrap(), 1);
        assert_eq!(log.read_from(1).unwrap().len(), 1);
    }
}
