// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log-backed state machine.
//!
//! All store mutation happens here, in log order: `bootstrap` replays the
//! log from offset 0, and `commit_*` appends a command and applies it
//! locally before returning the derived ids. Schema ids and version
//! numbers are never encoded in commands -- they are re-derived on every
//! node, so any replica that replays the same log prefix reaches
//! byte-identical store state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::{debug, info, warn};

use crate::compat::CompatibilityLevel;
use crate::error::RegistryError;
use crate::log::{Command, CommandLog, LogError};
use crate::schema::Schema;
use crate::store::{ConfigScope, SchemaId, Store};

/// Transient append failures are retried this many times before the write
/// surfaces `LOG_UNAVAILABLE`.
const APPEND_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// StateMachine
// ---------------------------------------------------------------------------

pub struct StateMachine {
    log: Box<dyn CommandLog>,
    store: RwLock<Store>,
    committed_offset: AtomicU64,
    default_level: CompatibilityLevel,
}

impl StateMachine {
    pub fn new(log: Box<dyn CommandLog>, default_level: CompatibilityLevel) -> Self {
        Self {
            log,
            store: RwLock::new(Store::new(default_level)),
            committed_offset: AtomicU64::new(0),
            default_level,
        }
    }

    /// Replay the log from offset 0 to tail. Must complete before the node
    /// serves requests; a record that fails to apply is fatal.
    pub fn bootstrap(&self) -> Result<u64, LogError> {
        let commands = self.log.read_from(0)?;
        let count = commands.len() as u64;

        let mut store = self.store.write();
        *store = Store::new(self.default_level);
        for (index, command) in commands.iter().enumerate() {
            apply(&mut store, command).map_err(|detail| LogError::Corrupt {
                offset: index as u64,
                detail,
            })?;
        }
        drop(store);

        self.committed_offset.store(count, Ordering::SeqCst);
        info!(commands = count, "log replay complete");
        Ok(count)
    }

    /// Append a `RegisterSchema` command and apply it locally.
    ///
    /// Returns `(schema_id, version, created)`. The caller (the facade, on
    /// the primary) has already canonicalized and compatibility-checked the
    /// schema under the subject lease.
    pub fn commit_register(
        &self,
        subject: &str,
        schema: Arc<Schema>,
    ) -> Result<(SchemaId, u32, bool), RegistryError> {
        let command = Command::RegisterSchema {
            subject: subject.to_string(),
            canonical_text: schema.canonical_text().to_string(),
        };
        let offset = self.append_with_retry(&command)?;

        let mut store = self.store.write();
        let (schema_id, version, created) = store.apply_register(subject, schema);
        drop(store);
        self.committed_offset.store(offset + 1, Ordering::SeqCst);

        debug!(subject, schema_id, version, created, offset, "register committed");
        Ok((schema_id, version, created))
    }

    /// Append a `SetConfig` command and apply it locally.
    pub fn commit_set_config(
        &self,
        scope: ConfigScope,
        level: CompatibilityLevel,
    ) -> Result<(), RegistryError> {
        let command = Command::SetConfig {
            scope: scope.clone(),
            policy: level,
        };
        let offset = self.append_with_retry(&command)?;

        let mut store = self.store.write();
        store.apply_set_config(&scope, level);
        drop(store);
        self.committed_offset.store(offset + 1, Ordering::SeqCst);

        debug!(?scope, %level, offset, "config committed");
        Ok(())
    }

    /// Consistent read snapshot of the derived state.
    pub fn store(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read()
    }

    /// Offset up to which this node has replayed.
    pub fn committed_offset(&self) -> u64 {
        self.committed_offset.load(Ordering::SeqCst)
    }

    /// Current log length; reads never change it.
    pub fn log_len(&self) -> u64 {
        self.log.len()
    }

    fn append_with_retry(&self, command: &Command) -> Result<u64, RegistryError> {
        let mut last_error = String::new();
        for attempt in 1..=APPEND_ATTEMPTS {
            match self.log.append(command) {
                Ok(offset) => return Ok(offset),
                Err(e) => {
                    warn!(attempt, error = %e, "log append failed");
                    last_error = e.to_string();
                }
            }
        }
        Err(RegistryError::LogUnavailable(last_error))
    }
}

/// Deterministic replay of a single logged command.
fn apply(store: &mut Store, command: &Command) -> Result<(), String> {
    match command {
        Command::RegisterSchema {
            subject,
            canonical_text,
        } => {
            // The primary validated the text before appending; a parse
            // failure here means the log no longer holds what was written.
            let schema = Schema::parse(canonical_text).map_err(|e| e.to_string())?;
            let (schema_id, version, created) = store.apply_register(subject, Arc::new(schema));
            debug!(subject, schema_id, version, created, "replayed register");
        }
        Command::SetConfig { scope, policy } => {
            store.apply_set_config(scope, *policy);
            debug!(?scope, %policy, "replayed config");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryCommandLog;

    fn schema(text: &str) -> Arc<Schema> {
        Arc::new(Schema::parse(text).unwrap())
    }

    fn machine() -> StateMachine {
        let sm = StateMachine::new(
            Box::new(MemoryCommandLog::new()),
            CompatibilityLevel::None,
        );
        sm.bootstrap().unwrap();
        sm
    }

    #[test]
    fn commit_derives_ids_and_advances_offset() {
        let sm = machine();
        let (id, version, created) = sm.commit_register("t", schema("\"string\"")).unwrap();
        assert_eq!((id, version, created), (1, 1, true));
        assert_eq!(sm.committed_offset(), 1);
        assert_eq!(sm.log_len(), 1);
    }

    #[test]
    fn idempotent_register_still_appends_nothing_new_to_state() {
        let sm = machine();
        let first = sm.commit_register("t", schema("\"string\"")).unwrap();
        let second = sm.commit_register("t", schema("\"string\"")).unwrap();
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
        assert!(!second.2);
        assert_eq!(sm.store().versions("t").unwrap().len(), 1);
    }

    #[test]
    fn replicas_replaying_the_same_log_converge() {
        let primary = machine();
        primary.commit_register("a", schema("\"string\"")).unwrap();
        primary.commit_register("b", schema("\"string\"")).unwrap();
        primary.commit_register("a", schema("\"int\"")).unwrap();
        primary
            .commit_set_config(
                ConfigScope::Subject("a".to_string()),
                CompatibilityLevel::Full,
            )
            .unwrap();

        // Ship the log to a fresh replica.
        let replica_log = MemoryCommandLog::new();
        let machine_log = primary.log.read_from(0).unwrap();
        for command in &machine_log {
            replica_log.append(command).unwrap();
        }
        let replica = StateMachine::new(Box::new(replica_log), CompatibilityLevel::None);
        replica.bootstrap().unwrap();

        let p = primary.store();
        let r = replica.store();
        assert_eq!(p.list_subjects(), r.list_subjects());
        for subject in p.list_subjects() {
            let pv: Vec<_> = p.versions(&subject).unwrap().to_vec();
            let rv: Vec<_> = r.versions(&subject).unwrap().to_vec();
            assert_eq!(pv, rv);
        }
        assert_eq!(p.subject_level("a"), r.subject_level("a"));
        assert_eq!(
            p.schema_by_id(1).unwrap().canonical_text(),
            r.schema_by_id(1).unwrap().canonical_text()
        );
    }

    #[test]
    fn bootstrap_rejects_an_unparseable_record() {
        let log = MemoryCommandLog::new();
        log.append(&Command::RegisterSchema {
            subject: "t".to_string(),
            canonical_text: "not json".to_string(),
        })
        .unwrap();

        let sm = StateMachine::new(Box::new(log), CompatibilityLevel::None);
        let err = sm.bootstrap().unwrap_err();
        assert!(matches!(err, LogError::Corrupt { offset: 0, .. }));
    }

    #[test]
    fn default_level_seeds_the_store() {
        let sm = StateMachine::new(
            Box::new(MemoryCommandLog::new()),
            CompatibilityLevel::Backward,
        );
        sm.bootstrap().unwrap();
        assert_eq!(sm.store().global_level(), CompatibilityLevel::Backward);
    }
}
