// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory registry state.
//!
//! Three content-addressed indexes plus the compatibility configuration.
//! The store is only ever mutated by the state machine's replay handler
//! (`apply_*` methods); everything else reads through a shared snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compat::CompatibilityLevel;
use crate::schema::{Fingerprint, Schema};

/// Globally unique schema identifier, assigned monotonically from 1.
pub type SchemaId = u32;

/// One registered version under a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionEntry {
    pub version: u32,
    pub schema_id: SchemaId,
}

/// Target of a `SetConfig` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    Global,
    Subject(String),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Registry state derived entirely from log replay.
///
/// Invariants maintained by `apply_register`:
/// - structurally identical schemas share one `SchemaId` across subjects;
/// - ids are assigned contiguously from 1 in first-observation order;
/// - per-subject version numbers are contiguous from 1, append-only.
#[derive(Debug)]
pub struct Store {
    schemas_by_id: HashMap<SchemaId, Arc<Schema>>,
    id_by_fingerprint: HashMap<Fingerprint, SchemaId>,
    subjects: HashMap<String, Vec<VersionEntry>>,
    /// Subject names in first-registration order.
    subject_order: Vec<String>,
    max_schema_id: SchemaId,
    global_level: CompatibilityLevel,
    subject_levels: HashMap<String, CompatibilityLevel>,
}

impl Store {
    /// Empty store with the node's configured global default level.
    ///
    /// The default must be identical on every node of a deployment so that
    /// replay converges to the same state.
    pub fn new(default_level: CompatibilityLevel) -> Self {
        Self {
            schemas_by_id: HashMap::new(),
            id_by_fingerprint: HashMap::new(),
            subjects: HashMap::new(),
            subject_order: Vec::new(),
            max_schema_id: 0,
            global_level: default_level,
            subject_levels: HashMap::new(),
        }
    }

    // -- read queries -------------------------------------------------------

    pub fn schema_by_id(&self, id: SchemaId) -> Option<Arc<Schema>> {
        self.schemas_by_id.get(&id).cloned()
    }

    pub fn subject_exists(&self, subject: &str) -> bool {
        self.subjects.contains_key(subject)
    }

    /// Version entries for a subject, ascending. `None` when the subject
    /// has never had a schema registered.
    pub fn versions(&self, subject: &str) -> Option<&[VersionEntry]> {
        self.subjects.get(subject).map(|v| v.as_slice())
    }

    /// Latest version entry for a subject.
    pub fn latest(&self, subject: &str) -> Option<VersionEntry> {
        self.subjects.get(subject).and_then(|v| v.last()).copied()
    }

    /// A specific version entry (1-indexed).
    pub fn version_entry(&self, subject: &str, version: u32) -> Option<VersionEntry> {
        if version == 0 {
            return None;
        }
        self.subjects
            .get(subject)
            .and_then(|v| v.get((version - 1) as usize))
            .copied()
    }

    /// The version under `subject` whose schema has this fingerprint.
    pub fn find_by_fingerprint(
        &self,
        subject: &str,
        fingerprint: Fingerprint,
    ) -> Option<VersionEntry> {
        let versions = self.subjects.get(subject)?;
        versions
            .iter()
            .find(|entry| {
                self.schemas_by_id
                    .get(&entry.schema_id)
                    .is_some_and(|schema| schema.fingerprint() == fingerprint)
            })
            .copied()
    }

    /// The global id for this fingerprint, if any subject registered it.
    pub fn id_for_fingerprint(&self, fingerprint: Fingerprint) -> Option<SchemaId> {
        self.id_by_fingerprint.get(&fingerprint).copied()
    }

    /// Subject names in first-registration order.
    pub fn list_subjects(&self) -> Vec<String> {
        self.subject_order.clone()
    }

    pub fn global_level(&self) -> CompatibilityLevel {
        self.global_level
    }

    /// Per-subject level, if explicitly set. Never falls back to global.
    pub fn subject_level(&self, subject: &str) -> Option<CompatibilityLevel> {
        self.subject_levels.get(subject).copied()
    }

    /// The level enforced on writes: the subject's own level, else global.
    pub fn effective_level(&self, subject: &str) -> CompatibilityLevel {
        self.subject_level(subject).unwrap_or(self.global_level)
    }

    // -- mutations (replay only) -------------------------------------------

    /// Apply a `RegisterSchema` command.
    ///
    /// Returns `(schema_id, version, created)`; `created` is false when the
    /// subject already carried this schema and no new version was produced.
    pub(crate) fn apply_register(
        &mut self,
        subject: &str,
        schema: Arc<Schema>,
    ) -> (SchemaId, u32, bool) {
        let fingerprint = schema.fingerprint();

        let schema_id = match self.id_by_fingerprint.get(&fingerprint) {
            Some(&id) => id,
            None => {
                self.max_schema_id += 1;
                let id = self.max_schema_id;
                self.id_by_fingerprint.insert(fingerprint, id);
                self.schemas_by_id.insert(id, schema);
                id
            }
        };

        if let Some(existing) = self.find_by_fingerprint(subject, fingerprint) {
            return (schema_id, existing.version, false);
        }

        if !self.subjects.contains_key(subject) {
            self.subject_order.push(subject.to_string());
        }
        let versions = self.subjects.entry(subject.to_string()).or_default();
        let version = versions.len() as u32 + 1;
        versions.push(VersionEntry { version, schema_id });

        (schema_id, version, true)
    }

    /// Apply a `SetConfig` command. Last write wins; the log serializes.
    pub(crate) fn apply_set_config(&mut self, scope: &ConfigScope, level: CompatibilityLevel) {
        match scope {
            ConfigScope::Global => self.global_level = level,
            ConfigScope::Subject(subject) => {
                self.subject_levels.insert(subject.clone(), level);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
