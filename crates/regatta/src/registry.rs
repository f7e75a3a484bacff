// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry facade: the operation surface consumed by the transport layer.
//!
//! Reads go straight to a consistent store snapshot on any node. Writes
//! run only on the primary: a per-subject lease serializes concurrent
//! registrations against the same subject so two candidates cannot both
//! pass compatibility against the same prior version.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::compat::{self, CompatibilityLevel};
use crate::coordinator::Coordinator;
use crate::error::RegistryError;
use crate::schema::Schema;
use crate::state::StateMachine;
use crate::store::{ConfigScope, SchemaId, VersionEntry};

// ---------------------------------------------------------------------------
// VersionSelector
// ---------------------------------------------------------------------------

/// Client-supplied version selector: a positive integer or `latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Number(u32),
}

impl VersionSelector {
    /// Parse a selector string. Zero, negatives, other keywords
    /// (`earliest`, ...), and anything unparsable are invalid input.
    pub fn parse(selector: &str) -> Result<Self, RegistryError> {
        if selector == "latest" {
            return Ok(VersionSelector::Latest);
        }
        match selector.parse::<i64>() {
            Ok(n) if n >= 1 && n <= u32::MAX as i64 => Ok(VersionSelector::Number(n as u32)),
            _ => Err(RegistryError::InvalidVersion(selector.to_string())),
        }
    }
}

/// A fully resolved `(subject, version)` read result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub subject: String,
    pub version: u32,
    pub schema_id: SchemaId,
    pub schema: String,
}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

pub struct SchemaRegistry {
    state: Arc<StateMachine>,
    coordinator: Coordinator,
    /// Per-subject write leases, created lazily and held only while a
    /// registration is being checked and appended.
    leases: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SchemaRegistry {
    pub fn new(state: Arc<StateMachine>, coordinator: Coordinator) -> Self {
        Self {
            state,
            coordinator,
            leases: Mutex::new(HashMap::new()),
        }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn state(&self) -> &StateMachine {
        &self.state
    }

    // -- writes -------------------------------------------------------------

    /// Register a schema under a subject and return its global id.
    ///
    /// Idempotent at the `(subject, canonical_text)` level: re-registering
    /// an existing schema returns the existing id without a new version or
    /// log append. A schema already known under another subject reuses its
    /// global id but gets a fresh version local to this subject.
    pub async fn register(&self, subject: &str, text: &str) -> Result<SchemaId, RegistryError> {
        let schema = Arc::new(Schema::parse(text)?);
        self.ensure_primary()?;

        let lease = self.subject_lease(subject).await;
        let _held = lease.lock().await;

        {
            let store = self.state.store();

            if let Some(existing) = store.find_by_fingerprint(subject, schema.fingerprint()) {
                return Ok(existing.schema_id);
            }

            if let Some(latest) = store.latest(subject) {
                let level = store.effective_level(subject);
                if level != CompatibilityLevel::None {
                    let latest_schema = store
                        .schema_by_id(latest.schema_id)
                        .expect("version entry points at a stored schema");
                    let result = compat::check(&schema, &latest_schema, level);
                    if !result.is_compatible {
                        return Err(RegistryError::IncompatibleSchema(
                            result.reason.unwrap_or_default(),
                        ));
                    }
                }
            }
        }

        // A demotion between the check and the append must not let a write
        // slip past the new primary.
        self.ensure_primary()?;
        let (schema_id, _, _) = self.state.commit_register(subject, schema)?;
        Ok(schema_id)
    }

    /// Set the compatibility level for a scope. Creating per-subject config
    /// for a subject with no schemas is permitted (and does not create the
    /// subject).
    pub async fn set_config(
        &self,
        scope: ConfigScope,
        level: CompatibilityLevel,
    ) -> Result<(), RegistryError> {
        self.ensure_primary()?;
        self.state.commit_set_config(scope, level)
    }

    // -- reads --------------------------------------------------------------

    /// Canonical text of the schema with this global id.
    pub fn get_schema_by_id(&self, id: SchemaId) -> Result<String, RegistryError> {
        self.state
            .store()
            .schema_by_id(id)
            .map(|schema| schema.canonical_text().to_string())
            .ok_or(RegistryError::SchemaNotFound)
    }

    /// Resolve a `(subject, selector)` pair to its full version record.
    pub fn get_version(
        &self,
        subject: &str,
        selector: &str,
    ) -> Result<VersionRecord, RegistryError> {
        // The selector is a pure input error and is validated before
        // subject existence.
        let selector = VersionSelector::parse(selector)?;
        let store = self.state.store();
        let entry = resolve_version(&store, subject, selector)?;
        let schema = store
            .schema_by_id(entry.schema_id)
            .expect("version entry points at a stored schema");

        Ok(VersionRecord {
            subject: subject.to_string(),
            version: entry.version,
            schema_id: entry.schema_id,
            schema: schema.canonical_text().to_string(),
        })
    }

    /// Subject names in first-registration order.
    pub fn list_subjects(&self) -> Vec<String> {
        self.state.store().list_subjects()
    }

    /// Version numbers under a subject, ascending.
    pub fn list_versions(&self, subject: &str) -> Result<Vec<u32>, RegistryError> {
        let store = self.state.store();
        store
            .versions(subject)
            .map(|entries| entries.iter().map(|e| e.version).collect())
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))
    }

    /// Find the version under `subject` that matches `text` structurally.
    pub fn lookup(&self, subject: &str, text: &str) -> Result<VersionRecord, RegistryError> {
        let schema = Schema::parse(text)?;
        let store = self.state.store();
        if !store.subject_exists(subject) {
            return Err(RegistryError::SubjectNotFound(subject.to_string()));
        }
        let entry = store
            .find_by_fingerprint(subject, schema.fingerprint())
            .ok_or(RegistryError::SchemaNotFound)?;

        Ok(VersionRecord {
            subject: subject.to_string(),
            version: entry.version,
            schema_id: entry.schema_id,
            schema: schema.canonical_text().to_string(),
        })
    }

    /// Check a candidate against one registered version under the subject's
    /// effective level. Never mutates state.
    pub fn test_compatibility(
        &self,
        subject: &str,
        text: &str,
        selector: &str,
    ) -> Result<bool, RegistryError> {
        let selector = VersionSelector::parse(selector)?;
        let candidate = Schema::parse(text)?;

        let store = self.state.store();
        let entry = resolve_version(&store, subject, selector)?;
        let target = store
            .schema_by_id(entry.schema_id)
            .expect("version entry points at a stored schema");
        let level = store.effective_level(subject);

        Ok(compat::check(&candidate, &target, level).is_compatible)
    }

    /// Configured level for a scope. The global scope always has a value;
    /// a subject scope yields only its own entry, never the global
    /// fallback -- the transport maps `None` to 404.
    pub fn get_config(&self, scope: &ConfigScope) -> Option<CompatibilityLevel> {
        let store = self.state.store();
        match scope {
            ConfigScope::Global => Some(store.global_level()),
            ConfigScope::Subject(subject) => store.subject_level(subject),
        }
    }

    // -- internals ----------------------------------------------------------

    fn ensure_primary(&self) -> Result<(), RegistryError> {
        if self.coordinator.is_primary() {
            Ok(())
        } else {
            Err(RegistryError::NotPrimary(self.coordinator.primary_endpoint()))
        }
    }

    async fn subject_lease(&self, subject: &str) -> Arc<Mutex<()>> {
        let mut leases = self.leases.lock().await;
        leases
            .entry(subject.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn resolve_version(
    store: &crate::store::Store,
    subject: &str,
    selector: VersionSelector,
) -> Result<VersionEntry, RegistryError> {
    let versions = store
        .versions(subject)
        .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string()))?;

    match selector {
        VersionSelector::Latest => versions
            .last()
            .copied()
            .ok_or_else(|| RegistryError::SubjectNotFound(subject.to_string())),
        VersionSelector::Number(n) => versions
            .get(n as usize - 1)
            .copied()
            .ok_or(RegistryError::VersionNotFound(n)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
