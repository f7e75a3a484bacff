// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry error taxonomy.
//!
//! Every operational failure maps to one of these kinds. Each kind carries
//! a stable numeric `error_code` that survives the transport boundary, so
//! clients can dispatch on it without parsing messages.

use std::fmt;

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Errors surfaced by registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The schema text was rejected by the canonicalizer.
    InvalidSchema(String),
    /// The version selector is zero, negative, or an unknown keyword.
    InvalidVersion(String),
    /// The subject has never had a schema registered.
    SubjectNotFound(String),
    /// The subject exists but has no such version.
    VersionNotFound(u32),
    /// No schema with that id, or no matching schema under the subject.
    SchemaNotFound,
    /// The candidate violates the subject's effective compatibility level.
    IncompatibleSchema(String),
    /// This node is not the primary; the write must go to `primary_endpoint`.
    NotPrimary(Option<String>),
    /// The command log rejected an append; safe to retry.
    LogUnavailable(String),
}

impl RegistryError {
    /// Stable machine-readable error code.
    pub fn error_code(&self) -> u32 {
        match self {
            RegistryError::SubjectNotFound(_) => 40401,
            RegistryError::VersionNotFound(_) => 40402,
            RegistryError::SchemaNotFound => 40403,
            RegistryError::InvalidSchema(_) => 42201,
            RegistryError::InvalidVersion(_) => 42202,
            RegistryError::IncompatibleSchema(_) => 40901,
            RegistryError::NotPrimary(_) => 50003,
            RegistryError::LogUnavailable(_) => 50001,
        }
    }

    /// True for transient coordination errors the caller may retry.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            RegistryError::NotPrimary(_) | RegistryError::LogUnavailable(_)
        )
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidSchema(detail) => write!(f, "invalid schema: {}", detail),
            RegistryError::InvalidVersion(selector) => {
                write!(f, "invalid version selector: {}", selector)
            }
            RegistryError::SubjectNotFound(subject) => write!(f, "subject not found: {}", subject),
            RegistryError::VersionNotFound(version) => write!(f, "version not found: {}", version),
            RegistryError::SchemaNotFound => write!(f, "schema not found"),
            RegistryError::IncompatibleSchema(reason) => {
                write!(f, "schema is incompatible with an earlier version: {}", reason)
            }
            RegistryError::NotPrimary(endpoint) => match endpoint {
                Some(ep) => write!(f, "not the primary; retry against {}", ep),
                None => write!(f, "not the primary and no primary is known"),
            },
            RegistryError::LogUnavailable(detail) => {
                write!(f, "command log unavailable: {}", detail)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(RegistryError::SubjectNotFound("s".into()).error_code(), 40401);
        assert_eq!(RegistryError::VersionNotFound(7).error_code(), 40402);
        assert_eq!(RegistryError::SchemaNotFound.error_code(), 40403);
        assert_eq!(RegistryError::InvalidSchema("x".into()).error_code(), 42201);
        assert_eq!(RegistryError::InvalidVersion("0".into()).error_code(), 42202);
        assert_eq!(RegistryError::IncompatibleSchema("f".into()).error_code(), 40901);
    }

    #[test]
    fn only_coordination_errors_are_retriable() {
        assert!(RegistryError::NotPrimary(None).is_retriable());
        assert!(RegistryError::LogUnavailable("io".into()).is_retriable());
        assert!(!RegistryError::SchemaNotFound.is_retriable());
        assert!(!RegistryError::IncompatibleSchema("f".into()).is_retriable());
    }
}
