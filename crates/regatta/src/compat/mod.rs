// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compatibility engine.
//!
//! Decides whether a candidate schema may be registered given the latest
//! schema under a subject and the subject's effective compatibility level.
//! The pairwise check is purely structural: it depends only on the two
//! type trees, never on subject or version metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::schema::Schema;

mod resolve;

// ---------------------------------------------------------------------------
// CompatibilityLevel
// ---------------------------------------------------------------------------

/// Evolution rule enforced when a new schema is registered under a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompatibilityLevel {
    /// No constraint.
    None,
    /// The candidate can read data written with the latest schema.
    Backward,
    /// The latest schema can read data written with the candidate.
    Forward,
    /// Both backward and forward against the latest schema.
    Full,
}

impl CompatibilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompatibilityLevel::None => "NONE",
            CompatibilityLevel::Backward => "BACKWARD",
            CompatibilityLevel::Forward => "FORWARD",
            CompatibilityLevel::Full => "FULL",
        }
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompatibilityLevel {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(CompatibilityLevel::None),
            "BACKWARD" => Ok(CompatibilityLevel::Backward),
            "FORWARD" => Ok(CompatibilityLevel::Forward),
            "FULL" => Ok(CompatibilityLevel::Full),
            other => Err(RegistryError::InvalidSchema(format!(
                "unknown compatibility level: {}",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

/// Outcome of a compatibility check.
#[derive(Debug, Clone)]
pub struct CompatCheck {
    pub is_compatible: bool,
    /// Human-readable explanation when incompatible.
    pub reason: Option<String>,
}

impl CompatCheck {
    fn ok() -> Self {
        Self {
            is_compatible: true,
            reason: None,
        }
    }

    fn failed(reason: String) -> Self {
        Self {
            is_compatible: false,
            reason: Some(reason),
        }
    }
}

/// Check a candidate against the latest registered schema under `level`.
pub fn check(candidate: &Schema, latest: &Schema, level: CompatibilityLevel) -> CompatCheck {
    match level {
        CompatibilityLevel::None => CompatCheck::ok(),
        CompatibilityLevel::Backward => {
            // Reader = candidate, writer = latest.
            match resolve::can_read(candidate.root(), latest.root()) {
                Ok(()) => CompatCheck::ok(),
                Err(reason) => CompatCheck::failed(format!("not backward compatible: {}", reason)),
            }
        }
        CompatibilityLevel::Forward => {
            // Reader = latest, writer = candidate.
            match resolve::can_read(latest.root(), candidate.root()) {
                Ok(()) => CompatCheck::ok(),
                Err(reason) => CompatCheck::failed(format!("not forward compatible: {}", reason)),
            }
        }
        CompatibilityLevel::Full => {
            if let Err(reason) = resolve::can_read(candidate.root(), latest.root()) {
                return CompatCheck::failed(format!("not backward compatible: {}", reason));
            }
            if let Err(reason) = resolve::can_read(latest.root(), candidate.root()) {
                return CompatCheck::failed(format!("not forward compatible: {}", reason));
            }
            CompatCheck::ok()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
