// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Regatta -- schema registry for streaming platforms
//!
//! A centralized registry of record schemas for named logical streams
//! ("subjects"). Producers register schemas; consumers retrieve them by
//! globally unique id or by `(subject, version)`. Evolution is gated by
//! configurable compatibility levels (NONE, BACKWARD, FORWARD, FULL).
//!
//! # Features
//!
//! - **Canonicalization**: schemas are parsed, validated, and reduced to a
//!   deterministic canonical text; equality is byte-equality of that text
//! - **Deduplication**: structurally identical schemas share one global id
//!   across all subjects
//! - **Compatibility checking**: structural reader/writer resolution with
//!   a fixed promotion table
//! - **Log-backed state**: every mutation is a command in an append-only
//!   log; replicas replay the log and converge byte-identically
//! - **Single-writer coordination**: one primary accepts writes, replicas
//!   serve reads and forward writes
//!
//! # Architecture
//!
//! ```text
//! transport (regatta-server)
//!        |
//!        v
//!   SchemaRegistry (facade)  -- per-subject write leases, primacy checks
//!        |
//!        v
//!   StateMachine             -- append to CommandLog, replay into Store
//!        |
//!        v
//!   Store                    -- schemas_by_id / id_by_fingerprint / subjects
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use regatta::{
//!     CompatibilityLevel, Coordinator, MemoryCommandLog, Role, SchemaRegistry, StateMachine,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let state = Arc::new(StateMachine::new(
//!     Box::new(MemoryCommandLog::new()),
//!     CompatibilityLevel::None,
//! ));
//! state.bootstrap()?;
//!
//! let registry = SchemaRegistry::new(state, Coordinator::new(Role::Primary));
//! let id = registry.register("clicks-value", r#"{"type":"string"}"#).await?;
//! assert_eq!(id, 1);
//! # Ok(())
//! # }
//! ```

pub mod compat;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod log;
pub mod registry;
pub mod schema;
pub mod state;
pub mod store;

pub use compat::{check, CompatCheck, CompatibilityLevel};
pub use config::{ConfigError, NodeConfig, NodeRole};
pub use coordinator::{Coordinator, Role};
pub use error::RegistryError;
pub use log::{Command, CommandLog, FileCommandLog, LogError, MemoryCommandLog};
pub use registry::{SchemaRegistry, VersionRecord, VersionSelector};
pub use schema::{Fingerprint, Schema, SchemaType};
pub use state::StateMachine;
pub use store::{ConfigScope, SchemaId, Store};
