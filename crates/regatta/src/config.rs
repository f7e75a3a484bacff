// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Node configuration.
//!
//! Supports both programmatic and JSON-file configuration.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compat::CompatibilityLevel;
use crate::coordinator::Role;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Startup role of a node. Election integration may change it later via
/// the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    #[default]
    Primary,
    Replica,
}

/// Registry node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node name (for identification in logs).
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Address to bind to (default: 0.0.0.0).
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// HTTP port to listen on (default: 8081).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the command log.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Startup role.
    #[serde(default)]
    pub role: NodeRole,

    /// Base URL of the primary; required for replicas.
    #[serde(default)]
    pub primary_endpoint: Option<String>,

    /// Global compatibility level before any `SetConfig` command.
    /// Must be identical on every node of a deployment.
    #[serde(default = "default_compatibility")]
    pub default_compatibility: CompatibilityLevel,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_node_id() -> String {
    "regatta-0".to_string()
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8081
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./regatta-data")
}

fn default_compatibility() -> CompatibilityLevel {
    CompatibilityLevel::None
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            bind_address: default_bind_address(),
            port: default_port(),
            data_dir: default_data_dir(),
            role: NodeRole::Primary,
            primary_endpoint: None,
            default_compatibility: default_compatibility(),
            log_level: default_log_level(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port cannot be 0".into()));
        }
        if self.role == NodeRole::Replica && self.primary_endpoint.is_none() {
            return Err(ConfigError::Invalid(
                "primary_endpoint required for replica nodes".into(),
            ));
        }
        Ok(())
    }

    /// Path of the command log file inside `data_dir`.
    pub fn command_log_path(&self) -> PathBuf {
        self.data_dir.join("commands.log")
    }

    /// The coordinator role this configuration boots into.
    pub fn coordinator_role(&self) -> Role {
        match self.role {
            NodeRole::Primary => Role::Primary,
            NodeRole::Replica => Role::Replica {
                // validate() guarantees the endpoint is present.
                primary_endpoint: self.primary_endpoint.clone().unwrap_or_default(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NodeConfig::default();
        assert_eq!(config.port, 8081);
        assert_eq!(config.role, NodeRole::Primary);
        assert_eq!(config.default_compatibility, CompatibilityLevel::None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = NodeConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: NodeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.port, parsed.port);
        assert_eq!(config.role, parsed.role);
    }

    #[test]
    fn replica_requires_primary_endpoint() {
        let config = NodeConfig {
            role: NodeRole::Replica,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NodeConfig {
            role: NodeRole::Replica,
            primary_endpoint: Some("http://primary:8081".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.coordinator_role(),
            Role::Replica {
                primary_endpoint: "http://primary:8081".to_string()
            }
        );
    }

    #[test]
    fn port_zero_is_rejected() {
        let config = NodeConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: NodeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.node_id, "regatta-0");
        assert_eq!(parsed.command_log_path(), PathBuf::from("./regatta-data/commands.log"));
    }
}
