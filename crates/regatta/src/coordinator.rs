// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primary/replica role management.
//!
//! Exactly one node is the primary at any time; election itself is
//! delegated to an external coordination service. This handle holds the
//! node's current role, lets the election integration flip it at runtime,
//! and notifies interested tasks through a watch channel. Only the primary
//! may append to the command log; replicas forward writes to
//! `primary_endpoint`.

use tokio::sync::watch;
use tracing::info;

/// A node's current role in the single-writer protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Primary,
    Replica {
        /// Base URL of the current primary, e.g. `http://10.0.0.5:8081`.
        primary_endpoint: String,
    },
}

impl Role {
    pub fn is_primary(&self) -> bool {
        matches!(self, Role::Primary)
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

pub struct Coordinator {
    role: watch::Sender<Role>,
}

impl Coordinator {
    pub fn new(role: Role) -> Self {
        let (tx, _) = watch::channel(role);
        Self { role: tx }
    }

    pub fn role(&self) -> Role {
        self.role.borrow().clone()
    }

    pub fn is_primary(&self) -> bool {
        self.role.borrow().is_primary()
    }

    /// Endpoint of the primary, when this node is a replica.
    pub fn primary_endpoint(&self) -> Option<String> {
        match &*self.role.borrow() {
            Role::Primary => None,
            Role::Replica { primary_endpoint } => Some(primary_endpoint.clone()),
        }
    }

    /// Adopt a new role. In-flight writes observe the change at their next
    /// primacy check and fail with a retriable error.
    pub fn set_role(&self, role: Role) {
        info!(?role, "role change");
        self.role.send_replace(role);
    }

    /// Watch for role changes (used by the transport layer).
    pub fn subscribe(&self) -> watch::Receiver<Role> {
        self.role.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_has_no_forwarding_endpoint() {
        let coordinator = Coordinator::new(Role::Primary);
        assert!(coordinator.is_primary());
        assert_eq!(coordinator.primary_endpoint(), None);
    }

    #[test]
    fn replica_knows_the_primary() {
        let coordinator = Coordinator::new(Role::Replica {
            primary_endpoint: "http://primary:8081".to_string(),
        });
        assert!(!coordinator.is_primary());
        assert_eq!(
            coordinator.primary_endpoint(),
            Some("http://primary:8081".to_string())
        );
    }

    #[tokio::test]
    async fn role_change_notifies_subscribers() {
        let coordinator = Coordinator::new(Role::Primary);
        let mut rx = coordinator.subscribe();

        coordinator.set_role(Role::Replica {
            primary_endpoint: "http://other:8081".to_string(),
        });

        rx.changed().await.unwrap();
        assert!(!rx.borrow().is_primary());
        assert!(!coordinator.is_primary());
    }
}
