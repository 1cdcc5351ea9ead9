// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for node trees.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// A link from an output socket to an input socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID
    #[serde(default)]
    pub id: LinkId,
    /// Source node name
    pub from_node: String,
    /// Source output socket name
    pub from_port: String,
    /// Target node name
    pub to_node: String,
    /// Target input socket name
    pub to_port: String,
}

impl Link {
    /// Create a new link
    pub fn new(
        from_node: impl Into<String>,
        from_port: impl Into<String>,
        to_node: impl Into<String>,
        to_port: impl Into<String>,
    ) -> Self {
        Self {
            id: LinkId::new(),
            from_node: from_node.into(),
            from_port: from_port.into(),
            to_node: to_node.into(),
            to_port: to_port.into(),
        }
    }

    /// Check if this link involves a specific node
    pub fn involves_node(&self, node: &str) -> bool {
        self.from_node == node || self.to_node == node
    }

    /// Check if this link ends at the given input socket
    pub fn targets(&self, node: &str, port: &str) -> bool {
        self.to_node == node && self.to_port == port
    }
}
