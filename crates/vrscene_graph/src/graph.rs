// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node tree data structure containing nodes and links.

use crate::connection::{Link, LinkId};
use crate::node::{Node, NodeKind};
use crate::port::{Port, PortDirection};
use crate::schema::{PluginCatalog, SchemaError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A shader, material or object node tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTree {
    /// Tree name
    pub name: String,
    /// Nodes keyed by name
    #[serde(default, with = "node_list")]
    nodes: IndexMap<String, Node>,
    /// Links between sockets
    #[serde(default)]
    links: Vec<Link>,
}

impl NodeTree {
    /// Create a new empty tree
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: Vec::new(),
        }
    }

    /// Add a node to the tree, replacing a node of the same name
    pub fn add_node(&mut self, node: Node) -> String {
        let name = node.name.clone();
        self.nodes.insert(name.clone(), node);
        name
    }

    /// Remove a node and its links
    pub fn remove_node(&mut self, name: &str) -> Option<Node> {
        self.links.retain(|l| !l.involves_node(name));
        self.nodes.shift_remove(name)
    }

    /// Get a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Link an output socket to an input socket
    pub fn connect(
        &mut self,
        from_node: &str,
        from_port: &str,
        to_node: &str,
        to_port: &str,
    ) -> Result<LinkId, ConnectionError> {
        let source_node = self
            .nodes
            .get(from_node)
            .ok_or_else(|| ConnectionError::NodeNotFound(from_node.to_string()))?;
        let target_node = self
            .nodes
            .get(to_node)
            .ok_or_else(|| ConnectionError::NodeNotFound(to_node.to_string()))?;

        let source_port = source_node
            .output(from_port)
            .ok_or_else(|| ConnectionError::PortNotFound(from_node.to_string(), from_port.to_string()))?;
        let target_port = target_node
            .input(to_port)
            .ok_or_else(|| ConnectionError::PortNotFound(to_node.to_string(), to_port.to_string()))?;

        if !source_port.can_connect(target_port) {
            return Err(ConnectionError::IncompatiblePorts);
        }

        // Inputs take a single link
        if self.link_to(to_node, to_port).is_some() {
            return Err(ConnectionError::PortAlreadyConnected(
                to_node.to_string(),
                to_port.to_string(),
            ));
        }

        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        let link = Link::new(from_node, from_port, to_node, to_port);
        let id = link.id;
        self.links.push(link);
        Ok(id)
    }

    /// Remove a link
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        let index = self.links.iter().position(|l| l.id == link_id)?;
        Some(self.links.remove(index))
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// Get the link ending at an input socket
    pub fn link_to(&self, node: &str, port: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.targets(node, port))
    }

    /// Check whether an input socket is linked
    pub fn is_linked(&self, node: &str, port: &str) -> bool {
        self.link_to(node, port).is_some()
    }

    /// Upstream node and output socket feeding an input socket
    pub fn linked_source(&self, node: &str, port: &str) -> Option<(&Node, &Port)> {
        let link = self.link_to(node, port)?;
        let source = self.nodes.get(&link.from_node)?;
        let socket = source.output(&link.from_port)?;
        Some((source, socket))
    }

    /// Nodes matching a kind predicate
    pub fn nodes_where<'a>(
        &'a self,
        predicate: impl Fn(&NodeKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| predicate(&n.kind))
    }

    /// First material output node
    pub fn material_output(&self) -> Option<&Node> {
        self.nodes_where(|k| matches!(k, NodeKind::MaterialOutput { .. }))
            .next()
    }

    /// First object output node
    pub fn object_output(&self) -> Option<&Node> {
        self.nodes_where(|k| matches!(k, NodeKind::ObjectOutput)).next()
    }

    /// Get node names in dependency order (sources first)
    pub fn topological_order(&self) -> Result<Vec<String>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for name in self.nodes.keys() {
            if !visited.contains(name.as_str()) {
                self.visit(name, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        temp_mark: &mut HashSet<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(name) {
            return Err(CycleError(name.to_string()));
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_mark.insert(name);

        for link in self.links.iter().filter(|l| l.to_node == name) {
            self.visit(&link.from_node, visited, temp_mark, order)?;
        }

        temp_mark.remove(name);
        visited.insert(name);
        order.push(name.to_string());

        Ok(())
    }

    /// Check links and property bags against the plugin catalog
    pub fn validate(&self, catalog: &PluginCatalog) -> Vec<SchemaError> {
        let mut errors = Vec::new();

        for link in &self.links {
            let source_ok = self
                .nodes
                .get(&link.from_node)
                .and_then(|n| n.output(&link.from_port))
                .is_some();
            let target_ok = self
                .nodes
                .get(&link.to_node)
                .and_then(|n| n.input(&link.to_port))
                .is_some();
            if !source_ok || !target_ok {
                errors.push(SchemaError::DanglingLink {
                    tree: self.name.clone(),
                    from: format!("{}.{}", link.from_node, link.from_port),
                    to: format!("{}.{}", link.to_node, link.to_port),
                });
            }
        }

        for node in self.nodes.values() {
            let misplaced = node.inputs.iter().any(|p| p.direction != PortDirection::Input)
                || node.outputs.iter().any(|p| p.direction != PortDirection::Output);
            if misplaced {
                errors.push(SchemaError::PortDirection {
                    node: node.name.clone(),
                });
            }
            errors.extend(catalog.validate_node(node));
        }

        errors
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Nodes are written as a list and keyed by name on load
mod node_list {
    use crate::node::Node;
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        nodes: &IndexMap<String, Node>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<&Node> = nodes.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<String, Node>, D::Error> {
        let list = Vec::<Node>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|n| (n.name.clone(), n)).collect())
    }
}

/// Error when creating a link
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Socket not found
    #[error("Socket not found: {0}.{1}")]
    PortNotFound(String, String),

    /// Incompatible socket types
    #[error("Incompatible socket types")]
    IncompatiblePorts,

    /// Input is already linked
    #[error("Socket already connected: {0}.{1}")]
    PortAlreadyConnected(String, String),

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,
}

/// Error when a tree contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Node tree contains a cycle through {0}")]
pub struct CycleError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PluginCategory;
    use crate::port::PortType;

    fn texture(name: &str) -> Node {
        Node::new(name, NodeKind::plugin(PluginCategory::Texture, "TexChecker"))
            .with_input(Port::input("Color A", PortType::Texture).with_attr("color_a"))
            .with_output(Port::output("Color", PortType::Texture))
    }

    #[test]
    fn test_connect_and_lookup() {
        let mut tree = NodeTree::new("Tree");
        tree.add_node(texture("A"));
        tree.add_node(texture("B"));

        tree.connect("A", "Color", "B", "Color A").unwrap();

        assert!(tree.is_linked("B", "Color A"));
        let (source, socket) = tree.linked_source("B", "Color A").unwrap();
        assert_eq!(source.name, "A");
        assert_eq!(socket.name, "Color");
    }

    #[test]
    fn test_connect_rejects_second_link() {
        let mut tree = NodeTree::new("Tree");
        tree.add_node(texture("A"));
        tree.add_node(texture("B"));
        tree.add_node(texture("C"));

        tree.connect("A", "Color", "C", "Color A").unwrap();
        let err = tree.connect("B", "Color", "C", "Color A").unwrap_err();
        assert!(matches!(err, ConnectionError::PortAlreadyConnected(..)));
    }

    #[test]
    fn test_connect_rejects_unknown_socket() {
        let mut tree = NodeTree::new("Tree");
        tree.add_node(texture("A"));
        tree.add_node(texture("B"));

        let err = tree.connect("A", "Missing", "B", "Color A").unwrap_err();
        assert!(matches!(err, ConnectionError::PortNotFound(..)));
    }

    #[test]
    fn test_topological_order_and_cycle() {
        let mut tree = NodeTree::new("Tree");
        tree.add_node(texture("A"));
        tree.add_node(texture("B"));
        tree.connect("A", "Color", "B", "Color A").unwrap();

        let order = tree.topological_order().unwrap();
        let a = order.iter().position(|n| n == "A").unwrap();
        let b = order.iter().position(|n| n == "B").unwrap();
        assert!(a < b);

        tree.connect("B", "Color", "A", "Color A").unwrap();
        assert!(tree.topological_order().is_err());
    }

    #[test]
    fn test_remove_node_drops_links() {
        let mut tree = NodeTree::new("Tree");
        tree.add_node(texture("A"));
        tree.add_node(texture("B"));
        let id = tree.connect("A", "Color", "B", "Color A").unwrap();

        tree.remove_node("A");
        assert_eq!(tree.links().count(), 0);
        assert!(tree.disconnect(id).is_none());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut tree = NodeTree::new("Tree");
        tree.add_node(texture("A"));
        tree.add_node(texture("B"));
        tree.connect("A", "Color", "B", "Color A").unwrap();

        let text = ron::to_string(&tree).unwrap();
        let loaded: NodeTree = ron::from_str(&text).unwrap();
        assert_eq!(loaded.node_count(), 2);
        assert!(loaded.is_linked("B", "Color A"));
    }
}
