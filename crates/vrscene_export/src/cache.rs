// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pass-scoped compilation cache.
//!
//! Create one [`CompileCache`] per pass and drop it afterwards: node
//! identities are stable across frames but their compiled values are not.

use crate::resolver::Resolved;
use std::collections::{HashMap, HashSet};

/// Compilation state of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    /// Inputs are being resolved
    Resolving,
    /// Record written
    Done(Resolved),
}

/// Compilation state of a scene object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectState {
    /// Object record is being compiled
    Resolving,
    /// Token of the object's record, `None` if it produced none
    Done(Option<String>),
}

/// Records compiled in the current pass
#[derive(Debug, Default)]
pub struct CompileCache {
    /// Node states keyed by (tree, node)
    nodes: HashMap<(String, String), NodeState>,
    /// Scene object states keyed by object name
    objects: HashMap<String, ObjectState>,
    /// Meshes handed to the geometry exporter
    meshes: HashSet<String>,
    /// Records synthesized outside node trees, keyed by instance name
    synthesized: HashMap<String, String>,
    /// Instance names in use
    names: HashSet<String>,
    /// Instance names already written
    written: HashSet<String>,
    /// Records written
    records: usize,
}

impl CompileCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a node, if it was reached in this pass
    pub fn state(&self, tree: &str, node: &str) -> Option<&NodeState> {
        self.nodes.get(&(tree.to_string(), node.to_string()))
    }

    /// Mark a node as being resolved
    pub fn begin(&mut self, tree: &str, node: &str) {
        self.nodes
            .insert((tree.to_string(), node.to_string()), NodeState::Resolving);
    }

    /// Store the compiled value of a node
    pub fn finish(&mut self, tree: &str, node: &str, value: Resolved) {
        self.nodes
            .insert((tree.to_string(), node.to_string()), NodeState::Done(value));
    }

    /// Forget a node that produced nothing
    pub fn abandon(&mut self, tree: &str, node: &str) {
        self.nodes.remove(&(tree.to_string(), node.to_string()));
    }

    /// Number of compiled nodes
    pub fn compiled_nodes(&self) -> usize {
        self.nodes
            .values()
            .filter(|s| matches!(s, NodeState::Done(_)))
            .count()
    }

    /// State of a scene object, if it was reached in this pass
    pub fn object_state(&self, object: &str) -> Option<&ObjectState> {
        self.objects.get(object)
    }

    /// Mark an object as being compiled
    pub fn begin_object(&mut self, object: &str) {
        self.objects.insert(object.to_string(), ObjectState::Resolving);
    }

    /// Store the record token of an object
    pub fn finish_object(&mut self, object: &str, token: Option<String>) {
        self.objects.insert(object.to_string(), ObjectState::Done(token));
    }

    /// Forget an object whose compilation failed
    pub fn abandon_object(&mut self, object: &str) {
        self.objects.remove(object);
    }

    /// Record a mesh; returns `true` the first time it is seen
    pub fn insert_mesh(&mut self, mesh: &str) -> bool {
        self.meshes.insert(mesh.to_string())
    }

    /// Token of a synthesized record
    pub fn synthesized(&self, key: &str) -> Option<&str> {
        self.synthesized.get(key).map(String::as_str)
    }

    /// Remember a synthesized record
    pub fn insert_synthesized(&mut self, key: &str, token: &str) {
        self.synthesized.insert(key.to_string(), token.to_string());
    }

    /// Reserve an exact instance name; returns `false` if already taken
    pub fn reserve_name(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    /// Reserve a unique instance name derived from `base`
    pub fn claim_name(&mut self, base: &str) -> String {
        if self.reserve_name(base) {
            return base.to_string();
        }
        let mut index = 1;
        loop {
            let candidate = format!("{base}_{index}");
            if self.reserve_name(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Whether an instance name is in use
    pub fn is_name_taken(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Count a record written as `name`; returns `false` if the name was
    /// already written in this pass
    pub fn count_record(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string());
        self.records += 1;
        self.written.insert(name.to_string())
    }

    /// Records written in this pass
    pub fn records(&self) -> usize {
        self.records
    }
}
