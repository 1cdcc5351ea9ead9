// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene data the exporter reads: objects, groups, materials and node trees.

use crate::graph::NodeTree;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Identity transform in row-major rotation/scale rows plus offset
pub const IDENTITY_TRANSFORM: [[f32; 3]; 4] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.0, 0.0],
];

fn identity() -> [[f32; 3]; 4] {
    IDENTITY_TRANSFORM
}

fn visible() -> bool {
    true
}

/// A material datablock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Material {
    /// Name of the material's node tree
    #[serde(default)]
    pub node_tree: Option<String>,
}

/// A scene object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    /// Mesh datablock name
    #[serde(default)]
    pub mesh: Option<String>,
    /// Material slots, `None` for empty slots
    #[serde(default)]
    pub material_slots: Vec<Option<String>>,
    /// Name of the object's node tree
    #[serde(default)]
    pub node_tree: Option<String>,
    /// World transform
    #[serde(default = "identity")]
    pub transform: [[f32; 3]; 4],
    /// Whether the object is rendered
    #[serde(default = "visible")]
    pub visible: bool,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            mesh: None,
            material_slots: Vec::new(),
            node_tree: None,
            transform: IDENTITY_TRANSFORM,
            visible: true,
        }
    }
}

impl SceneObject {
    /// Create an object using the given mesh
    pub fn with_mesh(mesh: impl Into<String>) -> Self {
        Self {
            mesh: Some(mesh.into()),
            ..Self::default()
        }
    }

    /// Append a material slot
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material_slots.push(Some(material.into()));
        self
    }
}

/// A named collection of objects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Group {
    /// Object names
    pub objects: Vec<String>,
}

/// Scene graph provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Node trees by name
    #[serde(default)]
    pub node_trees: IndexMap<String, NodeTree>,
    /// Materials by name
    #[serde(default)]
    pub materials: IndexMap<String, Material>,
    /// Objects by name
    #[serde(default)]
    pub objects: IndexMap<String, SceneObject>,
    /// Object groups by name
    #[serde(default)]
    pub groups: IndexMap<String, Group>,
}

impl Scene {
    /// Create a new empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a node tree, keyed by its name
    pub fn add_tree(&mut self, tree: NodeTree) {
        self.node_trees.insert(tree.name.clone(), tree);
    }

    /// Add a material using the given node tree
    pub fn add_material(&mut self, name: impl Into<String>, node_tree: Option<String>) {
        self.materials.insert(name.into(), Material { node_tree });
    }

    /// Add an object
    pub fn add_object(&mut self, name: impl Into<String>, object: SceneObject) {
        self.objects.insert(name.into(), object);
    }

    /// Add a group
    pub fn add_group(&mut self, name: impl Into<String>, objects: Vec<String>) {
        self.groups.insert(name.into(), Group { objects });
    }

    /// Get a node tree by name
    pub fn tree(&self, name: &str) -> Option<&NodeTree> {
        self.node_trees.get(name)
    }

    /// Node tree of a material, if the material exists and has one
    pub fn material_tree(&self, material: &str) -> Option<&NodeTree> {
        let tree = self.materials.get(material)?.node_tree.as_deref()?;
        self.tree(tree)
    }

    /// Get an object by name
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    /// Get a group by name
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Parse a scene from RON text
    pub fn from_ron(text: &str) -> Result<Self, LoadError> {
        Ok(ron::from_str(text)?)
    }

    /// Load a scene from a RON file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }
}

/// Error loading a RON document
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_tree_lookup() {
        let mut scene = Scene::new("Scene");
        scene.add_tree(NodeTree::new("Red"));
        scene.add_material("Red", Some("Red".to_string()));
        scene.add_material("Legacy", None);

        assert!(scene.material_tree("Red").is_some());
        assert!(scene.material_tree("Legacy").is_none());
        assert!(scene.material_tree("Missing").is_none());
    }

    #[test]
    fn test_scene_from_ron_defaults() {
        let text = r#"(
            name: "Shot",
            objects: {
                "Cube": (mesh: Some("CubeMesh"), material_slots: [Some("Red"), None]),
            },
            groups: {
                "Props": (objects: ["Cube"]),
            },
        )"#;
        let scene = Scene::from_ron(text).unwrap();
        let cube = scene.object("Cube").unwrap();
        assert!(cube.visible);
        assert_eq!(cube.transform, IDENTITY_TRANSFORM);
        assert_eq!(cube.material_slots.len(), 2);
        assert_eq!(scene.group("Props").unwrap().objects, ["Cube"]);
    }

    #[test]
    fn test_scene_from_ron_error() {
        assert!(matches!(Scene::from_ron("(name: 3"), Err(LoadError::Parse(_))));
    }
}
