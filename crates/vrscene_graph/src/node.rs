// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for shader and object trees.

use crate::port::{Port, PortValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Record type family a plugin belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PluginCategory {
    /// Shading models
    Brdf,
    /// Materials
    Material,
    /// Color and float textures
    Texture,
    /// UVW generators
    Uvwgen,
    /// Geometry sources
    Geometry,
    /// Lights
    Light,
    /// Cameras
    Camera,
    /// Scene objects
    Object,
    /// Render settings
    Settings,
    /// Volumetric and environment effects
    Effect,
    /// Render elements
    RenderChannel,
}

impl PluginCategory {
    /// Section name used in generated comments
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brdf => "BRDF",
            Self::Material => "MATERIAL",
            Self::Texture => "TEXTURE",
            Self::Uvwgen => "UVWGEN",
            Self::Geometry => "GEOMETRY",
            Self::Light => "LIGHT",
            Self::Camera => "CAMERA",
            Self::Object => "OBJECT",
            Self::Settings => "SETTINGS",
            Self::Effect => "EFFECT",
            Self::RenderChannel => "RENDERCHANNEL",
        }
    }
}

/// What a node compiles to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Generic node written from its property bag and linked sockets
    Plugin {
        /// Record family
        category: PluginCategory,
        /// Plugin type id in the catalog
        plugin: String,
    },
    /// Node without a plugin
    Unset,
    /// Layered texture blend
    TexLayered,
    /// Layered shading-model blend
    BrdfLayered {
        /// Add layers instead of blending them
        #[serde(default)]
        additive_mode: bool,
    },
    /// Selects a single scene object by name
    SelectObject {
        /// Object name
        #[serde(default)]
        object: Option<String>,
    },
    /// Selects the objects of a group by name
    SelectGroup {
        /// Group name
        #[serde(default)]
        group: Option<String>,
    },
    /// Geometry of the object being exported
    OutputGeometry,
    /// Material (or multi-material) of the object being exported
    OutputMaterial,
    /// Output node of a material tree
    MaterialOutput {
        /// Ignore the global material override for this tree
        #[serde(default)]
        dont_override: bool,
    },
    /// Output node of an object tree
    ObjectOutput,
}

impl NodeKind {
    /// Shorthand for a generic plugin node kind
    pub fn plugin(category: PluginCategory, plugin: impl Into<String>) -> Self {
        Self::Plugin {
            category,
            plugin: plugin.into(),
        }
    }

    /// Kind name used in log output
    pub fn label(&self) -> &str {
        match self {
            Self::Plugin { plugin, .. } => plugin,
            Self::Unset => "Unset",
            Self::TexLayered => "TexLayered",
            Self::BrdfLayered { .. } => "BRDFLayered",
            Self::SelectObject { .. } => "SelectObject",
            Self::SelectGroup { .. } => "SelectGroup",
            Self::OutputGeometry => "OutputGeometry",
            Self::OutputMaterial => "OutputMaterial",
            Self::MaterialOutput { .. } => "MaterialOutput",
            Self::ObjectOutput => "ObjectOutput",
        }
    }
}

/// A node instance in a tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Node name, unique within its tree
    pub name: String,
    /// What the node compiles to
    pub kind: NodeKind,
    /// Input sockets
    #[serde(default)]
    pub inputs: Vec<Port>,
    /// Output sockets
    #[serde(default)]
    pub outputs: Vec<Port>,
    /// Literal parameter values of the node's plugin
    #[serde(default)]
    pub params: IndexMap<String, PortValue>,
}

impl Node {
    /// Create a node without sockets
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            params: IndexMap::new(),
        }
    }

    /// Add an input socket
    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    /// Add an output socket
    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    /// Set a property bag value
    pub fn with_param(mut self, attr: impl Into<String>, value: PortValue) -> Self {
        self.params.insert(attr.into(), value);
        self
    }

    /// Get an input socket by name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get an output socket by name
    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }

    /// Get all sockets
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortType;

    #[test]
    fn test_socket_lookup() {
        let node = Node::new("Bitmap", NodeKind::plugin(PluginCategory::Texture, "TexBitmap"))
            .with_input(Port::input("Uvwgen", PortType::Uvwgen).with_attr("uvwgen"))
            .with_output(Port::output("Color", PortType::Texture).with_attr("out_color"));

        assert!(node.input("Uvwgen").is_some());
        assert!(node.input("Color").is_none());
        assert_eq!(node.output("Color").and_then(|p| p.attr.as_deref()), Some("out_color"));
        assert_eq!(node.ports().count(), 2);
    }

    #[test]
    fn test_kind_ron_round_trip() {
        let kind = NodeKind::BrdfLayered { additive_mode: true };
        let text = ron::to_string(&kind).unwrap();
        let back: NodeKind = ron::from_str(&text).unwrap();
        assert_eq!(back, kind);
        assert_eq!(back.label(), "BRDFLayered");
    }
}
