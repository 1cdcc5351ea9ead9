// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plugin parameter schemas.
//!
//! Every plugin type the exporter can write is described by a [`PluginDesc`]:
//! its record family and an ordered list of [`ParamDesc`] entries. The type
//! tag of a parameter decides how the writer treats it:
//! - output types are produced by the plugin and never written
//! - plugin and texture types only come from linked sockets
//! - list and transform types are written only when a caller supplies them
//! - everything else is written from the node's property bag

use crate::node::{Node, NodeKind, PluginCategory};
use crate::port::{PortType, PortValue};
use crate::scene::LoadError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameter type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Enumeration index
    Enum,
    /// Float
    Float,
    /// RGB color
    Color,
    /// RGBA color
    AColor,
    /// 3D vector
    Vector,
    /// String
    String,
    /// Affine transform
    Transform,
    /// List of plugin references
    List,
    /// List of integers
    ListInt,
    /// List of floats
    ListFloat,
    /// Any plugin reference
    Plugin,
    /// Shading model reference
    Brdf,
    /// Material reference
    Material,
    /// Geometry reference
    Geometry,
    /// UVW generator reference
    Uvwgen,
    /// Color texture
    Texture,
    /// Float texture
    FloatTexture,
    /// Integer texture
    IntTexture,
    /// Plugin produced by this plugin
    OutputPlugin,
    /// Color texture produced by this plugin
    OutputTexture,
    /// Float texture produced by this plugin
    OutputFloatTexture,
    /// Color produced by this plugin
    OutputColor,
}

impl ParamType {
    /// Produced by the plugin, never consumed
    pub fn is_output(&self) -> bool {
        matches!(
            self,
            Self::OutputPlugin | Self::OutputTexture | Self::OutputFloatTexture | Self::OutputColor
        )
    }

    /// Value only comes from a linked socket
    pub fn is_externally_resolved(&self) -> bool {
        matches!(
            self,
            Self::Plugin
                | Self::Brdf
                | Self::Material
                | Self::Geometry
                | Self::Uvwgen
                | Self::Texture
                | Self::FloatTexture
                | Self::IntTexture
        )
    }

    /// Written only when supplied explicitly
    pub fn is_manual_only(&self) -> bool {
        matches!(self, Self::List | Self::ListInt | Self::ListFloat | Self::Transform)
    }

    /// Empty values mean "no reference" and must not be written
    pub fn is_reference_like(&self) -> bool {
        matches!(
            self,
            Self::Plugin
                | Self::Brdf
                | Self::Material
                | Self::Geometry
                | Self::Uvwgen
                | Self::List
                | Self::ListInt
                | Self::ListFloat
        )
    }

    /// Whether a literal of the given socket type may stand for this parameter
    pub fn accepts(&self, value: &PortType) -> bool {
        match self {
            Self::Bool | Self::Int | Self::Enum => {
                matches!(value, PortType::Bool | PortType::Int | PortType::Enum)
            }
            Self::Float | Self::FloatTexture | Self::IntTexture => {
                matches!(value, PortType::Float | PortType::Int | PortType::Bool)
            }
            Self::Color | Self::AColor | Self::Texture => {
                matches!(value, PortType::Color | PortType::AColor)
            }
            Self::Vector => *value == PortType::Vector,
            Self::Transform => *value == PortType::Transform,
            Self::String => *value == PortType::String,
            _ => true,
        }
    }
}

/// String parameter subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamSubtype {
    /// Path to a file
    FilePath,
    /// Path to a directory
    DirPath,
}

/// One parameter of a plugin type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDesc {
    /// Attribute name
    pub attr: String,
    /// Type tag
    pub param_type: ParamType,
    /// String subtype
    #[serde(default)]
    pub subtype: Option<ParamSubtype>,
    /// Never written unless supplied explicitly
    #[serde(default)]
    pub skip: bool,
    /// Value used when the property bag has none
    #[serde(default)]
    pub default: Option<PortValue>,
}

impl ParamDesc {
    /// Create a parameter description
    pub fn new(attr: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            attr: attr.into(),
            param_type,
            subtype: None,
            skip: false,
            default: None,
        }
    }

    /// Set the default value
    pub fn with_default(mut self, value: PortValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Set the string subtype
    pub fn with_subtype(mut self, subtype: ParamSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    /// Mark as skipped
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Skipped unless a value is supplied explicitly
    pub fn is_skipped(&self) -> bool {
        self.skip || self.param_type.is_manual_only()
    }

    /// Path subtype check
    pub fn is_path(&self) -> bool {
        matches!(self.subtype, Some(ParamSubtype::FilePath | ParamSubtype::DirPath))
    }
}

/// A plugin type description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDesc {
    /// Plugin type name
    pub id: String,
    /// Record family
    pub category: PluginCategory,
    /// Parameters
    pub params: Vec<ParamDesc>,
}

impl PluginDesc {
    /// Create a plugin description
    pub fn new(id: impl Into<String>, category: PluginCategory, params: Vec<ParamDesc>) -> Self {
        Self {
            id: id.into(),
            category,
            params,
        }
    }

    /// Get a parameter by attribute name
    pub fn param(&self, attr: &str) -> Option<&ParamDesc> {
        self.params.iter().find(|p| p.attr == attr)
    }

    /// Parameters sorted by attribute name
    pub fn sorted_params(&self) -> Vec<&ParamDesc> {
        let mut params: Vec<&ParamDesc> = self.params.iter().collect();
        params.sort_by(|a, b| a.attr.cmp(&b.attr));
        params
    }
}

/// Catalog of plugin descriptions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginCatalog {
    /// Registered plugin types by ID
    plugins: IndexMap<String, PluginDesc>,
}

impl PluginCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin type, replacing an existing one of the same ID
    pub fn register(&mut self, desc: PluginDesc) {
        self.plugins.insert(desc.id.clone(), desc);
    }

    /// Get a plugin type by ID
    pub fn get(&self, id: &str) -> Option<&PluginDesc> {
        self.plugins.get(id)
    }

    /// Get all registered plugin types
    pub fn plugins(&self) -> impl Iterator<Item = &PluginDesc> {
        self.plugins.values()
    }

    /// Get plugin types by category
    pub fn plugins_in_category(&self, category: PluginCategory) -> impl Iterator<Item = &PluginDesc> {
        self.plugins.values().filter(move |p| p.category == category)
    }

    /// Add every plugin of another catalog
    pub fn extend(&mut self, other: PluginCatalog) {
        for (_, desc) in other.plugins {
            self.register(desc);
        }
    }

    /// Parse a catalog from RON text
    pub fn from_ron(text: &str) -> Result<Self, LoadError> {
        Ok(ron::from_str(text)?)
    }

    /// Load a catalog from a RON file
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Check a node's property bag and sockets against its schema
    pub fn validate_node(&self, node: &Node) -> Vec<SchemaError> {
        let NodeKind::Plugin { plugin, .. } = &node.kind else {
            return Vec::new();
        };
        let Some(desc) = self.get(plugin) else {
            return vec![SchemaError::UnknownPlugin {
                node: node.name.clone(),
                plugin: plugin.clone(),
            }];
        };

        let mut errors = Vec::new();
        for (attr, value) in &node.params {
            match desc.param(attr) {
                None => errors.push(SchemaError::UnknownParam {
                    node: node.name.clone(),
                    plugin: plugin.clone(),
                    attr: attr.clone(),
                }),
                Some(param) if !param.param_type.accepts(&value.port_type()) => {
                    errors.push(SchemaError::TypeMismatch {
                        node: node.name.clone(),
                        attr: attr.clone(),
                        expected: param.param_type,
                        found: value.port_type(),
                    });
                }
                Some(_) => {}
            }
        }
        for socket in &node.inputs {
            let Some(attr) = &socket.attr else { continue };
            if desc.param(attr).is_none() {
                errors.push(SchemaError::UnknownParam {
                    node: node.name.clone(),
                    plugin: plugin.clone(),
                    attr: attr.clone(),
                });
            }
        }
        errors
    }

    /// Plugin types the exporter writes itself plus the common shading set
    pub fn builtin() -> Self {
        use ParamType as T;
        let mut catalog = Self::new();

        // ====================================================================
        // Shading models
        // ====================================================================

        catalog.register(PluginDesc::new("BRDFDiffuse", PluginCategory::Brdf, vec![
            ParamDesc::new("color", T::Color).with_default(PortValue::Color([0.5, 0.5, 0.5])),
            ParamDesc::new("color_tex", T::Texture),
            ParamDesc::new("color_tex_mult", T::Float).with_default(PortValue::Float(1.0)),
            ParamDesc::new("transparency", T::Color).with_default(PortValue::Color([0.0, 0.0, 0.0])),
            ParamDesc::new("transparency_tex", T::Texture),
            ParamDesc::new("roughness", T::Float).with_default(PortValue::Float(0.0)),
            ParamDesc::new("use_irradiance_map", T::Bool).with_default(PortValue::Bool(true)),
        ]));

        catalog.register(PluginDesc::new("BRDFVRayMtl", PluginCategory::Brdf, vec![
            ParamDesc::new("diffuse", T::Texture),
            ParamDesc::new("roughness", T::FloatTexture),
            ParamDesc::new("reflect", T::Texture),
            ParamDesc::new("reflect_glossiness", T::FloatTexture),
            ParamDesc::new("hilight_glossiness", T::FloatTexture),
            ParamDesc::new("fresnel", T::Bool).with_default(PortValue::Bool(false)),
            ParamDesc::new("fresnel_ior", T::FloatTexture),
            ParamDesc::new("refract", T::Texture),
            ParamDesc::new("refract_ior", T::FloatTexture),
            ParamDesc::new("opacity", T::FloatTexture),
            ParamDesc::new("brdf_type", T::Enum).with_default(PortValue::Enum(1)),
            ParamDesc::new("reflect_subdivs", T::Int).with_default(PortValue::Int(8)),
            ParamDesc::new("option_reflect_on_back", T::Bool).with_default(PortValue::Bool(false)),
            ParamDesc::new("environment_override", T::Texture).skipped(),
        ]));

        catalog.register(PluginDesc::new("BRDFLayered", PluginCategory::Brdf, vec![
            ParamDesc::new("brdfs", T::List),
            ParamDesc::new("weights", T::List),
            ParamDesc::new("additive_mode", T::Bool),
            ParamDesc::new("transparency_tex", T::Texture),
        ]));

        // ====================================================================
        // Materials
        // ====================================================================

        catalog.register(PluginDesc::new("MtlSingleBRDF", PluginCategory::Material, vec![
            ParamDesc::new("brdf", T::Brdf),
            ParamDesc::new("double_sided", T::Bool).with_default(PortValue::Bool(true)),
            ParamDesc::new("allow_negative_colors", T::Bool).with_default(PortValue::Bool(false)),
        ]));

        catalog.register(PluginDesc::new("MtlMulti", PluginCategory::Material, vec![
            ParamDesc::new("mtls_list", T::List),
            ParamDesc::new("ids_list", T::ListInt),
            ParamDesc::new("mtlid_gen_float", T::FloatTexture),
        ]));

        // ====================================================================
        // Textures
        // ====================================================================

        catalog.register(PluginDesc::new("TexAColor", PluginCategory::Texture, vec![
            ParamDesc::new("texture", T::AColor),
            ParamDesc::new("uvwgen", T::Uvwgen),
        ]));

        catalog.register(PluginDesc::new("TexLayered", PluginCategory::Texture, vec![
            ParamDesc::new("textures", T::List),
            ParamDesc::new("weights", T::ListFloat),
            ParamDesc::new("alpha", T::FloatTexture),
        ]));

        catalog.register(PluginDesc::new("TexBitmap", PluginCategory::Texture, vec![
            ParamDesc::new("bitmap", T::Plugin),
            ParamDesc::new("uvwgen", T::Uvwgen),
            ParamDesc::new("color_mult", T::Texture),
            ParamDesc::new("placement_type", T::Enum).with_default(PortValue::Enum(0)),
            ParamDesc::new("tile", T::Enum).with_default(PortValue::Enum(1)),
            ParamDesc::new("nouvw_color", T::AColor).skipped(),
            ParamDesc::new("out_color", T::OutputTexture),
            ParamDesc::new("out_alpha", T::OutputFloatTexture),
            ParamDesc::new("out_intensity", T::OutputFloatTexture),
        ]));

        catalog.register(PluginDesc::new("BitmapBuffer", PluginCategory::Texture, vec![
            ParamDesc::new("file", T::String).with_subtype(ParamSubtype::FilePath),
            ParamDesc::new("gamma", T::Float).with_default(PortValue::Float(1.0)),
            ParamDesc::new("filter_type", T::Enum).with_default(PortValue::Enum(1)),
            ParamDesc::new("filter_blur", T::Float).with_default(PortValue::Float(1.0)),
            ParamDesc::new("color_space", T::Enum).with_default(PortValue::Enum(1)),
        ]));

        catalog.register(PluginDesc::new("TexChecker", PluginCategory::Texture, vec![
            ParamDesc::new("uvwgen", T::Uvwgen),
            ParamDesc::new("white_color", T::Texture),
            ParamDesc::new("black_color", T::Texture),
            ParamDesc::new("contrast", T::Float).with_default(PortValue::Float(1.0)),
            ParamDesc::new("out_color", T::OutputTexture),
        ]));

        catalog.register(PluginDesc::new("TexDistance", PluginCategory::Texture, vec![
            ParamDesc::new("distance", T::Float).with_default(PortValue::Float(1.0)),
            ParamDesc::new("near_tex", T::Texture),
            ParamDesc::new("far_tex", T::Texture),
            ParamDesc::new("inside_separate", T::Bool).with_default(PortValue::Bool(false)),
            ParamDesc::new("objects", T::List),
            ParamDesc::new("out_color", T::OutputTexture),
        ]));

        catalog.register(PluginDesc::new("TexMayaFluid", PluginCategory::Texture, vec![
            ParamDesc::new("cache_path", T::String).with_subtype(ParamSubtype::DirPath),
            ParamDesc::new("transform", T::Transform),
            ParamDesc::new("out_flame", T::OutputFloatTexture),
            ParamDesc::new("out_density", T::OutputFloatTexture),
            ParamDesc::new("out_fuel", T::OutputFloatTexture),
        ]));

        catalog.register(PluginDesc::new("UVWGenChannel", PluginCategory::Uvwgen, vec![
            ParamDesc::new("uvw_channel", T::Int).with_default(PortValue::Int(1)),
            ParamDesc::new("uvw_transform", T::Transform),
            ParamDesc::new("wrap_u", T::Int).with_default(PortValue::Int(0)),
            ParamDesc::new("wrap_v", T::Int).with_default(PortValue::Int(0)),
        ]));

        // ====================================================================
        // Objects
        // ====================================================================

        catalog.register(PluginDesc::new("Node", PluginCategory::Object, vec![
            ParamDesc::new("geometry", T::Geometry),
            ParamDesc::new("material", T::Material),
            ParamDesc::new("transform", T::Transform),
            ParamDesc::new("objectID", T::Int).with_default(PortValue::Int(0)),
            ParamDesc::new("visible", T::Bool).with_default(PortValue::Bool(true)),
        ]));

        catalog
    }
}

/// Schema validation failure
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Plugin type missing from the catalog
    #[error("Node {node}: unknown plugin type {plugin}")]
    UnknownPlugin {
        /// Node name
        node: String,
        /// Plugin type
        plugin: String,
    },

    /// Attribute missing from the plugin schema
    #[error("Node {node}: {plugin} has no parameter {attr}")]
    UnknownParam {
        /// Node name
        node: String,
        /// Plugin type
        plugin: String,
        /// Attribute name
        attr: String,
    },

    /// Property bag value of the wrong type
    #[error("Node {node}: {attr} expects {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Node name
        node: String,
        /// Attribute name
        attr: String,
        /// Declared type
        expected: ParamType,
        /// Stored value type
        found: PortType,
    },

    /// Link endpoint that does not exist
    #[error("Tree {tree}: dangling link {from} -> {to}")]
    DanglingLink {
        /// Tree name
        tree: String,
        /// Source socket
        from: String,
        /// Target socket
        to: String,
    },

    /// Socket stored on the wrong side of a node
    #[error("Node {node}: socket listed with the wrong direction")]
    PortDirection {
        /// Node name
        node: String,
    },
}
