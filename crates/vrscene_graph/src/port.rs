// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for node inputs/outputs.

use serde::{Deserialize, Serialize};

/// Socket direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input socket
    Input,
    /// Output socket
    Output,
}

/// Data type that can flow through sockets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Enumeration index
    Enum,
    /// Floating point value
    Float,
    /// RGB color
    Color,
    /// RGBA color
    AColor,
    /// 3D vector
    Vector,
    /// Affine transform
    Transform,
    /// String value
    String,
    /// Color texture
    Texture,
    /// Float texture
    FloatTexture,
    /// Shading model (BRDF)
    Brdf,
    /// Material
    Material,
    /// Geometry
    Geometry,
    /// UVW generator
    Uvwgen,
    /// Any plugin reference
    Plugin,
    /// List of scene objects
    Objects,
    /// Any type
    Any,
}

impl PortType {
    /// Check if this type can connect to another type
    pub fn can_connect_to(&self, other: &PortType) -> bool {
        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }

        if self == other {
            return true;
        }

        match (self, other) {
            // Numeric conversions
            (Self::Int | Self::Enum | Self::Bool, Self::Float)
            | (Self::Float, Self::Int) => true,
            // Textures feed literal slots of the same shape
            (Self::Texture, Self::Color | Self::AColor)
            | (Self::Color | Self::AColor, Self::Texture) => true,
            (Self::FloatTexture, Self::Float) | (Self::Float, Self::FloatTexture) => true,
            (Self::Texture, Self::FloatTexture) | (Self::FloatTexture, Self::Texture) => true,
            (Self::Color, Self::AColor) | (Self::AColor, Self::Color) => true,
            // Every plugin kind is a plugin
            (
                Self::Texture
                | Self::FloatTexture
                | Self::Brdf
                | Self::Material
                | Self::Geometry
                | Self::Uvwgen,
                Self::Plugin,
            ) => true,
            (
                Self::Plugin,
                Self::Texture
                | Self::FloatTexture
                | Self::Brdf
                | Self::Material
                | Self::Geometry
                | Self::Uvwgen,
            ) => true,
            _ => false,
        }
    }
}

/// A socket on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Socket name, unique per direction on a node
    pub name: String,
    /// Socket direction
    pub direction: PortDirection,
    /// Data type
    pub port_type: PortType,
    /// Plugin attribute this socket maps to
    #[serde(default)]
    pub attr: Option<String>,
    /// Literal value used when the input is not linked
    #[serde(default)]
    pub default_value: Option<PortValue>,
}

impl Port {
    /// Create a new input socket
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            port_type,
            attr: None,
            default_value: None,
        }
    }

    /// Create a new output socket
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            port_type,
            attr: None,
            default_value: None,
        }
    }

    /// Map the socket to a plugin attribute
    pub fn with_attr(mut self, attr: impl Into<String>) -> Self {
        self.attr = Some(attr.into());
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: PortValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Check if a connection to another socket is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        if self.direction == other.direction {
            return false;
        }

        self.port_type.can_connect_to(&other.port_type)
    }
}

/// Literal value stored on a socket or in a node property bag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Enumeration index
    Enum(i32),
    /// Float
    Float(f32),
    /// RGB color
    Color([f32; 3]),
    /// RGBA color
    AColor([f32; 4]),
    /// 3D vector
    Vector([f32; 3]),
    /// Rotation/scale rows followed by the offset
    Transform([[f32; 3]; 4]),
    /// String
    String(String),
    /// File or directory path
    Path(String),
}

impl PortValue {
    /// Get the socket type for this value
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Bool(_) => PortType::Bool,
            Self::Int(_) => PortType::Int,
            Self::Enum(_) => PortType::Enum,
            Self::Float(_) => PortType::Float,
            Self::Color(_) => PortType::Color,
            Self::AColor(_) => PortType::AColor,
            Self::Vector(_) => PortType::Vector,
            Self::Transform(_) => PortType::Transform,
            Self::String(_) | Self::Path(_) => PortType::String,
        }
    }

    /// Scalar view of numeric values
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) | Self::Enum(v) => Some(*v as f32),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}
