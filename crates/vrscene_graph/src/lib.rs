// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene and node tree model for vrscene export.
//!
//! This crate holds everything the exporter reads:
//! - Node trees (shader, material and object graphs)
//! - Nodes with typed sockets and property bags
//! - The scene: objects, groups and materials
//! - Plugin parameter schemas
//!
//! ## Architecture
//!
//! Nodes are addressed by name within their tree and links join an output
//! socket to an input socket. A node's [`NodeKind`] decides how it compiles:
//! generic plugin nodes are written from their schema, the remaining kinds
//! have dedicated handling in the exporter. All types serialize with serde
//! and load from RON.

pub mod node;
pub mod port;
pub mod connection;
pub mod graph;
pub mod scene;
pub mod schema;

pub use node::{Node, NodeKind, PluginCategory};
pub use port::{Port, PortDirection, PortType, PortValue};
pub use connection::{Link, LinkId};
pub use graph::{ConnectionError, CycleError, NodeTree};
pub use scene::{Group, LoadError, Material, Scene, SceneObject, IDENTITY_TRANSFORM};
pub use schema::{ParamDesc, ParamSubtype, ParamType, PluginCatalog, PluginDesc, SchemaError};
