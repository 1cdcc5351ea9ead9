// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader graph compiler for the vrscene format.
//!
//! Turns the node trees of a [`vrscene_graph::Scene`] into a flat list of
//! named plugin records:
//! - Graph resolver: depth-first walk from a material or object output
//! - Plugin writer: schema-driven attribute filtering and formatting
//! - Compilation cache: one record per node per pass, cycle detection
//!
//! ## Architecture
//!
//! Every resolver receives an [`ExportContext`] holding the read-only inputs
//! of the pass, the [`CompileCache`] and the [`RecordSink`] records go to.
//! Records are written in post-order, so every reference points at a record
//! that is already in the output. The [`Exporter`] runs whole passes.

pub mod bridge;
pub mod cache;
pub mod context;
pub mod error;
pub mod exporter;
pub mod format;
pub mod layered;
pub mod material;
pub mod object;
pub mod output;
pub mod resolver;
pub mod settings;
pub mod writer;

pub use cache::{CompileCache, NodeState, ObjectState};
pub use context::{
    ExportContext, ExternalGeometry, GeometryExporter, ObjectScope, DEFAULT_BRDF, DEFAULT_MATERIAL,
};
pub use error::ExportError;
pub use exporter::{Exporter, PassSummary};
pub use material::{write_defaults, write_material_tree};
pub use object::write_object;
pub use output::{PluginRecord, RecordSink, VrsceneWriter};
pub use resolver::{resolve_node, resolve_socket, Resolved};
pub use settings::ExportSettings;
pub use writer::write_plugin;
