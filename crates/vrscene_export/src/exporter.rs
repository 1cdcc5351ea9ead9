// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pass driver.
//!
//! A pass compiles the whole scene for one frame: the default records, the
//! material override, every material with a node tree and every visible
//! object not already written by a selector. Each pass gets its own
//! [`CompileCache`].

use crate::cache::CompileCache;
use crate::context::{ExportContext, GeometryExporter};
use crate::error::ExportError;
use crate::material::{write_defaults, write_material_tree};
use crate::object::write_object;
use crate::output::RecordSink;
use crate::settings::ExportSettings;
use std::ops::RangeInclusive;
use vrscene_graph::{PluginCatalog, Scene, SchemaError};

/// Result of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// Frame the pass was evaluated at
    pub frame: i32,
    /// Records written
    pub records: usize,
    /// Tree nodes compiled
    pub nodes: usize,
}

/// Compiles a scene into vrscene records
pub struct Exporter {
    scene: Scene,
    catalog: PluginCatalog,
    settings: ExportSettings,
}

impl Exporter {
    /// Create an exporter; schema problems and cycles are logged as warnings
    pub fn new(scene: Scene, catalog: PluginCatalog, settings: ExportSettings) -> Self {
        let exporter = Self {
            scene,
            catalog,
            settings,
        };
        for error in exporter.validate() {
            tracing::warn!("{}", error);
        }
        for tree in exporter.scene.node_trees.values() {
            if let Err(cycle) = tree.topological_order() {
                tracing::warn!("{}: {}", tree.name, cycle);
            }
        }
        exporter
    }

    /// Scene being exported
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Plugin schemas
    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Export settings
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Check every node tree against the plugin schemas
    pub fn validate(&self) -> Vec<SchemaError> {
        self.scene
            .node_trees
            .values()
            .flat_map(|tree| tree.validate(&self.catalog))
            .collect()
    }

    /// Run one pass at the configured frame
    pub fn export(
        &self,
        sink: &mut dyn RecordSink,
        geometry: &mut dyn GeometryExporter,
    ) -> Result<PassSummary, ExportError> {
        self.export_frame(self.settings.frame_current, sink, geometry)
    }

    /// Run one pass per frame, each with a fresh cache
    pub fn export_animation(
        &self,
        frames: RangeInclusive<i32>,
        sink: &mut dyn RecordSink,
        geometry: &mut dyn GeometryExporter,
    ) -> Result<Vec<PassSummary>, ExportError> {
        let mut summaries = Vec::new();
        for frame in frames {
            summaries.push(self.export_frame(frame, &mut *sink, &mut *geometry)?);
        }
        Ok(summaries)
    }

    /// Run one pass at `frame`
    pub fn export_frame(
        &self,
        frame: i32,
        sink: &mut dyn RecordSink,
        geometry: &mut dyn GeometryExporter,
    ) -> Result<PassSummary, ExportError> {
        tracing::info!("Exporting {} at frame {}", self.scene.name, frame);

        let mut cache = CompileCache::new();
        let mut ctx = ExportContext::new(&self.settings, &self.scene, &self.catalog, &mut cache, sink, geometry)
            .with_frame(frame);

        ctx.write_raw(&format!(
            "// vrscene_export {}\n// Scene: {} Frame: {}\n",
            env!("CARGO_PKG_VERSION"),
            self.scene.name,
            frame
        ))?;
        write_defaults(&mut ctx)?;

        if let Some(material) = &self.settings.material_override {
            match self.scene.material_tree(material) {
                Some(tree) => {
                    let token = write_material_tree(&mut ctx, tree)?;
                    tracing::info!("Material override: {}", token);
                    ctx.set_material_override(Some(token));
                }
                None => tracing::warn!("Override material {} has no node tree", material),
            }
        }

        for name in self.scene.materials.keys() {
            if let Some(tree) = self.scene.material_tree(name) {
                tracing::debug!("Material {}", name);
                write_material_tree(&mut ctx, tree)?;
            }
        }

        for name in self.scene.objects.keys() {
            write_object(&mut ctx, name)?;
        }

        let summary = PassSummary {
            frame,
            records: ctx.cache().records(),
            nodes: ctx.cache().compiled_nodes(),
        };
        tracing::info!(
            "Frame {}: {} records from {} nodes",
            summary.frame,
            summary.records,
            summary.nodes
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExternalGeometry;
    use crate::output::PluginRecord;
    use vrscene_graph::{Node, NodeKind, NodeTree, PluginCategory, Port, PortType, SceneObject};

    fn scene() -> Scene {
        let mut tree = NodeTree::new("Clay");
        tree.add_node(
            Node::new("Diffuse", NodeKind::plugin(PluginCategory::Brdf, "BRDFDiffuse"))
                .with_output(Port::output("BRDF", PortType::Brdf)),
        );
        tree.add_node(
            Node::new("Single", NodeKind::plugin(PluginCategory::Material, "MtlSingleBRDF"))
                .with_input(Port::input("BRDF", PortType::Brdf).with_attr("brdf"))
                .with_output(Port::output("Material", PortType::Material)),
        );
        tree.add_node(
            Node::new("Output", NodeKind::MaterialOutput { dont_override: false })
                .with_input(Port::input("Material", PortType::Material)),
        );
        tree.connect("Diffuse", "BRDF", "Single", "BRDF").unwrap();
        tree.connect("Single", "Material", "Output", "Material").unwrap();

        let mut scene = Scene::new("Shot");
        scene.add_tree(tree);
        scene.add_material("Clay", Some("Clay".to_string()));
        scene.add_object("Cube", SceneObject::with_mesh("Mesh").with_material("Clay"));
        let mut hidden = SceneObject::with_mesh("Mesh");
        hidden.visible = false;
        scene.add_object("Hidden", hidden);
        scene
    }

    #[test]
    fn test_export_frame() {
        let exporter = Exporter::new(scene(), PluginCatalog::builtin(), ExportSettings::default());
        let mut sink: Vec<PluginRecord> = Vec::new();
        let summary = exporter.export_frame(1, &mut sink, &mut ExternalGeometry).unwrap();

        let names: Vec<_> = sink.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            ["BRDFDiffuse_no_material", "Material_no_material", "NTClayNDiffuse", "NTClayNSingle", "OBCube"]
        );
        assert_eq!(summary.records, 5);
        assert_eq!(summary.nodes, 2);

        let node = sink.last().unwrap();
        assert_eq!(node.plugin, "Node");
        assert_eq!(node.attr("geometry"), Some("MEMesh"));
        assert_eq!(node.attr("material"), Some("NTClayNSingle"));
        assert!(node.attr("transform").unwrap().starts_with("Transform(Matrix("));
    }

    #[test]
    fn test_animation_resets_cache() {
        let settings = ExportSettings {
            animation: true,
            ..ExportSettings::default()
        };
        let exporter = Exporter::new(scene(), PluginCatalog::builtin(), settings);
        let mut sink: Vec<PluginRecord> = Vec::new();
        let summaries = exporter.export_animation(1..=3, &mut sink, &mut ExternalGeometry).unwrap();

        assert_eq!(summaries.len(), 3);
        assert!(summaries.iter().all(|s| s.records == 5));
        assert_eq!(sink.iter().filter(|r| r.name == "NTClayNSingle").count(), 3);
        let frames: Vec<_> = sink
            .iter()
            .filter(|r| r.name == "NTClayNSingle")
            .map(|r| r.attr("double_sided").unwrap().to_string())
            .collect();
        assert_eq!(frames, ["interpolate((1,1))", "interpolate((2,1))", "interpolate((3,1))"]);
    }

    #[test]
    fn test_validation_reports_unknown_plugins() {
        let mut scene = scene();
        let mut tree = NodeTree::new("Broken");
        tree.add_node(Node::new("X", NodeKind::plugin(PluginCategory::Texture, "TexNope")));
        scene.add_tree(tree);

        let exporter = Exporter::new(scene, PluginCatalog::builtin(), ExportSettings::default());
        assert!(matches!(exporter.validate().as_slice(), [SchemaError::UnknownPlugin { .. }]));
    }
}
