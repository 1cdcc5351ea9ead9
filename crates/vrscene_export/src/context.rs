// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compilation context threaded through every resolver.

use crate::cache::CompileCache;
use crate::error::ExportError;
use crate::format::{format_value, interpolate};
use crate::output::{PluginRecord, RecordSink};
use crate::settings::ExportSettings;
use vrscene_graph::{PluginCatalog, PortValue, Scene};

/// Instance name of the material used when nothing else applies
pub const DEFAULT_MATERIAL: &str = "Material_no_material";

/// Instance name of the shading model behind [`DEFAULT_MATERIAL`]
pub const DEFAULT_BRDF: &str = "BRDFDiffuse_no_material";

/// Writes mesh data for the geometry bridge
pub trait GeometryExporter {
    /// Write the mesh `mesh` of `object` as the plugin instance `name`
    fn export_mesh(
        &mut self,
        object: &str,
        mesh: &str,
        name: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<(), ExportError>;
}

/// Geometry exporter for scenes whose meshes live in a separate file
#[derive(Debug, Default)]
pub struct ExternalGeometry;

impl GeometryExporter for ExternalGeometry {
    fn export_mesh(
        &mut self,
        object: &str,
        mesh: &str,
        name: &str,
        _sink: &mut dyn RecordSink,
    ) -> Result<(), ExportError> {
        tracing::debug!("Mesh {} of {} expected as {} in the geometry file", mesh, object, name);
        Ok(())
    }
}

/// Object whose node tree is being compiled
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectScope {
    /// Object name
    pub name: String,
    /// Mesh datablock name
    pub mesh: Option<String>,
    /// Object node tree name
    pub tree: Option<String>,
}

/// Everything one pass needs: inputs, cache and output
pub struct ExportContext<'a> {
    settings: &'a ExportSettings,
    scene: &'a Scene,
    catalog: &'a PluginCatalog,
    cache: &'a mut CompileCache,
    sink: &'a mut dyn RecordSink,
    geometry: &'a mut dyn GeometryExporter,
    object: Option<ObjectScope>,
    material_override: Option<String>,
    frame: i32,
}

impl<'a> ExportContext<'a> {
    /// Create a context for one pass
    pub fn new(
        settings: &'a ExportSettings,
        scene: &'a Scene,
        catalog: &'a PluginCatalog,
        cache: &'a mut CompileCache,
        sink: &'a mut dyn RecordSink,
        geometry: &'a mut dyn GeometryExporter,
    ) -> Self {
        Self {
            settings,
            scene,
            catalog,
            cache,
            sink,
            geometry,
            object: None,
            material_override: None,
            frame: settings.frame_current,
        }
    }

    /// Evaluate literals at another frame
    pub fn with_frame(mut self, frame: i32) -> Self {
        self.frame = frame;
        self
    }

    /// Export settings
    pub fn settings(&self) -> &'a ExportSettings {
        self.settings
    }

    /// Scene being exported
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Plugin schemas
    pub fn catalog(&self) -> &'a PluginCatalog {
        self.catalog
    }

    /// Pass cache
    pub fn cache(&self) -> &CompileCache {
        &*self.cache
    }

    /// Mutable pass cache
    pub fn cache_mut(&mut self) -> &mut CompileCache {
        &mut *self.cache
    }

    /// Current frame
    pub fn frame(&self) -> i32 {
        self.frame
    }

    /// Object being exported
    pub fn object(&self) -> Option<&ObjectScope> {
        self.object.as_ref()
    }

    /// Swap the object scope and return the previous one
    pub fn replace_object(&mut self, scope: Option<ObjectScope>) -> Option<ObjectScope> {
        std::mem::replace(&mut self.object, scope)
    }

    /// Cache key of a tree; an object's own tree is compiled per object
    pub fn tree_key(&self, tree: &str) -> String {
        match &self.object {
            Some(scope) if scope.tree.as_deref() == Some(tree) => format!("{tree}@{}", scope.name),
            _ => tree.to_string(),
        }
    }

    /// Token returned for every overridable material tree
    pub fn material_override(&self) -> Option<&str> {
        self.material_override.as_deref()
    }

    /// Set the override token
    pub fn set_material_override(&mut self, token: Option<String>) {
        self.material_override = token;
    }

    /// Wrap a formatted literal in the animation envelope when enabled
    pub fn animated(&self, value: String) -> String {
        if self.settings.animation {
            interpolate(self.frame, &value)
        } else {
            value
        }
    }

    /// Format a literal and apply the animation envelope
    pub fn literal(&self, value: &PortValue) -> String {
        self.animated(format_value(value))
    }

    /// Write a record and return its instance name
    pub fn emit(&mut self, record: PluginRecord) -> Result<String, ExportError> {
        let name = record.name.clone();
        self.sink.write_record(record)?;
        if !self.cache.count_record(&name) {
            tracing::error!("Instance {} written more than once", name);
        }
        Ok(name)
    }

    /// Write raw text
    pub fn write_raw(&mut self, text: &str) -> Result<(), ExportError> {
        self.sink.write_raw(text)?;
        Ok(())
    }

    /// Hand a mesh to the geometry exporter
    pub fn export_mesh(&mut self, object: &str, mesh: &str, name: &str) -> Result<(), ExportError> {
        self.geometry.export_mesh(object, mesh, name, &mut *self.sink)
    }
}
