// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene objects.
//!
//! An object compiles to the record its node tree produces, or to a default
//! `Node` record when it has no tree. Objects are compiled on first use:
//! either by the pass driver or by a selector that lists them. Each object
//! is written at most once per pass and its own tree is cached per object,
//! so objects sharing a tree each get their own records.

use crate::bridge::{write_geometry, write_object_material};
use crate::cache::ObjectState;
use crate::context::{ExportContext, ObjectScope};
use crate::error::ExportError;
use crate::format::object_plugin_name;
use crate::resolver::{resolve_input, Resolved};
use crate::writer::write_plugin;
use indexmap::IndexMap;
use vrscene_graph::{NodeTree, PortValue, SceneObject};

/// Write the record of scene object `name` and return its token.
///
/// Hidden, unknown and meshless objects produce nothing. The current object
/// scope is restored afterwards, so this may run while another object's
/// tree is being compiled.
pub fn write_object(ctx: &mut ExportContext<'_>, name: &str) -> Result<Option<String>, ExportError> {
    match ctx.cache().object_state(name) {
        Some(ObjectState::Done(token)) => return Ok(token.clone()),
        Some(ObjectState::Resolving) => {
            tracing::warn!("Object {} reached while its record is being written", name);
            return Ok(None);
        }
        None => {}
    }

    let scene = ctx.scene();
    let Some(object) = scene.object(name) else {
        tracing::debug!("Object {} not in scene", name);
        return Ok(None);
    };
    if !object.visible {
        tracing::debug!("Skipping hidden object {}", name);
        ctx.cache_mut().finish_object(name, None);
        return Ok(None);
    }

    ctx.cache_mut().begin_object(name);
    let previous = ctx.replace_object(Some(ObjectScope {
        name: name.to_string(),
        mesh: object.mesh.clone(),
        tree: object.node_tree.clone(),
    }));
    let result = match object.node_tree.as_deref() {
        Some(tree_name) => match scene.tree(tree_name) {
            Some(tree) => write_object_tree(ctx, tree),
            None => {
                tracing::error!("Object {}: node tree {} not found", name, tree_name);
                Ok(None)
            }
        },
        None => write_object_node(ctx, name, object),
    };
    ctx.replace_object(previous);

    match result {
        Ok(token) => {
            ctx.cache_mut().finish_object(name, token.clone());
            Ok(token)
        }
        Err(err) => {
            ctx.cache_mut().abandon_object(name);
            Err(err)
        }
    }
}

fn write_object_tree(ctx: &mut ExportContext<'_>, tree: &NodeTree) -> Result<Option<String>, ExportError> {
    let Some(output) = tree.object_output() else {
        tracing::error!("{}: object output node not found", tree.name);
        return Ok(None);
    };

    match resolve_input(ctx, tree, output, "Object", true) {
        Ok(value) => Ok(value.and_then(Resolved::into_reference)),
        Err(ExportError::Cycle { tree, node }) => {
            tracing::error!("{}: cycle through node {}, object skipped", tree, node);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn write_object_node(
    ctx: &mut ExportContext<'_>,
    name: &str,
    object: &SceneObject,
) -> Result<Option<String>, ExportError> {
    let Some(desc) = ctx.catalog().get("Node") else {
        tracing::error!("Plugin type Node missing from the catalog");
        return Ok(None);
    };
    let Some(geometry) = write_geometry(ctx)? else {
        return Ok(None);
    };
    let material = write_object_material(ctx)?;

    let mut overrides = IndexMap::new();
    overrides.insert("geometry".to_string(), geometry);
    overrides.insert("material".to_string(), Resolved::Reference(material));
    overrides.insert(
        "transform".to_string(),
        Resolved::Literal(PortValue::Transform(object.transform)),
    );

    let plugin_name = ctx.cache_mut().claim_name(&object_plugin_name(name));
    write_plugin(ctx, desc, &plugin_name, &IndexMap::new(), &overrides).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CompileCache;
    use crate::context::ExternalGeometry;
    use crate::output::PluginRecord;
    use crate::settings::ExportSettings;
    use vrscene_graph::{Node, NodeKind, PluginCatalog, PluginCategory, Port, PortType, Scene};

    fn object_tree(name: &str) -> NodeTree {
        let mut tree = NodeTree::new(name);
        tree.add_node(
            Node::new("Geometry", NodeKind::OutputGeometry).with_output(Port::output("Geometry", PortType::Geometry)),
        );
        tree.add_node(
            Node::new("Node", NodeKind::plugin(PluginCategory::Object, "Node"))
                .with_input(Port::input("Geometry", PortType::Geometry).with_attr("geometry"))
                .with_output(Port::output("Node", PortType::Plugin)),
        );
        tree.add_node(Node::new("Output", NodeKind::ObjectOutput).with_input(Port::input("Object", PortType::Plugin)));
        tree.connect("Geometry", "Geometry", "Node", "Geometry").unwrap();
        tree.connect("Node", "Node", "Output", "Object").unwrap();
        tree
    }

    fn build_scene() -> Scene {
        let mut scene = Scene::new("Scene");
        scene.add_tree(object_tree("Rig"));
        scene.add_object("Cube", SceneObject::with_mesh("CubeMesh"));
        let mut hidden = SceneObject::with_mesh("CubeMesh");
        hidden.visible = false;
        scene.add_object("Hidden", hidden);
        for name in ["Left", "Right"] {
            let mut object = SceneObject::with_mesh(format!("{name}Mesh"));
            object.node_tree = Some("Rig".to_string());
            scene.add_object(name, object);
        }
        scene
    }

    fn with_ctx<T>(scene: &Scene, f: impl FnOnce(&mut ExportContext<'_>) -> T) -> (T, Vec<PluginRecord>) {
        let settings = ExportSettings::default();
        let catalog = PluginCatalog::builtin();
        let mut cache = CompileCache::new();
        let mut sink: Vec<PluginRecord> = Vec::new();
        let mut geometry = ExternalGeometry;
        let mut ctx = ExportContext::new(&settings, scene, &catalog, &mut cache, &mut sink, &mut geometry);
        let result = f(&mut ctx);
        drop(ctx);
        (result, sink)
    }

    #[test]
    fn test_object_written_once() {
        let scene = build_scene();
        let ((first, again), records) = with_ctx(&scene, |ctx| {
            (write_object(ctx, "Cube").unwrap(), write_object(ctx, "Cube").unwrap())
        });
        assert_eq!(first.as_deref(), Some("OBCube"));
        assert_eq!(again, first);
        assert_eq!(records.iter().filter(|r| r.plugin == "Node").count(), 1);
    }

    #[test]
    fn test_hidden_and_unknown_objects() {
        let scene = build_scene();
        let ((hidden, ghost), records) = with_ctx(&scene, |ctx| {
            (write_object(ctx, "Hidden").unwrap(), write_object(ctx, "Ghost").unwrap())
        });
        assert!(hidden.is_none());
        assert!(ghost.is_none());
        assert!(records.is_empty());
    }

    #[test]
    fn test_shared_tree_per_object() {
        let scene = build_scene();
        let ((left, right), records) = with_ctx(&scene, |ctx| {
            (write_object(ctx, "Left").unwrap(), write_object(ctx, "Right").unwrap())
        });
        assert_eq!(left.as_deref(), Some("NTRigNNode"));
        assert_eq!(right.as_deref(), Some("NTRigNNode_1"));
        assert_eq!(records[0].attr("geometry"), Some("MELeftMesh"));
        assert_eq!(records[1].attr("geometry"), Some("MERightMesh"));
    }

    #[test]
    fn test_scope_restored() {
        let scene = build_scene();
        let (scope, _) = with_ctx(&scene, |ctx| {
            ctx.replace_object(Some(ObjectScope {
                name: "Left".to_string(),
                mesh: Some("LeftMesh".to_string()),
                tree: Some("Rig".to_string()),
            }));
            write_object(ctx, "Cube").unwrap();
            ctx.object().map(|scope| scope.name.clone())
        });
        assert_eq!(scope.as_deref(), Some("Left"));
    }
}
