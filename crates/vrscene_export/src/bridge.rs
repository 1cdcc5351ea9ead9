// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodes that read the scene instead of a property bag: object and group
//! selectors, and the geometry and material of the object being exported.
//!
//! Selectors compile the objects they pick, so the list they produce only
//! names records that are already written.

use crate::cache::ObjectState;
use crate::context::{ExportContext, DEFAULT_MATERIAL};
use crate::error::ExportError;
use crate::format::{format_list, geometry_plugin_name, multi_material_name, ListKind};
use crate::material::write_material_tree;
use crate::object::write_object;
use crate::output::PluginRecord;
use crate::resolver::Resolved;
use vrscene_graph::{Node, NodeTree, PluginCategory};

/// Records of the object picked by an object selector
pub fn select_object(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
    object: Option<&str>,
) -> Result<Resolved, ExportError> {
    let names = match object {
        Some(name) if ctx.scene().object(name).is_some() => vec![name.to_string()],
        Some(name) => {
            tracing::debug!("Selected object {} not in scene", name);
            Vec::new()
        }
        None => Vec::new(),
    };
    select(ctx, tree, node, &names)
}

/// Records of the objects picked by a group selector
pub fn select_group(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
    group: Option<&str>,
) -> Result<Resolved, ExportError> {
    let scene = ctx.scene();
    let names: &[String] = match group {
        Some(name) => match scene.group(name) {
            Some(group) => &group.objects,
            None => {
                tracing::debug!("Selected group {} not in scene", name);
                &[]
            }
        },
        None => &[],
    };
    select(ctx, tree, node, names)
}

/// Compile the selected objects ahead of the record that lists them.
///
/// Selecting an object whose own record is still being compiled is a cycle.
fn select(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
    names: &[String],
) -> Result<Resolved, ExportError> {
    let mut tokens = Vec::new();
    for name in names {
        if matches!(ctx.cache().object_state(name), Some(ObjectState::Resolving)) {
            return Err(ExportError::Cycle {
                tree: tree.name.clone(),
                node: node.name.clone(),
            });
        }
        match write_object(ctx, name)? {
            Some(token) => tokens.push(token),
            None => tracing::debug!("{}: {} selects {}, which has no record", tree.name, node.name, name),
        }
    }
    Ok(Resolved::Objects(tokens))
}

/// Geometry of the current object.
///
/// The mesh is handed to the geometry exporter the first time it is seen
/// in a pass when automatic mesh export is enabled.
pub fn write_geometry(ctx: &mut ExportContext<'_>) -> Result<Option<Resolved>, ExportError> {
    let Some(scope) = ctx.object().cloned() else {
        tracing::error!("Geometry output used outside an object");
        return Ok(None);
    };
    let Some(mesh) = scope.mesh.as_deref() else {
        tracing::warn!("Object {} has no mesh", scope.name);
        return Ok(None);
    };

    let name = geometry_plugin_name(mesh);
    if ctx.settings().auto_meshes && ctx.cache_mut().insert_mesh(&name) {
        ctx.cache_mut().reserve_name(&name);
        ctx.export_mesh(&scope.name, mesh, &name)?;
    }
    Ok(Some(Resolved::Reference(name)))
}

/// Material of the current object.
///
/// Slots holding a material with a node tree are compiled in slot order.
/// None of them gives the default material, one gives its token directly
/// and several are combined into a `MtlMulti` record written once per pass.
pub fn write_object_material(ctx: &mut ExportContext<'_>) -> Result<String, ExportError> {
    let scene = ctx.scene();
    let Some(name) = ctx.object().map(|scope| scope.name.clone()) else {
        tracing::error!("Material output used outside an object");
        return Ok(DEFAULT_MATERIAL.to_string());
    };
    let Some(object) = scene.object(&name) else {
        return Ok(DEFAULT_MATERIAL.to_string());
    };

    let key = multi_material_name(&name);
    if let Some(token) = ctx.cache().synthesized(&key) {
        return Ok(token.to_string());
    }

    let mut materials = Vec::new();
    for material in object.material_slots.iter().flatten() {
        let Some(tree) = scene.material_tree(material) else {
            tracing::debug!("Material {} of {} has no node tree", material, name);
            continue;
        };
        materials.push(write_material_tree(ctx, tree)?);
    }

    let token = match materials.as_slice() {
        [] => DEFAULT_MATERIAL.to_string(),
        [single] => single.clone(),
        _ => {
            let ids = (1..=materials.len()).map(|id| id.to_string());
            let record = PluginRecord::new("MtlMulti", ctx.cache_mut().claim_name(&key), PluginCategory::Material)
                .with_attr("mtls_list", format_list(ListKind::Plugin, &materials))
                .with_attr("ids_list", format_list(ListKind::Int, ids));
            ctx.emit(record)?
        }
    };

    ctx.cache_mut().insert_synthesized(&key, &token);
    Ok(token)
}
