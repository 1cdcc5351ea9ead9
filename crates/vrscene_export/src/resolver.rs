// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph resolver.
//!
//! Walks a node tree depth-first from a requested socket, writing every
//! upstream record before the record that references it. Each node is
//! compiled at most once per pass; the cache marks nodes gray while their
//! inputs resolve so a link back into the current path is reported as a
//! cycle instead of recursing forever.

use crate::bridge;
use crate::cache::NodeState;
use crate::context::ExportContext;
use crate::error::ExportError;
use crate::format::node_plugin_name;
use crate::layered;
use crate::writer::write_plugin;
use indexmap::IndexMap;
use vrscene_graph::{Node, NodeKind, NodeTree, Port, PortValue};

/// Output attributes referenced by the bare instance name
pub const BARE_OUTPUTS: [&str; 2] = ["uvwgen", "bitmap"];

/// Value a socket or node compiles to
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Unlinked socket default
    Literal(PortValue),
    /// Reference token, optionally with an output selector
    Reference(String),
    /// Record tokens of the objects picked by a selector node
    Objects(Vec<String>),
}

impl Resolved {
    /// Consume into a reference token
    pub fn into_reference(self) -> Option<String> {
        match self {
            Self::Reference(token) => Some(token),
            _ => None,
        }
    }
}

/// Resolve an input socket of `node`.
///
/// Unlinked sockets yield their default literal when `allow_default` is set
/// and nothing otherwise. Linked sockets compile the upstream node and add
/// the output selector of the upstream socket.
pub fn resolve_socket(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
    socket: &Port,
    allow_default: bool,
) -> Result<Option<Resolved>, ExportError> {
    let Some(link) = tree.link_to(&node.name, &socket.name) else {
        if allow_default {
            return Ok(socket.default_value.clone().map(Resolved::Literal));
        }
        return Ok(None);
    };

    let Some(source) = tree.node(&link.from_node) else {
        tracing::error!(
            "{}: link into {}.{} starts at missing node {}",
            tree.name,
            node.name,
            socket.name,
            link.from_node
        );
        return Ok(None);
    };

    let attr = source
        .output(&link.from_port)
        .and_then(|output| output.attr.as_deref());

    let resolved = resolve_node(ctx, tree, source, allow_default)?;
    Ok(resolved.map(|value| select_output(value, source, attr)))
}

/// Compile a node and return the value it stands for.
///
/// Nothing is returned for nodes that produce no record; the reason is
/// logged. A node reached again while its own inputs are resolving fails
/// with [`ExportError::Cycle`].
pub fn resolve_node(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
    allow_default: bool,
) -> Result<Option<Resolved>, ExportError> {
    match &node.kind {
        NodeKind::Plugin { plugin, .. } => cached(ctx, tree, node, |ctx| {
            write_generic(ctx, tree, node, plugin, allow_default)
        }),
        NodeKind::Unset => {
            tracing::debug!("{}: node {} has no plugin", tree.name, node.name);
            Ok(None)
        }
        NodeKind::TexLayered => cached(ctx, tree, node, |ctx| layered::write_tex_layered(ctx, tree, node)),
        NodeKind::BrdfLayered { additive_mode } => cached(ctx, tree, node, |ctx| {
            layered::write_brdf_layered(ctx, tree, node, *additive_mode)
        }),
        NodeKind::SelectObject { object } => bridge::select_object(ctx, tree, node, object.as_deref()).map(Some),
        NodeKind::SelectGroup { group } => bridge::select_group(ctx, tree, node, group.as_deref()).map(Some),
        NodeKind::OutputGeometry => bridge::write_geometry(ctx),
        NodeKind::OutputMaterial => bridge::write_object_material(ctx).map(|token| Some(Resolved::Reference(token))),
        NodeKind::MaterialOutput { .. } => resolve_input(ctx, tree, node, "Material", allow_default),
        NodeKind::ObjectOutput => resolve_input(ctx, tree, node, "Object", allow_default),
    }
}

/// Resolve the input socket `name` of `node`, logging when it does not exist
pub(crate) fn resolve_input(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
    name: &str,
    allow_default: bool,
) -> Result<Option<Resolved>, ExportError> {
    let Some(socket) = node.input(name) else {
        tracing::error!("{}: node {} has no {} socket", tree.name, node.name, name);
        return Ok(None);
    };
    resolve_socket(ctx, tree, node, socket, allow_default)
}

/// Run `build` once per (tree, node) and pass; later calls get the cached value.
///
/// An object's own tree is keyed per object, see [`ExportContext::tree_key`].
pub(crate) fn cached<'a, F>(
    ctx: &mut ExportContext<'a>,
    tree: &NodeTree,
    node: &Node,
    build: F,
) -> Result<Option<Resolved>, ExportError>
where
    F: FnOnce(&mut ExportContext<'a>) -> Result<Option<Resolved>, ExportError>,
{
    let key = ctx.tree_key(&tree.name);
    match ctx.cache().state(&key, &node.name) {
        Some(NodeState::Done(value)) => return Ok(Some(value.clone())),
        Some(NodeState::Resolving) => {
            return Err(ExportError::Cycle {
                tree: tree.name.clone(),
                node: node.name.clone(),
            })
        }
        None => {}
    }

    tracing::debug!("{}: {} [{}]", tree.name, node.name, node.kind.label());
    ctx.cache_mut().begin(&key, &node.name);
    match build(ctx) {
        Ok(Some(value)) => {
            ctx.cache_mut().finish(&key, &node.name, value.clone());
            Ok(Some(value))
        }
        other => {
            ctx.cache_mut().abandon(&key, &node.name);
            other
        }
    }
}

fn write_generic(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
    plugin: &str,
    allow_default: bool,
) -> Result<Option<Resolved>, ExportError> {
    let Some(desc) = ctx.catalog().get(plugin) else {
        tracing::error!("{}: node {} uses unknown plugin {}", tree.name, node.name, plugin);
        return Ok(None);
    };

    let mut overrides = IndexMap::new();
    for socket in &node.inputs {
        let Some(attr) = &socket.attr else { continue };
        if let Some(value) = resolve_socket(ctx, tree, node, socket, allow_default)? {
            overrides.insert(attr.clone(), value);
        }
    }

    let name = ctx.cache_mut().claim_name(&node_plugin_name(&tree.name, &node.name));
    let token = write_plugin(ctx, desc, &name, &node.params, &overrides)?;
    Ok(Some(Resolved::Reference(token)))
}

fn select_output(value: Resolved, source: &Node, attr: Option<&str>) -> Resolved {
    let Resolved::Reference(token) = value else {
        return value;
    };
    let Some(attr) = attr.filter(|attr| !BARE_OUTPUTS.contains(attr)) else {
        return Resolved::Reference(token);
    };

    let fluid = matches!(&source.kind, NodeKind::Plugin { plugin, .. } if plugin == "TexMayaFluid");
    let selector = match (fluid, attr) {
        (true, "out_flame") => "@Flame".to_string(),
        (true, "out_density") => "@Density".to_string(),
        (true, "out_fuel") => "@Fuel".to_string(),
        _ => format!("::{attr}"),
    };
    Resolved::Reference(format!("{token}{selector}"))
}
