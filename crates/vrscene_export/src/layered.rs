// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layered texture and shading-model nodes.
//!
//! Both nodes take a variable number of inputs and are written as a single
//! record holding lists of references, so they bypass the schema-driven
//! writer.

use crate::context::ExportContext;
use crate::error::ExportError;
use crate::format::{format_float, format_list, node_plugin_name, sanitize_name, ListKind};
use crate::output::PluginRecord;
use crate::resolver::{resolve_node, resolve_socket, Resolved};
use vrscene_graph::{Node, NodeTree, Port, PluginCategory, PortValue};

/// Weight used when a layer socket carries no scalar value
const DEFAULT_WEIGHT: f32 = 1.0;

fn socket_weight(socket: Option<&Port>) -> f32 {
    socket
        .and_then(|s| s.default_value.as_ref())
        .and_then(PortValue::as_f32)
        .unwrap_or(DEFAULT_WEIGHT)
}

/// Write a `TexLayered` record from the linked inputs of `node`.
///
/// The record lists the layers bottom-up, so textures and weights are both
/// written in reverse input order.
pub fn write_tex_layered(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
) -> Result<Option<Resolved>, ExportError> {
    let mut textures = Vec::new();
    let mut weights = Vec::new();

    for socket in &node.inputs {
        if !tree.is_linked(&node.name, &socket.name) {
            continue;
        }
        let Some(token) = resolve_socket(ctx, tree, node, socket, true)?.and_then(Resolved::into_reference) else {
            tracing::warn!("{}: layer {} of {} produced no texture", tree.name, socket.name, node.name);
            continue;
        };
        textures.push(token);
        weights.push(format_float(socket_weight(Some(socket))));
    }

    if textures.is_empty() {
        tracing::warn!("{}: layered texture {} has no linked layers", tree.name, node.name);
        return Ok(None);
    }

    let name = ctx.cache_mut().claim_name(&node_plugin_name(&tree.name, &node.name));
    let weights = ctx.animated(format_list(ListKind::Float, weights.iter().rev()));
    let record = PluginRecord::new("TexLayered", name, PluginCategory::Texture)
        .with_attr("textures", format_list(ListKind::Plugin, textures.iter().rev()))
        .with_attr("weights", weights);

    ctx.emit(record).map(|token| Some(Resolved::Reference(token)))
}

/// Write a `BRDFLayered` record from the `BRDF N` / `Weight N` socket pairs.
///
/// Layers without a linked shading model are dropped. A linked weight is
/// compiled without socket defaults; an unlinked one becomes a constant
/// `TexAColor` record.
pub fn write_brdf_layered(
    ctx: &mut ExportContext<'_>,
    tree: &NodeTree,
    node: &Node,
    additive_mode: bool,
) -> Result<Option<Resolved>, ExportError> {
    let base = node_plugin_name(&tree.name, &node.name);
    let mut brdfs = Vec::new();
    let mut weights = Vec::new();

    for layer in 1..=node.inputs.len() / 2 {
        let brdf_socket = format!("BRDF {layer}");
        let weight_socket = format!("Weight {layer}");

        let Some(socket) = node.input(&brdf_socket) else { continue };
        if !tree.is_linked(&node.name, &socket.name) {
            continue;
        }
        let Some(brdf) = resolve_socket(ctx, tree, node, socket, true)?.and_then(Resolved::into_reference) else {
            tracing::warn!("{}: {} of {} produced no shading model", tree.name, brdf_socket, node.name);
            continue;
        };

        let linked = match tree.linked_source(&node.name, &weight_socket) {
            Some((source, _)) => resolve_node(ctx, tree, source, false)?.and_then(Resolved::into_reference),
            None => None,
        };
        let weight = match linked {
            Some(token) => token,
            None => {
                let value = socket_weight(node.input(&weight_socket));
                write_weight(ctx, &base, &brdf, layer, value)?
            }
        };

        brdfs.push(brdf);
        weights.push(weight);
    }

    if brdfs.is_empty() {
        tracing::warn!("{}: layered BRDF {} has no linked layers", tree.name, node.name);
        return Ok(None);
    }

    let name = ctx.cache_mut().claim_name(&base);
    let record = PluginRecord::new("BRDFLayered", name, PluginCategory::Brdf)
        .with_attr("brdfs", format_list(ListKind::Plugin, &brdfs))
        .with_attr("weights", format_list(ListKind::Plugin, &weights))
        .with_attr("additive_mode", ctx.literal(&PortValue::Bool(additive_mode)));

    ctx.emit(record).map(|token| Some(Resolved::Reference(token)))
}

fn write_weight(
    ctx: &mut ExportContext<'_>,
    base: &str,
    brdf: &str,
    layer: usize,
    value: f32,
) -> Result<String, ExportError> {
    let name = ctx.cache_mut().claim_name(&sanitize_name(&format!("{base}W{brdf}I{layer}")));
    let texture = ctx.literal(&PortValue::AColor([value, value, value, 1.0]));
    let record = PluginRecord::new("TexAColor", name, PluginCategory::Texture).with_attr("texture", texture);
    ctx.emit(record)
}
