// SPDX-License-Identifier: MIT OR Apache-2.0
//! Material node trees and the default material.

use crate::context::{ExportContext, DEFAULT_BRDF, DEFAULT_MATERIAL};
use crate::error::ExportError;
use crate::format::format_value;
use crate::output::PluginRecord;
use crate::resolver::{resolve_input, Resolved};
use vrscene_graph::{NodeKind, NodeTree, PluginCategory, PortValue};

/// Write the fallback shading model and material once per pass
pub fn write_defaults(ctx: &mut ExportContext<'_>) -> Result<(), ExportError> {
    if ctx.cache().is_name_taken(DEFAULT_MATERIAL) {
        return Ok(());
    }

    let brdf = PluginRecord::new("BRDFDiffuse", DEFAULT_BRDF, PluginCategory::Brdf)
        .with_attr("color", format_value(&PortValue::Color([0.5, 0.5, 0.5])));
    ctx.emit(brdf)?;

    let material = PluginRecord::new("MtlSingleBRDF", DEFAULT_MATERIAL, PluginCategory::Material)
        .with_attr("brdf", DEFAULT_BRDF);
    ctx.emit(material)?;
    Ok(())
}

/// Compile a material tree and return the material token.
///
/// Falls back to the default material when the tree has no output node,
/// when its `Material` socket is not linked, when it produces nothing and
/// when it contains a cycle. The global override wins over every tree
/// whose output node allows it, before anything in the tree is resolved.
pub fn write_material_tree(ctx: &mut ExportContext<'_>, tree: &NodeTree) -> Result<String, ExportError> {
    let Some(output) = tree.material_output() else {
        tracing::error!("{}: output node not found", tree.name);
        return Ok(DEFAULT_MATERIAL.to_string());
    };

    let dont_override = matches!(output.kind, NodeKind::MaterialOutput { dont_override: true });
    if !dont_override {
        if let Some(token) = ctx.material_override() {
            return Ok(token.to_string());
        }
    }

    if !tree.is_linked(&output.name, "Material") {
        tracing::error!("{}: Material socket of {} is not connected", tree.name, output.name);
        return Ok(DEFAULT_MATERIAL.to_string());
    }

    match resolve_input(ctx, tree, output, "Material", true) {
        Ok(Some(Resolved::Reference(token))) => Ok(token),
        Ok(_) => {
            tracing::error!("{}: material output produced no material", tree.name);
            Ok(DEFAULT_MATERIAL.to_string())
        }
        Err(ExportError::Cycle { tree: name, node }) => {
            tracing::error!("{}: cycle through node {}, using the default material", name, node);
            Ok(DEFAULT_MATERIAL.to_string())
        }
        Err(err) => Err(err),
    }
}
