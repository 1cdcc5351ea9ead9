// SPDX-License-Identifier: MIT OR Apache-2.0
//! Schema-driven plugin writer.

use crate::context::ExportContext;
use crate::error::ExportError;
use crate::format::{format_list, normalize_path, quote, ListKind};
use crate::output::PluginRecord;
use crate::resolver::Resolved;
use indexmap::IndexMap;
use std::path::Path;
use vrscene_graph::{ParamDesc, ParamSubtype, PluginDesc, PortValue};

/// Write one record of type `desc` named `name`.
///
/// `params` is the node's property bag and `overrides` holds the values of
/// its resolved sockets by attribute. Parameters are visited in name order:
/// - output parameters are never written
/// - skipped and list parameters need an override
/// - plugin and texture parameters need an override
/// - everything else takes the override, the bag value or the schema default
///
/// Object lists hold record tokens that are already written.
pub fn write_plugin(
    ctx: &mut ExportContext<'_>,
    desc: &PluginDesc,
    name: &str,
    params: &IndexMap<String, PortValue>,
    overrides: &IndexMap<String, Resolved>,
) -> Result<String, ExportError> {
    tracing::debug!("Generating plugin {} [{}]", name, desc.id);

    let mut record = PluginRecord::new(desc.id.as_str(), name, desc.category);

    for param in desc.sorted_params() {
        let attr = param.attr.as_str();
        let mapped = overrides.get(attr);

        if param.param_type.is_output() {
            continue;
        }
        if param.is_skipped() && mapped.is_none() {
            continue;
        }
        if param.param_type.is_externally_resolved() && mapped.is_none() {
            continue;
        }

        let value = match mapped {
            Some(resolved) => render_resolved(ctx, param, resolved),
            None => match params.get(attr).or(param.default.as_ref()) {
                Some(value) => render_literal(ctx, param, value),
                None => {
                    tracing::debug!("{}.{} has no value", name, attr);
                    continue;
                }
            },
        };

        if let Some(value) = value {
            record.push(attr, value);
        }
    }

    ctx.emit(record)
}

fn render_resolved(ctx: &ExportContext<'_>, param: &ParamDesc, value: &Resolved) -> Option<String> {
    match value {
        Resolved::Literal(literal) => render_literal(ctx, param, literal),
        Resolved::Reference(token) => {
            if token.is_empty() {
                return None;
            }
            Some(token.clone())
        }
        Resolved::Objects(objects) => {
            if objects.is_empty() {
                return None;
            }
            Some(format_list(ListKind::Plugin, objects))
        }
    }
}

fn render_literal(ctx: &ExportContext<'_>, param: &ParamDesc, value: &PortValue) -> Option<String> {
    match value {
        PortValue::String(text) | PortValue::Path(text) => {
            if text.is_empty() {
                return None;
            }
            if param.param_type.is_reference_like() {
                return Some(text.clone());
            }
            if param.is_path() || matches!(value, PortValue::Path(_)) {
                let settings = ctx.settings();
                let path = normalize_path(text, settings.base_dir.as_deref());
                let is_file = !matches!(param.subtype, Some(ParamSubtype::DirPath));
                if settings.check_paths && is_file && !Path::new(&path).exists() {
                    tracing::error!("File not found: {} ({})", path, param.attr);
                    return None;
                }
                return Some(quote(&path));
            }
            Some(quote(text))
        }
        _ => Some(ctx.literal(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CompileCache;
    use crate::context::ExternalGeometry;
    use crate::settings::ExportSettings;
    use vrscene_graph::{ParamType, PluginCatalog, PluginCategory, Scene};

    fn write(
        settings: &ExportSettings,
        desc: &PluginDesc,
        params: &IndexMap<String, PortValue>,
        overrides: &IndexMap<String, Resolved>,
    ) -> PluginRecord {
        let scene = Scene::new("Scene");
        let catalog = PluginCatalog::new();
        let mut cache = CompileCache::new();
        let mut sink: Vec<PluginRecord> = Vec::new();
        let mut geometry = ExternalGeometry;
        let mut ctx = ExportContext::new(settings, &scene, &catalog, &mut cache, &mut sink, &mut geometry);
        write_plugin(&mut ctx, desc, "Test", params, overrides).unwrap();
        sink.pop().unwrap()
    }

    fn desc() -> PluginDesc {
        PluginDesc::new("TexTest", PluginCategory::Texture, vec![
            ParamDesc::new("zoom", ParamType::Float),
            ParamDesc::new("amount", ParamType::Float).with_default(PortValue::Float(1.0)),
            ParamDesc::new("color_tex", ParamType::Texture),
            ParamDesc::new("out_color", ParamType::OutputTexture),
            ParamDesc::new("layers", ParamType::List),
            ParamDesc::new("hidden", ParamType::Int).skipped(),
            ParamDesc::new("uvwgen", ParamType::Uvwgen),
            ParamDesc::new("label", ParamType::String),
            ParamDesc::new("file", ParamType::String).with_subtype(ParamSubtype::FilePath),
        ])
    }

    #[test]
    fn test_sorted_and_filtered() {
        let mut params = IndexMap::new();
        params.insert("zoom".to_string(), PortValue::Float(2.0));
        params.insert("out_color".to_string(), PortValue::Color([1.0, 0.0, 0.0]));
        params.insert("hidden".to_string(), PortValue::Int(3));
        params.insert("color_tex".to_string(), PortValue::Color([0.0, 1.0, 0.0]));
        params.insert("label".to_string(), PortValue::String(String::new()));

        let record = write(&ExportSettings::default(), &desc(), &params, &IndexMap::new());
        let attrs: Vec<_> = record.attrs.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(attrs, ["amount", "zoom"]);
        assert_eq!(record.attr("amount"), Some("1.000000"));
        assert_eq!(record.attr("zoom"), Some("2.000000"));
    }

    #[test]
    fn test_output_never_written() {
        let mut overrides = IndexMap::new();
        overrides.insert("out_color".to_string(), Resolved::Reference("Other".into()));
        let mut params = IndexMap::new();
        params.insert("out_color".to_string(), PortValue::Color([1.0, 0.0, 0.0]));

        let record = write(&ExportSettings::default(), &desc(), &params, &overrides);
        assert!(record.attr("out_color").is_none());
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut overrides = IndexMap::new();
        overrides.insert("hidden".to_string(), Resolved::Literal(PortValue::Int(4)));
        overrides.insert("color_tex".to_string(), Resolved::Reference("NTtNchecker".into()));
        overrides.insert("zoom".to_string(), Resolved::Literal(PortValue::Float(0.25)));
        overrides.insert("uvwgen".to_string(), Resolved::Reference(String::new()));
        let mut params = IndexMap::new();
        params.insert("zoom".to_string(), PortValue::Float(2.0));

        let record = write(&ExportSettings::default(), &desc(), &params, &overrides);
        assert_eq!(record.attr("hidden"), Some("4"));
        assert_eq!(record.attr("color_tex"), Some("NTtNchecker"));
        assert_eq!(record.attr("zoom"), Some("0.250000"));
        assert!(record.attr("uvwgen").is_none());
    }

    #[test]
    fn test_object_list_override() {
        let mut overrides = IndexMap::new();
        overrides.insert("layers".to_string(), Resolved::Objects(vec!["OBCube".into(), "NTRigNNode_1".into()]));
        let record = write(&ExportSettings::default(), &desc(), &IndexMap::new(), &overrides);
        assert_eq!(record.attr("layers"), Some("List(OBCube,NTRigNNode_1)"));

        overrides.insert("layers".to_string(), Resolved::Objects(Vec::new()));
        let record = write(&ExportSettings::default(), &desc(), &IndexMap::new(), &overrides);
        assert!(record.attr("layers").is_none());
    }

    #[test]
    fn test_animated_literals() {
        let settings = ExportSettings {
            animation: true,
            frame_current: 5,
            ..ExportSettings::default()
        };
        let mut params = IndexMap::new();
        params.insert("label".to_string(), PortValue::String("wood".into()));

        let record = write(&settings, &desc(), &params, &IndexMap::new());
        assert_eq!(record.attr("amount"), Some("interpolate((5,1.000000))"));
        assert_eq!(record.attr("label"), Some("\"wood\""));
    }

    #[test]
    fn test_file_paths() {
        let settings = ExportSettings {
            base_dir: Some("/shots/a".into()),
            ..ExportSettings::default()
        };
        let mut params = IndexMap::new();
        params.insert("file".to_string(), PortValue::Path("//tex\\wood.png".into()));

        let record = write(&settings, &desc(), &params, &IndexMap::new());
        assert_eq!(record.attr("file"), Some("\"/shots/a/tex/wood.png\""));

        let strict = ExportSettings {
            check_paths: true,
            ..settings
        };
        let record = write(&strict, &desc(), &params, &IndexMap::new());
        assert!(record.attr("file").is_none());
    }
}
