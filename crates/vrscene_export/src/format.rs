// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value formatting and identifier rules of the vrscene text format.

use std::path::Path;
use vrscene_graph::PortValue;

/// List constructor flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `List(...)` of plugin references
    Plugin,
    /// `ListInt(...)`
    Int,
    /// `ListFloat(...)`
    Float,
}

impl ListKind {
    fn constructor(self) -> &'static str {
        match self {
            Self::Plugin => "List",
            Self::Int => "ListInt",
            Self::Float => "ListFloat",
        }
    }
}

/// Make a name valid as a plugin instance name.
///
/// `+` becomes `p`, `-` becomes `m` and anything else outside
/// `[A-Za-z0-9_]` becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '+' => 'p',
            '-' => 'm',
            c if c.is_ascii_alphanumeric() || c == '_' => c,
            _ => '_',
        })
        .collect()
}

/// Instance name of a tree node
pub fn node_plugin_name(tree: &str, node: &str) -> String {
    sanitize_name(&format!("NT{tree}N{node}"))
}

/// Instance name of a scene object
pub fn object_plugin_name(object: &str) -> String {
    sanitize_name(&format!("OB{object}"))
}

/// Instance name of an object's multi-material
pub fn multi_material_name(object: &str) -> String {
    sanitize_name(&format!("OBMA{object}"))
}

/// Instance name of a mesh
pub fn geometry_plugin_name(mesh: &str) -> String {
    sanitize_name(&format!("ME{mesh}"))
}

/// Fixed six-decimal float
pub fn format_float(value: f32) -> String {
    format!("{value:.6}")
}

/// Boolean as integer
pub fn format_bool(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// Quoted string
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn vector(v: &[f32; 3]) -> String {
    format!("Vector({},{},{})", format_float(v[0]), format_float(v[1]), format_float(v[2]))
}

/// Format a literal value
pub fn format_value(value: &PortValue) -> String {
    match value {
        PortValue::Bool(v) => format_bool(*v),
        PortValue::Int(v) | PortValue::Enum(v) => v.to_string(),
        PortValue::Float(v) => format_float(*v),
        PortValue::Color([r, g, b]) => {
            format!("Color({},{},{})", format_float(*r), format_float(*g), format_float(*b))
        }
        PortValue::AColor([r, g, b, a]) => format!(
            "AColor({},{},{},{})",
            format_float(*r),
            format_float(*g),
            format_float(*b),
            format_float(*a)
        ),
        PortValue::Vector(v) => vector(v),
        PortValue::Transform([x, y, z, offset]) => format!(
            "Transform(Matrix({},{},{}),{})",
            vector(x),
            vector(y),
            vector(z),
            vector(offset)
        ),
        PortValue::String(s) | PortValue::Path(s) => quote(s),
    }
}

/// Typed list constructor around already formatted items
pub fn format_list<I, S>(kind: ListKind, items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let items: Vec<S> = items.into_iter().collect();
    let joined = items.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(",");
    format!("{}({})", kind.constructor(), joined)
}

/// Time-keyed envelope around a formatted value
pub fn interpolate(frame: i32, value: &str) -> String {
    format!("interpolate(({frame},{value}))")
}

/// Canonical form of a file or directory path.
///
/// Backslashes become forward slashes and a leading `//` is resolved
/// against `base_dir` when one is given.
pub fn normalize_path(path: &str, base_dir: Option<&Path>) -> String {
    let unified = path.replace('\\', "/");
    match (unified.strip_prefix("//"), base_dir) {
        (Some(relative), Some(base)) => {
            let base = base.to_string_lossy().replace('\\', "/");
            format!("{}/{}", base.trim_end_matches('/'), relative)
        }
        _ => unified,
    }
}
