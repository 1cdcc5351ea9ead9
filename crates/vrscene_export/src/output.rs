// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plugin records and the sinks they are written to.

use std::fmt;
use std::io::Write;
use vrscene_graph::PluginCategory;

/// One compiled plugin instance
#[derive(Debug, Clone, PartialEq)]
pub struct PluginRecord {
    /// Plugin type name
    pub plugin: String,
    /// Unique instance name
    pub name: String,
    /// Record family
    pub category: PluginCategory,
    /// Attribute assignments in write order
    pub attrs: Vec<(String, String)>,
}

impl PluginRecord {
    /// Create a record without attributes
    pub fn new(plugin: impl Into<String>, name: impl Into<String>, category: PluginCategory) -> Self {
        Self {
            plugin: plugin.into(),
            name: name.into(),
            category,
            attrs: Vec::new(),
        }
    }

    /// Append an attribute
    pub fn with_attr(mut self, attr: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(attr, value);
        self
    }

    /// Append an attribute in place
    pub fn push(&mut self, attr: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((attr.into(), value.into()));
    }

    /// Serialized value of an attribute
    pub fn attr(&self, attr: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == attr)
            .map(|(_, value)| value.as_str())
    }

    /// Instance names referenced by the attribute values
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.attrs.iter().flat_map(|(_, value)| value_references(value))
    }
}

/// Identifiers in a formatted value that name other records.
///
/// Constructors such as `List(` or `interpolate(`, quoted strings, numbers
/// and output selectors (`::out_color`, `@Flame`) are not references.
fn value_references(value: &str) -> Vec<&str> {
    let bytes = value.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let skip_ident = |mut i: usize| {
        while i < bytes.len() && is_ident(bytes[i]) {
            i += 1;
        }
        i
    };

    let mut refs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i += 1;
            }
            b if b.is_ascii_digit() => i = skip_ident(i),
            b if is_ident(b) => {
                let start = i;
                i = skip_ident(i);
                let word = &value[start..i];
                if bytes.get(i) == Some(&b'(') {
                    continue;
                }
                if value[i..].starts_with("::") {
                    i = skip_ident(i + 2);
                } else if bytes.get(i) == Some(&b'@') {
                    i = skip_ident(i + 1);
                }
                refs.push(word);
            }
            _ => i += 1,
        }
    }
    refs
}

impl fmt::Display for PluginRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{} {} {{", self.plugin, self.name)?;
        for (attr, value) in &self.attrs {
            write!(f, "\n\t{attr}={value};")?;
        }
        writeln!(f, "\n}}")
    }
}

/// Ordered, append-only destination of compiled records
pub trait RecordSink {
    /// Append a complete record
    fn write_record(&mut self, record: PluginRecord) -> std::io::Result<()>;

    /// Append raw text such as comments
    fn write_raw(&mut self, text: &str) -> std::io::Result<()>;
}

/// Collects records in memory; raw text is dropped
impl RecordSink for Vec<PluginRecord> {
    fn write_record(&mut self, record: PluginRecord) -> std::io::Result<()> {
        self.push(record);
        Ok(())
    }

    fn write_raw(&mut self, _text: &str) -> std::io::Result<()> {
        Ok(())
    }
}

/// Writes records as vrscene text
pub struct VrsceneWriter<W: Write> {
    out: W,
    records: usize,
}

impl<W: Write> VrsceneWriter<W> {
    /// Wrap a writer
    pub fn new(out: W) -> Self {
        Self { out, records: 0 }
    }

    /// Number of records written so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush and return the inner writer
    pub fn into_inner(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> RecordSink for VrsceneWriter<W> {
    fn write_record(&mut self, record: PluginRecord) -> std::io::Result<()> {
        write!(self.out, "{record}")?;
        self.records += 1;
        Ok(())
    }

    fn write_raw(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_text() {
        let record = PluginRecord::new("MtlSingleBRDF", "Material_no_material", PluginCategory::Material)
            .with_attr("brdf", "BRDFDiffuse_no_material");

        assert_eq!(
            record.to_string(),
            "\nMtlSingleBRDF Material_no_material {\n\tbrdf=BRDFDiffuse_no_material;\n}\n"
        );
    }

    #[test]
    fn test_record_references() {
        let record = PluginRecord::new("BRDFLayered", "L", PluginCategory::Brdf)
            .with_attr("brdfs", "List(NTtNa,NTtNb::out_color)")
            .with_attr("weights", "interpolate((1,ListFloat(0.500000,1.000000)))")
            .with_attr("texture", "NTtNfluid@Flame")
            .with_attr("file", "\"tex/wood \\\"old\\\".png\"")
            .with_attr("transform", "Transform(Matrix(Vector(1.000000,0.000000,0.000000)),Vector(0,0,0))");

        let refs: Vec<_> = record.references().collect();
        assert_eq!(refs, ["NTtNa", "NTtNb", "NTtNfluid"]);
    }

    #[test]
    fn test_writer_counts_records() {
        let mut writer = VrsceneWriter::new(Vec::new());
        writer.write_raw("// header\n").unwrap();
        writer
            .write_record(PluginRecord::new("TexChecker", "Checker", PluginCategory::Texture))
            .unwrap();
        assert_eq!(writer.records(), 1);

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "// header\n\nTexChecker Checker {\n}\n");
    }
}
