//! Turns a live table's reflected schema into a generated Rust model file.
//!
//! Grounded on `introspection.rs`'s `inspect_postgres`/`inspect_mysql`
//! shape (connect, pull column metadata, map server types to a small type
//! vocabulary, write one artifact per run) — replayed here against
//! `meta`/`keys` reflection instead of `information_schema`, and against a
//! generated `.rs` struct instead of a serialized `Schema` JSON blob, since
//! this CLI's output is Rust source a caller compiles against, not a
//! schema file a second tool re-reads.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use vexdb_core::model::SchemaDescriptor;
use vexdb_core::value::Kind;
use vexdb_net::SyncSession;

fn rust_type(kind: Kind) -> &'static str {
    match kind {
        Kind::Boolean => "bool",
        Kind::Guid => "[u8; 16]",
        Kind::Byte => "u8",
        Kind::Short => "i16",
        Kind::Int => "i32",
        Kind::Long => "i64",
        Kind::Real => "f32",
        Kind::Float => "f64",
        Kind::Char => "u8",
        Kind::Symbol => "String",
        Kind::Timestamp => "i64",
        Kind::Month => "i32",
        Kind::Date => "i32",
        Kind::Datetime => "f64",
        Kind::Timespan => "i64",
        Kind::Minute => "i32",
        Kind::Second => "i32",
        Kind::Time => "i32",
    }
}

fn is_null_capable(kind: Kind) -> bool {
    !matches!(kind, Kind::Boolean | Kind::Byte)
}

fn to_pascal_case(table: &str) -> String {
    table
        .split(|c: char| c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Render a model struct for `descriptor`, matching the field declaration
/// order reflection returned them in.
pub fn render_model(descriptor: &SchemaDescriptor) -> String {
    let struct_name = to_pascal_case(&descriptor.table);
    let mut out = String::new();
    let _ = writeln!(out, "/// Generated from reflection of table `{}`.", descriptor.table);
    let _ = writeln!(out, "#[derive(Debug, Clone, PartialEq)]");
    let _ = writeln!(out, "pub struct {struct_name} {{");
    for field in &descriptor.fields {
        let base = rust_type(field.kind);
        let ty = if is_null_capable(field.kind) {
            format!("Option<{base}>")
        } else {
            base.to_string()
        };
        if field.key {
            let _ = writeln!(out, "    /// Key column.");
        }
        let _ = writeln!(out, "    pub {}: {ty},", field.name);
    }
    let _ = writeln!(out, "}}");
    out
}

/// Connect, reflect `tables` (or every table the server reports when
/// `tables` is empty), and write one generated `.rs` file per table into
/// `output_dir`. Returns the number of files written.
pub fn generate(session: &mut SyncSession, tables: &[String], output_dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(output_dir).with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let names = if tables.is_empty() {
        session.tables().map_err(|e| anyhow::anyhow!("listing tables: {e}"))?
    } else {
        tables.to_vec()
    };

    let mut written = 0;
    for name in &names {
        let descriptor = session.reflect(name).map_err(|e| anyhow::anyhow!("reflecting `{name}`: {e}"))?;
        let source = render_model(&descriptor);
        let path = output_dir.join(format!("{name}.rs"));
        std::fs::write(&path, source).with_context(|| format!("writing {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_expected_struct_shape() {
        let descriptor = SchemaDescriptor::new("trade")
            .key_field("sym", Kind::Symbol)
            .field("price", Kind::Float)
            .field("size", Kind::Long);
        let rendered = render_model(&descriptor);
        assert!(rendered.contains("pub struct Trade {"));
        assert!(rendered.contains("pub sym: Option<String>,"));
        assert!(rendered.contains("pub price: Option<f64>,"));
    }

    #[test]
    fn pascal_cases_snake_and_kebab_table_names() {
        assert_eq!(to_pascal_case("order_book"), "OrderBook");
        assert_eq!(to_pascal_case("order-book"), "OrderBook");
    }
}
