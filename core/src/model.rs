//! Declarative field-based models and the dynamic schema descriptors
//! produced by reflecting a live table through `meta`/`keys`.
//!
//! Grounded on `schema.rs`'s `Schema`/`TableDef`/`ColumnDef` builder trio
//! (`TableDef::new(...).pk(...).column(...)`) — kept as the same
//! "declarative struct with consuming builder methods" shape, re-membered
//! from a SQL validator's column list into this protocol's typed,
//! key-prefix-aware field list.
//!
//! `closest_field_name` reuses `strsim` the way `qail-core`'s column
//! resolver suggests near-miss identifiers; `to_json`/`from_json` let a
//! descriptor be cached to disk between CLI runs instead of re-reflecting.

use crate::error::ModelError;
use crate::value::{Kind, Table};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: Kind,
    /// Whether this field participates in the table's key prefix.
    pub key: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Field {
            name: name.into(),
            kind,
            key: false,
        }
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }
}

/// A table's column layout: names, kinds, and which columns form the key
/// prefix. Either declared by hand (`SchemaDescriptor::new(...).field(...)`)
/// or produced by reflecting a live table (`SchemaDescriptor::from_meta`).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SchemaDescriptor {
    pub table: String,
    pub fields: Vec<Field>,
}

impl SchemaDescriptor {
    pub fn new(table: impl Into<String>) -> Self {
        SchemaDescriptor {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, kind: Kind) -> Self {
        self.fields.push(Field::new(name, kind));
        self
    }

    pub fn key_field(mut self, name: impl Into<String>, kind: Kind) -> Self {
        self.fields.push(Field::new(name, kind).key());
        self
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.key)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The declared field name closest to `name` by Jaro-Winkler similarity,
    /// for "did you mean" diagnostics when a caller misspells a column.
    /// Returns `None` for an empty descriptor or a similarity below 0.7.
    pub fn closest_field_name(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), strsim::jaro_winkler(name, &f.name)))
            .filter(|(_, score)| *score >= 0.7)
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(n, _)| n)
    }

    /// Serialize this descriptor to JSON, for caching a reflected schema
    /// between CLI runs instead of re-reflecting against a live server.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a descriptor previously written by [`SchemaDescriptor::to_json`].
    pub fn from_json(data: &str) -> Result<SchemaDescriptor, ModelError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn is_keyed(&self) -> bool {
        self.fields.iter().any(|f| f.key)
    }

    /// Mark `names` as key columns, in-place — used after reflection's
    /// `keys` call reports which leading columns form the key.
    pub fn mark_keys(&mut self, names: &[String]) {
        for field in &mut self.fields {
            if names.iter().any(|n| n == &field.name) {
                field.key = true;
            }
        }
    }

    /// The DDL string that declares this table:
    /// `` tbl:([k1:`tc1$(); k2:`tc2$()] v1:`tv1$(); v2:`tv2$()) ``, with an
    /// empty key bracket for an unkeyed table.
    pub fn to_ddl(&self) -> String {
        let mut keys = String::new();
        for (i, f) in self.key_fields().enumerate() {
            if i > 0 {
                keys.push_str("; ");
            }
            keys.push_str(&format!("{}:`{}$()", f.name, f.kind.type_char()));
        }
        let mut values = String::new();
        for (i, f) in self.fields.iter().filter(|f| !f.key).enumerate() {
            if i > 0 {
                values.push_str("; ");
            }
            values.push_str(&format!("{}:`{}$()", f.name, f.kind.type_char()));
        }
        format!("{}:([{keys}] {values})", self.table)
    }

    /// Build a descriptor from the rows of a `meta` RPC response: a table
    /// keyed by column name with `c`/`t`/`f` columns (column, type char,
    /// foreign-key descriptor) — the server's own metadata convention.
    pub fn from_meta(table: impl Into<String>, meta_rows: &Table) -> Result<SchemaDescriptor, ModelError> {
        let table = table.into();
        let names = meta_rows.column("c").ok_or_else(|| ModelError::Reflection {
            table: table.clone(),
            reason: "meta response missing `c` (column name) column".into(),
        })?;
        let types = meta_rows.column("t").ok_or_else(|| ModelError::Reflection {
            table: table.clone(),
            reason: "meta response missing `t` (type char) column".into(),
        })?;

        let names = match names {
            crate::value::Vector::Symbol(xs) => xs,
            other => {
                return Err(ModelError::Reflection {
                    table: table.clone(),
                    reason: format!("expected `c` column to be symbol vector, got {:?}", other.kind()),
                })
            }
        };
        let types = match types {
            crate::value::Vector::Char(xs) => xs,
            other => {
                return Err(ModelError::Reflection {
                    table: table.clone(),
                    reason: format!("expected `t` column to be char vector, got {:?}", other.kind()),
                })
            }
        };

        let mut fields = Vec::with_capacity(names.len());
        for (name, type_char) in names.iter().zip(types.iter()) {
            let name = name.clone().unwrap_or_default();
            let c = type_char.map(|b| b as char).unwrap_or(' ');
            let kind = Kind::from_type_char(c).ok_or(ModelError::UnknownTypeChar(c))?;
            fields.push(Field::new(name, kind));
        }
        Ok(SchemaDescriptor { table, fields })
    }
}

/// Global, mutex-guarded table of reflected/declared schemas, keyed by
/// table name — shared by every session so a table reflected once doesn't
/// need re-reflecting on a second query against it.
pub struct Registry {
    inner: Mutex<HashMap<String, std::sync::Arc<SchemaDescriptor>>>,
}

impl Registry {
    fn new() -> Self {
        Registry {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::new)
    }

    pub fn register(&self, descriptor: SchemaDescriptor) {
        let mut guard = self.inner.lock().expect("registry mutex poisoned");
        guard.insert(descriptor.table.clone(), std::sync::Arc::new(descriptor));
    }

    pub fn get(&self, table: &str) -> Option<std::sync::Arc<SchemaDescriptor>> {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard.get(table).cloned()
    }

    pub fn contains(&self, table: &str) -> bool {
        let guard = self.inner.lock().expect("registry mutex poisoned");
        guard.contains_key(table)
    }

    pub fn require(&self, table: &str) -> Result<std::sync::Arc<SchemaDescriptor>, ModelError> {
        self.get(table).ok_or_else(|| ModelError::NotRegistered(table.to_string()))
    }
}
