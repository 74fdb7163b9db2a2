//! Column-oriented result sets and row views produced by decoding a
//! session response, plus the small pieces shared between the blocking and
//! async session implementations.
//!
//! Grounded on `qail-pg/src/driver/mod.rs`'s `PgRow` (a decoded response
//! row wrapping raw column bytes) for the "driver hands back a lightweight
//! row type, not the raw wire value" shape — generalized from
//! `Vec<Option<Vec<u8>>>` to column-major typed vectors plus a bound
//! [`SchemaDescriptor`] for name-based field access.

pub mod async_session;
pub mod sync_session;

pub use async_session::AsyncSession;
pub use sync_session::SyncSession;

use std::sync::Arc;
use vexdb_core::model::SchemaDescriptor;
use vexdb_core::value::{Table, Value};

/// Build the call-form request frame: `(func-symbol; arg1; arg2; …)`.
pub fn call_frame(func: &str, args: &[Value]) -> Value {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Value::symbol(func));
    items.extend(args.iter().cloned());
    Value::Mixed(items)
}

/// A decoded table response, optionally bound to a declared or reflected
/// model for named field access on its rows.
#[derive(Debug, Clone)]
pub struct ResultSet {
    table: Table,
    model: Option<Arc<SchemaDescriptor>>,
}

impl ResultSet {
    pub fn new(table: Table, model: Option<Arc<SchemaDescriptor>>) -> Self {
        ResultSet { table, model }
    }

    /// Bind a transient model synthesized purely from the table's own
    /// column names — used for `raw`/anonymous results with no declared or
    /// reflected schema.
    pub fn anonymous(table: Table) -> Self {
        let mut descriptor = SchemaDescriptor::new("");
        for name in table.column_names() {
            // Kind is cosmetic here; row access goes through the table's
            // actual vectors, not the descriptor's declared kind.
            descriptor = descriptor.field(name.to_string(), vexdb_core::value::Kind::Long);
        }
        ResultSet {
            table,
            model: Some(Arc::new(descriptor)),
        }
    }

    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.table.column_names()
    }

    pub fn column(&self, name: &str) -> Option<&vexdb_core::value::Vector> {
        self.table.column(name)
    }

    pub fn get(&self, index: usize) -> Option<RowView<'_>> {
        if index >= self.len() {
            return None;
        }
        Some(RowView {
            table: &self.table,
            index,
            model: self.model.as_deref(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.len()).map(move |i| RowView {
            table: &self.table,
            index: i,
            model: self.model.as_deref(),
        })
    }
}

/// A lightweight projection of one row of a [`ResultSet`], reading straight
/// through to the owning table's column-major storage — no per-row
/// allocation beyond the materialized cell value.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    index: usize,
    model: Option<&'a SchemaDescriptor>,
}

impl<'a> RowView<'a> {
    pub fn get(&self, column: &str) -> Option<Value> {
        self.table.column(column)?.get_value(self.index)
    }

    /// Field access by the bound model's declared order, for positional
    /// construction of a model instance.
    pub fn field(&self, index: usize) -> Option<Value> {
        let name = &self.model?.fields.get(index)?.name;
        self.get(name)
    }

    pub fn index(&self) -> usize {
        self.index
    }
}
