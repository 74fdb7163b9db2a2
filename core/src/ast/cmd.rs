//! The primary query structure — the analogue of `qail-core`'s `QailCmd`,
//! carrying the same "one struct, one action enum, fluent `self`-consuming
//! builder methods" shape, re-membered for this protocol's five actions
//! (select/update/delete/insert/exec) instead of SQL's.

use crate::ast::expr::{Expr, Join};
use crate::ast::operators::{Action, JoinKind};
use crate::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub action: Action,
    pub table: String,
    /// Select targets (action `Select`) or assignment right-hand sides
    /// (action `Update`), each optionally wrapped in [`Expr::Alias`].
    pub columns: Vec<Expr>,
    /// Conjunctive (AND-ed) filter predicates.
    pub filters: Vec<Expr>,
    pub group_by: Vec<Expr>,
    /// Sort keys, each wrapped in [`Expr::Asc`]/[`Expr::Desc`].
    pub sort: Vec<Expr>,
    pub limit: Option<i64>,
    /// Row count to drop from the front of the (sorted) result before
    /// `limit` takes effect.
    pub offset: Option<i64>,
    pub joins: Vec<Join>,
    /// `column -> new value` assignments for action `Update`.
    pub assignments: Vec<(String, Expr)>,
    /// `column -> literal` pairs for action `Insert`, single row.
    pub insert_values: Vec<(String, Value)>,
    /// Declared column order for a multi-row [`Query::rows`] insert.
    pub insert_columns: Vec<String>,
    /// Row-major values for a multi-row insert, each inner `Vec` one row in
    /// `insert_columns` order; transposed to column-major by the compiler.
    pub insert_rows: Vec<Vec<Value>>,
    /// A raw query-language expression, used only by action `Exec`; bypasses
    /// the compiler and is sent to the server verbatim.
    pub raw: Option<String>,
}

impl Query {
    fn blank(action: Action, table: impl Into<String>) -> Self {
        Query {
            action,
            table: table.into(),
            columns: vec![],
            filters: vec![],
            group_by: vec![],
            sort: vec![],
            limit: None,
            offset: None,
            joins: vec![],
            assignments: vec![],
            insert_values: vec![],
            insert_columns: vec![],
            insert_rows: vec![],
            raw: None,
        }
    }

    pub fn select(table: impl Into<String>) -> Self {
        Self::blank(Action::Select, table)
    }

    pub fn update(table: impl Into<String>) -> Self {
        Self::blank(Action::Update, table)
    }

    pub fn delete(table: impl Into<String>) -> Self {
        Self::blank(Action::Delete, table)
    }

    pub fn insert(table: impl Into<String>) -> Self {
        Self::blank(Action::Insert, table)
    }

    /// A raw query-language expression, sent to the server without passing
    /// through the compiler at all.
    pub fn exec(raw: impl Into<String>) -> Self {
        let mut q = Self::blank(Action::Exec, "");
        q.raw = Some(raw.into());
        q
    }

    pub fn select_all(mut self) -> Self {
        self.columns.push(Expr::Star);
        self
    }

    pub fn column(mut self, col: impl Into<Expr>) -> Self {
        self.columns.push(col.into());
        self
    }

    pub fn columns<I, E>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.columns.extend(cols.into_iter().map(Into::into));
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Add several predicates in one call. `Query::select(t).filters([p1,
    /// p2])` and `Query::select(t).filter(p1).filter(p2)` both append to the
    /// same conjunctive `filters` list and compile identically.
    pub fn filters<I>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        self.filters.extend(predicates);
        self
    }

    pub fn group_by<I, E>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.group_by.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn sort_asc(mut self, col: impl Into<String>) -> Self {
        self.sort.push(Expr::Column(col.into()).asc());
        self
    }

    pub fn sort_desc(mut self, col: impl Into<String>) -> Self {
        self.sort.push(Expr::Column(col.into()).desc());
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Drop the first `n` rows of the (sorted) result before `limit` is
    /// applied.
    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn as_of_join(self, table: impl Into<String>, on: Vec<String>) -> Self {
        self.join(Join::new(JoinKind::AsOf, table, on))
    }

    pub fn left_join(self, table: impl Into<String>, on: Vec<String>) -> Self {
        self.join(Join::new(JoinKind::Left, table, on))
    }

    pub fn inner_join(self, table: impl Into<String>, on: Vec<String>) -> Self {
        self.join(Join::new(JoinKind::Inner, table, on))
    }

    /// `aggregates` are `(func, right-side column)` pairs, rendered as
    /// `(f1;v1);(f2;v2);…` on the window join's right side.
    pub fn window_join(
        self,
        table: impl Into<String>,
        on: Vec<String>,
        low: Expr,
        high: Expr,
        aggregates: Vec<(crate::ast::operators::AggFunc, String)>,
    ) -> Self {
        let mut j = Join::new(JoinKind::Window, table, on);
        j.window = Some((Box::new(low), Box::new(high)));
        j.aggregates = aggregates;
        self.join(j)
    }

    /// Add a `column = expr` assignment (action `Update` only).
    pub fn set(mut self, column: impl Into<String>, value: Expr) -> Self {
        self.assignments.push((column.into(), value));
        self
    }

    /// Add a `column -> literal` value (action `Insert` only).
    pub fn value(mut self, column: impl Into<String>, value: Value) -> Self {
        self.insert_values.push((column.into(), value));
        self
    }

    pub fn values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.insert_values.extend(values);
        self
    }

    /// Insert `rows`, each a `columns`-ordered list of values — the batch
    /// form of `value`/`values` for N rows of a K-column model. The
    /// compiler transposes this to K per-column vectors in `columns` order.
    pub fn rows<I>(mut self, columns: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        self.insert_columns = columns;
        self.insert_rows.extend(rows);
        self
    }
}
