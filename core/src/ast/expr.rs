//! The expression tree: anything that can appear as a select target, a
//! filter operand, a sort key, or a group-by key.
//!
//! Grounded on `qail-core/src/ast/columns.rs`'s `Column` enum (one variant
//! per column shape, plus a hand-written `Display`) and `cmd.rs`'s use of
//! `Expr::Named`/`Expr::Star`/`Expr::Aggregate` as condition operands —
//! generalized from SQL column shapes into the target language's column,
//! adverb, and aggregate forms.

use crate::ast::operators::{AggFunc, BinOp, JoinKind, UnaryOp};
use crate::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// All columns.
    Star,
    /// A bare column reference.
    Column(String),
    /// A literal typed value.
    Literal(Value),
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    /// A free-standing function call (`func[arg1;arg2;...]`).
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Aggregate {
        func: AggFunc,
        expr: Box<Expr>,
    },
    /// `(n xbar c)` — bucket `expr` into `width`-wide bins, the canonical
    /// time-bucketing adverb.
    Xbar {
        width: Box<Expr>,
        expr: Box<Expr>,
    },
    /// `((f;c) fby g)` — aggregate `expr` by `keys` without collapsing the
    /// row count, unlike a `group_by` select.
    Fby {
        func: AggFunc,
        expr: Box<Expr>,
        keys: Vec<Expr>,
    },
    /// `expr'` — apply element-wise (`each`).
    Each(Box<Expr>),
    /// `expr':` multi-threaded map over each (`peach`).
    Peach(Box<Expr>),
    /// `(c within (lo;hi))` range membership.
    Within {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    /// `(c like "p")`.
    Like {
        expr: Box<Expr>,
        pattern: String,
    },
    /// `(c in (vec…))` membership test.
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
    },
    Asc(Box<Expr>),
    Desc(Box<Expr>),
    Alias {
        expr: Box<Expr>,
        alias: String,
    },
}

impl Expr {
    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: name.into(),
        }
    }

    pub fn asc(self) -> Expr {
        Expr::Asc(Box::new(self))
    }

    pub fn desc(self) -> Expr {
        Expr::Desc(Box::new(self))
    }

    /// The name a compiled select dict should bind this expression's result
    /// to: its alias if aliased, otherwise its bare column name.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Expr::Alias { alias, .. } => Some(alias),
            Expr::Column(name) => Some(name),
            _ => None,
        }
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::Literal(Value::long(v))
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Expr::Literal(Value::symbol(v))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub table: String,
    pub kind: JoinKind,
    /// Join-key column names, equal on both sides.
    pub on: Vec<String>,
    /// Window bounds expression, `wj` joins only.
    pub window: Option<(Box<Expr>, Box<Expr>)>,
    /// `(f1;v1);(f2;v2);…` — window-join right-side aggregate/column
    /// pairs, each an aggregate function applied to a right-side column.
    pub aggregates: Vec<(AggFunc, String)>,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<String>, on: Vec<String>) -> Self {
        Join {
            table: table.into(),
            kind,
            on,
            window: None,
            aggregates: Vec::new(),
        }
    }

    /// Add a `(func;column)` pair to a window join's right-side aggregate
    /// list.
    pub fn aggregate(mut self, func: AggFunc, column: impl Into<String>) -> Self {
        self.aggregates.push((func, column.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_reports_output_name() {
        let e = Expr::Column("px".into()).alias("price");
        assert_eq!(e.output_name(), Some("price"));
    }

    #[test]
    fn bare_column_output_name_is_itself() {
        assert_eq!(Expr::Column("sym".into()).output_name(), Some("sym"));
    }
}
