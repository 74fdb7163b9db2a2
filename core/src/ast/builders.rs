//! Ergonomic free-function builders for query expressions.
//!
//! Grounded on `qail-core/src/ast/builders.rs`'s `col`/`eq`/`gt`/`count`/
//! `avg` free functions and its `*Builder` structs for multi-argument
//! forms — kept as the same "small free functions return `Expr` directly;
//! anything with optional modifiers returns a builder" shape, re-membered
//! for this query language's adverbs (`xbar`, `fby`, `within`) instead of
//! SQL's `CASE`/`CAST`/`COALESCE`.

use crate::ast::expr::Expr;
use crate::ast::operators::{AggFunc, BinOp, UnaryOp};
use crate::value::Value;

pub fn col(name: &str) -> Expr {
    Expr::Column(name.to_string())
}

pub fn star() -> Expr {
    Expr::Star
}

pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

fn binary(left: impl Into<Expr>, op: BinOp, right: impl Into<Expr>) -> Expr {
    Expr::Binary {
        left: Box::new(left.into()),
        op,
        right: Box::new(right.into()),
    }
}

pub fn eq(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    binary(left, BinOp::Eq, right)
}

pub fn ne(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    binary(left, BinOp::Ne, right)
}

pub fn gt(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    binary(left, BinOp::Gt, right)
}

pub fn gte(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    binary(left, BinOp::Gte, right)
}

pub fn lt(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    binary(left, BinOp::Lt, right)
}

pub fn lte(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    binary(left, BinOp::Lte, right)
}

pub fn and(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    binary(left, BinOp::And, right)
}

pub fn or(left: impl Into<Expr>, right: impl Into<Expr>) -> Expr {
    binary(left, BinOp::Or, right)
}

pub fn not(expr: impl Into<Expr>) -> Expr {
    Expr::Unary {
        op: UnaryOp::Not,
        expr: Box::new(expr.into()),
    }
}

pub fn neg(expr: impl Into<Expr>) -> Expr {
    Expr::Unary {
        op: UnaryOp::Neg,
        expr: Box::new(expr.into()),
    }
}

fn aggregate(func: AggFunc, expr: impl Into<Expr>) -> Expr {
    Expr::Aggregate {
        func,
        expr: Box::new(expr.into()),
    }
}

pub fn count_(expr: impl Into<Expr>) -> Expr {
    aggregate(AggFunc::Count, expr)
}

pub fn sum_(expr: impl Into<Expr>) -> Expr {
    aggregate(AggFunc::Sum, expr)
}

pub fn avg_(expr: impl Into<Expr>) -> Expr {
    aggregate(AggFunc::Avg, expr)
}

pub fn min_(expr: impl Into<Expr>) -> Expr {
    aggregate(AggFunc::Min, expr)
}

pub fn max_(expr: impl Into<Expr>) -> Expr {
    aggregate(AggFunc::Max, expr)
}

pub fn first_(expr: impl Into<Expr>) -> Expr {
    aggregate(AggFunc::First, expr)
}

pub fn last_(expr: impl Into<Expr>) -> Expr {
    aggregate(AggFunc::Last, expr)
}

/// `xbar[width;expr]` time/number bucketing.
pub fn xbar(width: impl Into<Expr>, expr: impl Into<Expr>) -> Expr {
    Expr::Xbar {
        width: Box::new(width.into()),
        expr: Box::new(expr.into()),
    }
}

/// `func fby expr by keys` — per-group aggregate broadcast back over every
/// row of the group, rather than collapsing rows the way `group_by` does.
pub fn fby<I, E>(func: AggFunc, expr: impl Into<Expr>, keys: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::Fby {
        func,
        expr: Box::new(expr.into()),
        keys: keys.into_iter().map(Into::into).collect(),
    }
}

pub fn each(expr: impl Into<Expr>) -> Expr {
    Expr::Each(Box::new(expr.into()))
}

pub fn peach(expr: impl Into<Expr>) -> Expr {
    Expr::Peach(Box::new(expr.into()))
}

pub fn within(expr: impl Into<Expr>, low: impl Into<Expr>, high: impl Into<Expr>) -> Expr {
    Expr::Within {
        expr: Box::new(expr.into()),
        low: Box::new(low.into()),
        high: Box::new(high.into()),
    }
}

pub fn like_(expr: impl Into<Expr>, pattern: impl Into<String>) -> Expr {
    Expr::Like {
        expr: Box::new(expr.into()),
        pattern: pattern.into(),
    }
}

pub fn in_<I, E>(expr: impl Into<Expr>, list: I) -> Expr
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    Expr::In {
        expr: Box::new(expr.into()),
        list: list.into_iter().map(Into::into).collect(),
    }
}

pub fn asc(expr: impl Into<Expr>) -> Expr {
    expr.into().asc()
}

pub fn desc(expr: impl Into<Expr>) -> Expr {
    expr.into().desc()
}

pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::Call {
        name: name.into(),
        args,
    }
}

/// Extension trait adding the fluent `.alias(...)` spelling used throughout
/// query-construction call sites, mirroring `qail-core::ast::builders`'s
/// `ExprExt` trait.
pub trait ExprExt {
    fn as_alias(self, alias: &str) -> Expr;
}

impl ExprExt for Expr {
    fn as_alias(self, alias: &str) -> Expr {
        self.alias(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_builds_binary_expr() {
        let e = eq(col("sym"), "AAPL");
        assert!(matches!(e, Expr::Binary { op: BinOp::Eq, .. }));
    }

    #[test]
    fn xbar_wraps_width_and_expr() {
        let e = xbar(lit(300i64), col("time"));
        assert!(matches!(e, Expr::Xbar { .. }));
    }

    #[test]
    fn alias_extension_matches_method() {
        let e = col("px").as_alias("price");
        assert_eq!(e.output_name(), Some("price"));
    }

    #[test]
    fn in_collects_literal_list() {
        let e = in_(col("sym"), ["AAPL", "MSFT"]);
        match e {
            Expr::In { list, .. } => assert_eq!(list.len(), 2),
            _ => panic!("expected Expr::In"),
        }
    }
}
