//! Compiles a [`Query`] into the server's prefix, S-expression-flavored
//! query-language text (`?[t;c;b;a]` for select, the `!` forms for
//! update/delete, `` `t insert (...) `` for insert).
//!
//! There's no single teacher file this ports directly — `qail-core` compiles
//! its `QailCmd` to SQL text through a `transpiler` module this workspace
//! dropped (SQL text generation isn't this protocol's wire format). This
//! module is grounded on the *shape* of that transpilation step (walk the
//! command struct, emit clause by clause into a `String` buffer) and on
//! `qail-core/src/ast/columns.rs`'s hand-written `Display` impl for the
//! general technique of recursively rendering an expression tree to text.

use crate::ast::expr::{Expr, Join};
use crate::ast::operators::{Action, JoinKind};
use crate::ast::Query;
use crate::error::CodecError;
use crate::literal;

fn compile_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Star => out.push_str("cols"),
        Expr::Column(name) => out.push_str(name),
        Expr::Literal(v) => literal::write_value(out, v),
        Expr::Binary { left, op, right } => {
            out.push('(');
            compile_expr(out, left);
            out.push_str(op.glyph());
            compile_expr(out, right);
            out.push(')');
        }
        Expr::Unary { op, expr } => {
            out.push_str(op.glyph());
            out.push('(');
            compile_expr(out, expr);
            out.push(')');
        }
        Expr::Call { name, args } => {
            out.push_str(name);
            out.push('[');
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                compile_expr(out, a);
            }
            out.push(']');
        }
        Expr::Aggregate { func, expr } => {
            out.push_str(func.keyword());
            out.push(' ');
            compile_expr(out, expr);
        }
        Expr::Xbar { width, expr } => {
            out.push('(');
            compile_expr(out, width);
            out.push_str(" xbar ");
            compile_expr(out, expr);
            out.push(')');
        }
        Expr::Fby { func, expr, keys } => {
            out.push_str("((");
            out.push_str(func.keyword());
            out.push(';');
            compile_expr(out, expr);
            out.push_str(") fby ");
            if keys.len() == 1 {
                compile_expr(out, &keys[0]);
            } else {
                out.push('(');
                for (i, k) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push(';');
                    }
                    compile_expr(out, k);
                }
                out.push(')');
            }
            out.push(')');
        }
        Expr::Each(inner) => {
            compile_expr(out, inner);
            out.push('\'');
        }
        Expr::Peach(inner) => {
            compile_expr(out, inner);
            out.push_str("':");
        }
        Expr::Within { expr, low, high } => {
            out.push('(');
            compile_expr(out, expr);
            out.push_str(" within (");
            compile_expr(out, low);
            out.push(';');
            compile_expr(out, high);
            out.push_str("))");
        }
        Expr::Like { expr, pattern } => {
            out.push('(');
            compile_expr(out, expr);
            out.push_str(" like ");
            literal::write_string_literal(out, pattern);
            out.push(')');
        }
        Expr::In { expr, list } => {
            out.push('(');
            compile_expr(out, expr);
            out.push_str(" in (");
            for (i, item) in list.iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                compile_expr(out, item);
            }
            out.push_str("))");
        }
        Expr::Asc(inner) | Expr::Desc(inner) => compile_expr(out, inner),
        Expr::Alias { expr, .. } => compile_expr(out, expr),
    }
}

fn expr_output_name(expr: &Expr, fallback_index: usize) -> String {
    expr.output_name().map(str::to_string).unwrap_or_else(|| format!("col{fallback_index}"))
}

/// Render the `from`-position of a select: either the bare table name, or,
/// when joins are present, nested join forms wrapping it — `aj[...]`/
/// `wj[...]` calls for as-of/window joins, `L lj \`c1\`c2 xkey R` / `L ij
/// \`c1\`c2 xkey R` infix forms for left/inner.
fn compile_from(table: &str, joins: &[Join]) -> String {
    let mut expr = table.to_string();
    for join in joins {
        let cols = join.on.iter().map(|c| format!("`{c}")).collect::<String>();
        expr = match join.kind {
            JoinKind::Left => format!("{expr} lj {cols} xkey {other}", other = join.table),
            JoinKind::Inner => format!("{expr} ij {cols} xkey {other}", other = join.table),
            JoinKind::AsOf => format!("aj[{cols};{expr};{other}]", other = join.table),
            JoinKind::Window => {
                let (low, high) = join
                    .window
                    .as_ref()
                    .map(|(l, h)| {
                        let mut lo = String::new();
                        compile_expr(&mut lo, l);
                        let mut hi = String::new();
                        compile_expr(&mut hi, h);
                        (lo, hi)
                    })
                    .unwrap_or_default();
                let mut pairs = String::new();
                for (func, col) in &join.aggregates {
                    pairs.push_str(&format!(";({};`{col})", func.keyword()));
                }
                format!("wj[({low};{high});{cols};{expr};({other}{pairs})]", other = join.table)
            }
        };
    }
    expr
}

/// `()` for no predicates, `enlist (p1;p2;…)` for one or more — a list of
/// parsed predicates rather than a single `&`-chain.
fn compile_filters(filters: &[Expr]) -> String {
    if filters.is_empty() {
        return "()".to_string();
    }
    let mut out = String::from("enlist (");
    for (i, f) in filters.iter().enumerate() {
        if i > 0 {
            out.push(';');
        }
        compile_expr(&mut out, f);
    }
    out.push(')');
    out
}

fn compile_select_dict(columns: &[Expr]) -> String {
    if columns.is_empty() || columns.iter().any(|c| matches!(c, Expr::Star)) {
        return "()!()".to_string();
    }
    let mut names = String::new();
    let mut exprs = String::new();
    for (i, c) in columns.iter().enumerate() {
        if i > 0 {
            exprs.push(';');
        }
        names.push('`');
        names.push_str(&expr_output_name(c, i));
        compile_expr(&mut exprs, c);
    }
    format!("({names})!({exprs})")
}

fn compile_group_by(keys: &[Expr]) -> String {
    if keys.is_empty() {
        return "0b".to_string();
    }
    let mut names = String::new();
    let mut exprs = String::new();
    for (i, k) in keys.iter().enumerate() {
        if i > 0 {
            exprs.push(';');
        }
        names.push('`');
        names.push_str(&expr_output_name(k, i));
        compile_expr(&mut exprs, k);
    }
    format!("({names})!({exprs})")
}

fn apply_sort_and_limit(mut body: String, query: &Query) -> String {
    if !query.sort.is_empty() {
        use crate::ast::operators::SortOrder;
        // Apply in reverse so the first-listed key sorts outermost (last
        // applied), giving a stable multi-key ordering out of successive
        // single-pass xasc/xdesc calls.
        for sort_expr in query.sort.iter().rev() {
            let (order, inner) = match sort_expr {
                Expr::Asc(e) => (SortOrder::Asc, e.as_ref()),
                Expr::Desc(e) => (SortOrder::Desc, e.as_ref()),
                other => (SortOrder::Asc, other),
            };
            let mut name = String::new();
            compile_expr(&mut name, inner);
            let verb = match order {
                SortOrder::Asc => "xasc",
                SortOrder::Desc => "xdesc",
            };
            body = format!("`{name} {verb} {body}");
        }
    }
    if let Some(n) = query.offset {
        body = format!("({n}_({body}))");
    }
    if let Some(n) = query.limit {
        body = format!("{n}#{body}");
    }
    body
}

/// Compile `query` into the server's query-language text.
pub fn compile(query: &Query) -> Result<String, CodecError> {
    match query.action {
        Action::Exec => Ok(query.raw.clone().unwrap_or_default()),
        Action::Select => {
            let from = compile_from(&query.table, &query.joins);
            let filters = compile_filters(&query.filters);
            let group = compile_group_by(&query.group_by);
            let select = compile_select_dict(&query.columns);
            let body = format!("?[{from};{filters};{group};{select}]");
            Ok(apply_sort_and_limit(body, query))
        }
        Action::Update => {
            if query.assignments.is_empty() {
                return Err(CodecError::Unsupported("update query has no assignments"));
            }
            let filters = compile_filters(&query.filters);
            let group = compile_group_by(&query.group_by);
            let mut names = String::new();
            let mut exprs = String::new();
            for (i, (col, expr)) in query.assignments.iter().enumerate() {
                if i > 0 {
                    exprs.push(';');
                }
                names.push('`');
                names.push_str(col);
                compile_expr(&mut exprs, expr);
            }
            Ok(format!(
                "![{table};{filters};{group};({names})!({exprs})]",
                table = query.table
            ))
        }
        Action::Delete => {
            let filters = compile_filters(&query.filters);
            if query.columns.is_empty() {
                // Delete matching rows.
                Ok(format!("![{table};{filters};0b;()]", table = query.table))
            } else {
                // Delete named columns (filters ignored, matching the
                // server's own column-drop form).
                let mut cols = String::new();
                for c in &query.columns {
                    cols.push('`');
                    cols.push_str(&expr_output_name(c, 0));
                }
                Ok(format!("![{table};();0b;{cols}]", table = query.table))
            }
        }
        Action::Insert => {
            if !query.insert_rows.is_empty() {
                let k = query.insert_columns.len();
                let mut vals = String::new();
                for col_idx in 0..k {
                    if col_idx > 0 {
                        vals.push(';');
                    }
                    let column = crate::value::Value::Mixed(
                        query.insert_rows.iter().map(|row| row[col_idx].clone()).collect(),
                    );
                    literal::write_value(&mut vals, &column);
                }
                return Ok(format!("`{table} insert ({vals})", table = query.table));
            }
            if query.insert_values.is_empty() {
                return Err(CodecError::Unsupported("insert query has no values"));
            }
            let mut vals = String::new();
            for (i, (_, v)) in query.insert_values.iter().enumerate() {
                if i > 0 {
                    vals.push(';');
                }
                literal::write_value(&mut vals, v);
            }
            Ok(format!("`{table} insert ({vals})", table = query.table))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::*;
    use crate::value::Value;

    #[test]
    fn compiles_simple_select() {
        let q = Query::select("trades").columns([col("sym"), col("px")]).filter(gt(col("size"), 100i64));
        let text = compile(&q).unwrap();
        assert_eq!(text, "?[trades;enlist ((size>100));0b;(`sym`px)!(sym;px)]");
    }

    #[test]
    fn compiles_select_star() {
        let q = Query::select("trades");
        let text = compile(&q).unwrap();
        assert!(text.starts_with("?[trades;();0b;()!()]"));
    }

    #[test]
    fn compiles_insert() {
        let q = Query::insert("trades").value("sym", Value::symbol("AAPL")).value("px", Value::long(150));
        let text = compile(&q).unwrap();
        assert_eq!(text, "`trades insert (`AAPL;150j)");
    }

    #[test]
    fn compiles_delete_rows() {
        let q = Query::delete("trades").filter(eq(col("sym"), "AAPL"));
        let text = compile(&q).unwrap();
        assert_eq!(text, "![trades;enlist ((sym=`AAPL));0b;()]");
    }

    #[test]
    fn compiles_update_with_group_by() {
        let q = Query::update("trades").set("px", col("px")).group_by([col("sym")]);
        let text = compile(&q).unwrap();
        assert!(text.starts_with("![trades;();(`sym)!(sym);(`px)!(px)]"));
    }

    #[test]
    fn exec_passes_through_verbatim() {
        let q = Query::exec("til 10");
        assert_eq!(compile(&q).unwrap(), "til 10");
    }

    #[test]
    fn compiles_as_of_join_select() {
        let q = Query::select("trades").as_of_join("quotes", vec!["sym".into(), "time".into()]);
        let text = compile(&q).unwrap();
        assert!(text.starts_with("?[aj[`sym`time;trades;quotes];"));
    }

    #[test]
    fn compiles_left_join_select_as_infix_xkey() {
        let q = Query::select("trades").left_join("refs", vec!["sym".into()]);
        let text = compile(&q).unwrap();
        assert!(text.starts_with("?[trades lj `sym xkey refs;"));
    }

    #[test]
    fn compiles_inner_join_select_as_infix_xkey() {
        let q = Query::select("trades").inner_join("refs", vec!["sym".into()]);
        let text = compile(&q).unwrap();
        assert!(text.starts_with("?[trades ij `sym xkey refs;"));
    }

    #[test]
    fn compiles_window_join_with_aggregate_pairs() {
        use crate::ast::operators::AggFunc;
        let q = Query::select("trades").window_join(
            "quotes",
            vec!["sym".into()],
            col("start"),
            col("end"),
            vec![(AggFunc::Avg, "price".into()), (AggFunc::Max, "size".into())],
        );
        let text = compile(&q).unwrap();
        assert!(text.starts_with("?[wj[(start;end);`sym;trades;(quotes;(avg;`price);(max;`size))];"));
    }

    #[test]
    fn compiles_xbar_as_infix() {
        let q = Query::select("trades").columns([xbar(lit(300i64), col("time"))]);
        let text = compile(&q).unwrap();
        assert!(text.contains("(300j xbar time)"), "expected infix xbar in: {text}");
    }

    #[test]
    fn compiles_fby_as_infix_pair() {
        use crate::ast::operators::AggFunc;
        let q = Query::select("trades").filter(eq(fby(AggFunc::Max, col("price"), [col("sym")]), col("price")));
        let text = compile(&q).unwrap();
        assert!(text.contains("((max;price) fby sym)"), "expected fby pair form in: {text}");
    }

    #[test]
    fn compiles_within_like_in_as_infix() {
        let mut out = String::new();
        compile_expr(&mut out, &within(col("price"), lit(100i64), lit(200i64)));
        assert_eq!(out, "(price within (100j;200j))");

        out.clear();
        compile_expr(&mut out, &like_(col("sym"), "AA*"));
        assert_eq!(out, "(sym like \"AA*\")");

        out.clear();
        compile_expr(&mut out, &in_(col("sym"), [col("AAPL")]));
        assert_eq!(out, "(sym in (AAPL))");
    }
}
