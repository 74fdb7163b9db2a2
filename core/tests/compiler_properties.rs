//! Compiler properties from the testable-properties checklist: pure-column
//! bare names, filter-list/chained-filter equivalence, offset+limit paging,
//! and multi-row insert transposition.
//!
//! Grounded on `compiler.rs`'s own inline `#[cfg(test)]` module, which
//! already covers single-predicate select/update/delete/insert/join shapes
//! — this file adds the properties that module doesn't, rather than
//! duplicating what it already asserts.

use vexdb_core::ast::builders::{col, gt};
use vexdb_core::compile;
use vexdb_core::value::{Scalar, Value};
use vexdb_core::Query;

#[test]
fn pure_column_compiles_to_bare_name_in_select_position() {
    let q = Query::select("trades").columns([col("sym")]);
    let text = compile(&q).unwrap();
    assert!(text.contains("(sym)"), "expected bare column name `sym` in: {text}");
}

#[test]
fn chained_filters_and_batched_filters_are_byte_identical() {
    let p1 = gt(col("size"), 100i64);
    let p2 = gt(col("price"), 10i64);

    let chained = Query::select("trades").filter(p1.clone()).filter(p2.clone());
    let batched = Query::select("trades").filters([p1, p2]);

    assert_eq!(compile(&chained).unwrap(), compile(&batched).unwrap());
}

#[test]
fn offset_then_limit_wraps_drop_inside_take() {
    let q = Query::select("trades").offset(5).limit(10);
    let text = compile(&q).unwrap();
    assert_eq!(text, "10#(5_(?[trades;();0b;()!()]))");
}

#[test]
fn multi_row_insert_transposes_to_per_column_vectors() {
    let q = Query::insert("trades").rows(
        vec!["sym".to_string(), "price".to_string()],
        vec![
            vec![Value::symbol("AAPL"), Value::Scalar(Scalar::Float(150.0))],
            vec![Value::symbol("GOOG"), Value::Scalar(Scalar::Float(2800.0))],
        ],
    );
    let text = compile(&q).unwrap();
    assert_eq!(text, "`trades insert ((`AAPL;`GOOG);(150.0;2800.0))");
}
