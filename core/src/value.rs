//! The typed value (TV) — the single data currency that crosses the wire in
//! both directions, and the in-memory representation vectors, tables, and
//! dictionaries decode into.
//!
//! Grounded on `qail-core`'s AST value nodes (`ast/columns.rs`'s `Column`
//! enum, which tags every shape of thing a column can be) for the general
//! shape of "one enum, one variant per wire-visible kind" — generalized here
//! to the full scalar/vector/table/dict type-code table instead of SQL
//! column shapes.

use std::collections::HashMap;
use std::fmt;

/// The sixteen scalar element kinds a vector (or scalar TV) can carry.
/// The discriminant is the *positive* wire type code used for vectors of
/// that kind; scalars of the same kind are framed as `-(kind as i8)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[repr(i8)]
pub enum Kind {
    Boolean = 1,
    Guid = 2,
    Byte = 4,
    Short = 5,
    Int = 6,
    Long = 7,
    Real = 8,
    Float = 9,
    Char = 10,
    Symbol = 11,
    Timestamp = 12,
    Month = 13,
    Date = 14,
    Datetime = 15,
    Timespan = 16,
    Minute = 17,
    Second = 18,
    Time = 19,
}

impl Kind {
    pub const ALL: [Kind; 18] = [
        Kind::Boolean,
        Kind::Guid,
        Kind::Byte,
        Kind::Short,
        Kind::Int,
        Kind::Long,
        Kind::Real,
        Kind::Float,
        Kind::Char,
        Kind::Symbol,
        Kind::Timestamp,
        Kind::Month,
        Kind::Date,
        Kind::Datetime,
        Kind::Timespan,
        Kind::Minute,
        Kind::Second,
        Kind::Time,
    ];

    /// The fixed width in bytes of one element of this kind, except
    /// `Symbol`, whose elements are NUL-terminated and therefore variable.
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Kind::Boolean | Kind::Byte | Kind::Char => Some(1),
            Kind::Short => Some(2),
            Kind::Int | Kind::Real | Kind::Month | Kind::Date | Kind::Minute | Kind::Second | Kind::Time => Some(4),
            Kind::Long | Kind::Float | Kind::Datetime | Kind::Timespan | Kind::Timestamp => Some(8),
            Kind::Guid => Some(16),
            Kind::Symbol => None,
        }
    }

    /// Single-character type tag as returned by server metadata (`meta`
    /// RPC) and used in the CLI's generated field declarations.
    pub const fn type_char(self) -> char {
        match self {
            Kind::Boolean => 'b',
            Kind::Guid => 'g',
            Kind::Byte => 'x',
            Kind::Short => 'h',
            Kind::Int => 'i',
            Kind::Long => 'j',
            Kind::Real => 'e',
            Kind::Float => 'f',
            Kind::Char => 'c',
            Kind::Symbol => 's',
            Kind::Timestamp => 'p',
            Kind::Month => 'm',
            Kind::Date => 'd',
            Kind::Datetime => 'z',
            Kind::Timespan => 'n',
            Kind::Minute => 'u',
            Kind::Second => 'v',
            Kind::Time => 't',
        }
    }

    pub fn from_type_char(c: char) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.type_char() == c)
    }

    /// Positive vector type code for this kind.
    pub const fn vector_code(self) -> i8 {
        self as i8
    }

    /// Negative scalar type code for this kind.
    pub const fn scalar_code(self) -> i8 {
        -(self as i8)
    }

    pub fn from_code(code: i8) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.vector_code() == code.abs())
    }
}

pub const TABLE_CODE: i8 = 98;
pub const DICT_CODE: i8 = 99;
pub const NULLARY_CODE: i8 = 101;
pub const ERROR_CODE: i8 = -128;

/// Per-attribute metadata a vector can carry (sorted/unique/parted/grouped),
/// used by the compiler and by the server's own query planner; preserved
/// opaquely through decode/encode round trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Attr {
    #[default]
    None,
    Sorted,
    Unique,
    Parted,
    Grouped,
}

impl Attr {
    pub(crate) const fn wire_tag(self) -> u8 {
        match self {
            Attr::None => 0,
            Attr::Sorted => 1,
            Attr::Unique => 2,
            Attr::Parted => 3,
            Attr::Grouped => 4,
        }
    }

    pub(crate) fn from_wire_tag(tag: u8) -> Option<Attr> {
        match tag {
            0 => Some(Attr::None),
            1 => Some(Attr::Sorted),
            2 => Some(Attr::Unique),
            3 => Some(Attr::Parted),
            4 => Some(Attr::Grouped),
            _ => None,
        }
    }
}

/// A single scalar payload, non-null. Nulls are represented separately
/// ([`Value::Null`] for a standalone scalar TV, `None` inside a vector's
/// per-kind `Vec<Option<_>>`), so this type never needs a sentinel of its
/// own.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Scalar {
    Boolean(bool),
    Guid([u8; 16]),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Real(f32),
    Float(f64),
    Char(u8),
    Symbol(String),
    /// Nanoseconds since 2000-01-01T00:00:00.
    Timestamp(i64),
    /// Months since 2000-01.
    Month(i32),
    /// Days since 2000-01-01.
    Date(i32),
    /// Days (with fractional time-of-day) since 2000-01-01.
    Datetime(f64),
    /// Nanoseconds since midnight.
    Timespan(i64),
    /// Minutes since midnight.
    Minute(i32),
    /// Seconds since midnight.
    Second(i32),
    /// Milliseconds since midnight.
    Time(i32),
}

impl Scalar {
    pub fn kind(&self) -> Kind {
        match self {
            Scalar::Boolean(_) => Kind::Boolean,
            Scalar::Guid(_) => Kind::Guid,
            Scalar::Byte(_) => Kind::Byte,
            Scalar::Short(_) => Kind::Short,
            Scalar::Int(_) => Kind::Int,
            Scalar::Long(_) => Kind::Long,
            Scalar::Real(_) => Kind::Real,
            Scalar::Float(_) => Kind::Float,
            Scalar::Char(_) => Kind::Char,
            Scalar::Symbol(_) => Kind::Symbol,
            Scalar::Timestamp(_) => Kind::Timestamp,
            Scalar::Month(_) => Kind::Month,
            Scalar::Date(_) => Kind::Date,
            Scalar::Datetime(_) => Kind::Datetime,
            Scalar::Timespan(_) => Kind::Timespan,
            Scalar::Minute(_) => Kind::Minute,
            Scalar::Second(_) => Kind::Second,
            Scalar::Time(_) => Kind::Time,
        }
    }

    /// The bit pattern this scalar's kind uses to mean "null", where the
    /// kind defines one. `Boolean`, `Byte`, and `Guid` have no reserved
    /// null pattern other than their own zero value, so those are excluded
    /// from the null-capable set.
    pub fn is_null_capable(kind: Kind) -> bool {
        !matches!(kind, Kind::Boolean | Kind::Byte)
    }
}

/// One column's worth of homogeneously-typed elements, plus its attribute.
/// Null-capable kinds store `Option<T>`; `None` is the typed null for that
/// column, encoded on the wire as the kind's sentinel bit pattern and
/// decoded back into `None` rather than a sentinel value a caller could
/// mistake for data.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Vector {
    Boolean(Vec<bool>),
    Guid(Vec<[u8; 16]>),
    Byte(Vec<u8>),
    Short(Vec<Option<i16>>),
    Int(Vec<Option<i32>>),
    Long(Vec<Option<i64>>),
    Real(Vec<Option<f32>>),
    Float(Vec<Option<f64>>),
    Char(Vec<Option<u8>>),
    Symbol(Vec<Option<String>>),
    Timestamp(Vec<Option<i64>>),
    Month(Vec<Option<i32>>),
    Date(Vec<Option<i32>>),
    Datetime(Vec<Option<f64>>),
    Timespan(Vec<Option<i64>>),
    Minute(Vec<Option<i32>>),
    Second(Vec<Option<i32>>),
    Time(Vec<Option<i32>>),
}

impl Vector {
    pub fn kind(&self) -> Kind {
        match self {
            Vector::Boolean(_) => Kind::Boolean,
            Vector::Guid(_) => Kind::Guid,
            Vector::Byte(_) => Kind::Byte,
            Vector::Short(_) => Kind::Short,
            Vector::Int(_) => Kind::Int,
            Vector::Long(_) => Kind::Long,
            Vector::Real(_) => Kind::Real,
            Vector::Float(_) => Kind::Float,
            Vector::Char(_) => Kind::Char,
            Vector::Symbol(_) => Kind::Symbol,
            Vector::Timestamp(_) => Kind::Timestamp,
            Vector::Month(_) => Kind::Month,
            Vector::Date(_) => Kind::Date,
            Vector::Datetime(_) => Kind::Datetime,
            Vector::Timespan(_) => Kind::Timespan,
            Vector::Minute(_) => Kind::Minute,
            Vector::Second(_) => Kind::Second,
            Vector::Time(_) => Kind::Time,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Vector::Boolean(v) => v.len(),
            Vector::Guid(v) => v.len(),
            Vector::Byte(v) => v.len(),
            Vector::Short(v) => v.len(),
            Vector::Int(v) => v.len(),
            Vector::Long(v) => v.len(),
            Vector::Real(v) => v.len(),
            Vector::Float(v) => v.len(),
            Vector::Char(v) => v.len(),
            Vector::Symbol(v) => v.len(),
            Vector::Timestamp(v) => v.len(),
            Vector::Month(v) => v.len(),
            Vector::Date(v) => v.len(),
            Vector::Datetime(v) => v.len(),
            Vector::Timespan(v) => v.len(),
            Vector::Minute(v) => v.len(),
            Vector::Second(v) => v.len(),
            Vector::Time(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value at `idx`, as a standalone [`Value`] — `Scalar` for data,
    /// `Null(kind)` for a null element, `None` if `idx` is out of range.
    /// Used by row views to materialize one cell without cloning the whole
    /// column.
    pub fn get_value(&self, idx: usize) -> Option<Value> {
        macro_rules! nullable {
            ($xs:expr, $kind:expr, $variant:ident) => {
                $xs.get(idx).map(|e| match e {
                    Some(x) => Value::Scalar(Scalar::$variant(x.clone())),
                    None => Value::Null($kind),
                })
            };
        }
        match self {
            Vector::Boolean(xs) => xs.get(idx).map(|b| Value::Scalar(Scalar::Boolean(*b))),
            Vector::Guid(xs) => xs.get(idx).map(|g| Value::Scalar(Scalar::Guid(*g))),
            Vector::Byte(xs) => xs.get(idx).map(|b| Value::Scalar(Scalar::Byte(*b))),
            Vector::Short(xs) => nullable!(xs, Kind::Short, Short),
            Vector::Int(xs) => nullable!(xs, Kind::Int, Int),
            Vector::Long(xs) => nullable!(xs, Kind::Long, Long),
            Vector::Real(xs) => nullable!(xs, Kind::Real, Real),
            Vector::Float(xs) => nullable!(xs, Kind::Float, Float),
            Vector::Char(xs) => nullable!(xs, Kind::Char, Char),
            Vector::Symbol(xs) => nullable!(xs, Kind::Symbol, Symbol),
            Vector::Timestamp(xs) => nullable!(xs, Kind::Timestamp, Timestamp),
            Vector::Month(xs) => nullable!(xs, Kind::Month, Month),
            Vector::Date(xs) => nullable!(xs, Kind::Date, Date),
            Vector::Datetime(xs) => nullable!(xs, Kind::Datetime, Datetime),
            Vector::Timespan(xs) => nullable!(xs, Kind::Timespan, Timespan),
            Vector::Minute(xs) => nullable!(xs, Kind::Minute, Minute),
            Vector::Second(xs) => nullable!(xs, Kind::Second, Second),
            Vector::Time(xs) => nullable!(xs, Kind::Time, Time),
        }
    }
}

/// A table: ordered column names plus equal-length vectors. A keyed table
/// additionally designates a key-column prefix, making it a dictionary from
/// key columns to value columns under the hood (`keys`/`values` split).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Table {
    pub columns: Vec<(String, Vector)>,
    /// Number of leading columns that form the key, for a keyed table.
    /// Zero for an ordinary table.
    pub key_len: usize,
}

impl Table {
    pub fn new(columns: Vec<(String, Vector)>) -> Self {
        Table { columns, key_len: 0 }
    }

    pub fn keyed(key_columns: Vec<(String, Vector)>, value_columns: Vec<(String, Vector)>) -> Self {
        let key_len = key_columns.len();
        let mut columns = key_columns;
        columns.extend(value_columns);
        Table { columns, key_len }
    }

    pub fn is_keyed(&self) -> bool {
        self.key_len > 0
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn column(&self, name: &str) -> Option<&Vector> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

/// A general dictionary: parallel key/value TVs of any shape, not just the
/// key/value table the `Table::keyed` constructor builds.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dict {
    pub keys: Box<Value>,
    pub values: Box<Value>,
}

/// The top-level typed value: anything that can cross the wire in one
/// frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Scalar(Scalar),
    /// A typed null scalar, distinguishable at runtime by `Kind` — `Null(k)
    /// != Null(k')` for `k != k'`, matching the distinct-sentinel-per-kind
    /// invariant even where this value never touches a vector slot.
    Null(Kind),
    Vector(Vector, Attr),
    /// Mixed list: a heterogeneous sequence of TVs, kept as the generic
    /// escape hatch the homogeneous `Vector` can't express.
    Mixed(Vec<Value>),
    Table(Table),
    Dict(Dict),
    /// A server-side error, delivered as data rather than as a transport
    /// failure; the session layer is responsible for turning this into a
    /// `QError` at the point a caller awaits a response.
    Error(String),
}

impl Value {
    pub fn symbol(s: impl Into<String>) -> Value {
        Value::Scalar(Scalar::Symbol(s.into()))
    }

    pub fn long(v: i64) -> Value {
        Value::Scalar(Scalar::Long(v))
    }

    pub fn type_code(&self) -> i8 {
        match self {
            Value::Scalar(s) => s.kind().scalar_code(),
            Value::Null(k) => k.scalar_code(),
            Value::Vector(v, _) => v.kind().vector_code(),
            Value::Mixed(_) => 0,
            Value::Table(_) => TABLE_CODE,
            Value::Dict(_) => DICT_CODE,
            Value::Error(_) => ERROR_CODE,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&str> {
        match self {
            Value::Error(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_char())
    }
}

/// Row-major view materialized on demand from a [`Table`]'s column-major
/// storage, keyed by column name for convenient field access.
pub type RowMap = HashMap<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_and_vector_codes_are_sign_mirrors() {
        for k in Kind::ALL {
            assert_eq!(k.scalar_code(), -k.vector_code());
        }
    }

    #[test]
    fn type_char_round_trips() {
        for k in Kind::ALL {
            assert_eq!(Kind::from_type_char(k.type_char()), Some(k));
        }
    }

    #[test]
    fn from_code_ignores_sign() {
        assert_eq!(Kind::from_code(-7), Some(Kind::Long));
        assert_eq!(Kind::from_code(7), Some(Kind::Long));
    }

    #[test]
    fn null_values_are_distinct_across_kinds() {
        assert_ne!(Value::Null(Kind::Int), Value::Null(Kind::Long));
    }

    #[test]
    fn table_row_count_matches_column_length() {
        let t = Table::new(vec![("x".into(), Vector::Long(vec![Some(1), Some(2), None]))]);
        assert_eq!(t.row_count(), 3);
    }

    #[test]
    fn vector_get_value_distinguishes_null_from_data() {
        let v = Vector::Long(vec![Some(1), None]);
        assert_eq!(v.get_value(0), Some(Value::Scalar(Scalar::Long(1))));
        assert_eq!(v.get_value(1), Some(Value::Null(Kind::Long)));
        assert_eq!(v.get_value(2), None);
    }

    #[test]
    fn keyed_table_reports_key_len() {
        let t = Table::keyed(
            vec![("sym".into(), Vector::Symbol(vec![Some("AAPL".into())]))],
            vec![("px".into(), Vector::Float(vec![Some(1.0)]))],
        );
        assert!(t.is_keyed());
        assert_eq!(t.key_len, 1);
    }
}
