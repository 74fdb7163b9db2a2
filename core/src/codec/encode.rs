//! Pure, in-memory encoding from [`Value`] to bytes. No I/O — the transport
//! layer in `vexdb-net` owns reading and writing sockets; this module only
//! ever appends to a `Vec<u8>`.
//!
//! Grounded on `qail-pg/src/protocol/encoder.rs`'s `PgEncoder`: one method
//! per message shape, each writing a tag byte then a length-prefixed or
//! fixed-width body, and `pg/src/protocol/ast_encoder/helpers.rs`'s
//! zero-allocation `itoa`/`ryu` writers for numeric literals.

use crate::value::{Attr, Dict, Kind, Scalar, Table, Value, DICT_CODE, ERROR_CODE, TABLE_CODE};

/// Bit pattern written for a null of each kind. Mirrors
/// [`super::decode::is_null_bytes`]; kept as a sibling function (rather than
/// a shared lookup table) because encode and decode read this information
/// in opposite directions (kind+null -> bytes vs. bytes -> is-this-null).
pub fn null_scalar_bytes(kind: Kind) -> Vec<u8> {
    match kind {
        Kind::Short => i16::MIN.to_le_bytes().to_vec(),
        Kind::Int | Kind::Month | Kind::Date | Kind::Minute | Kind::Second | Kind::Time => {
            i32::MIN.to_le_bytes().to_vec()
        }
        Kind::Long | Kind::Timestamp | Kind::Timespan => i64::MIN.to_le_bytes().to_vec(),
        Kind::Real => f32::NAN.to_le_bytes().to_vec(),
        Kind::Float | Kind::Datetime => f64::NAN.to_le_bytes().to_vec(),
        Kind::Char => vec![b' '],
        Kind::Guid => vec![0u8; 16],
        Kind::Boolean | Kind::Byte => vec![0u8; kind.fixed_width().unwrap_or(1)],
        Kind::Symbol => vec![0], // empty NUL-terminated string
    }
}

fn write_scalar_payload(out: &mut Vec<u8>, s: &Scalar) {
    match s {
        Scalar::Boolean(b) => out.push(*b as u8),
        Scalar::Guid(g) => out.extend_from_slice(g),
        Scalar::Byte(b) => out.push(*b),
        Scalar::Short(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Long(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Real(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Float(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Char(c) => out.push(*c),
        Scalar::Symbol(s) => {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        Scalar::Timestamp(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Month(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Date(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Datetime(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Timespan(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Minute(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Second(v) => out.extend_from_slice(&v.to_le_bytes()),
        Scalar::Time(v) => out.extend_from_slice(&v.to_le_bytes()),
    }
}

fn write_vector_element<T>(out: &mut Vec<u8>, elem: &Option<T>, kind: Kind, write: impl Fn(&mut Vec<u8>, &T)) {
    match elem {
        Some(v) => write(out, v),
        None => out.extend_from_slice(&null_scalar_bytes(kind)),
    }
}

fn write_vector(out: &mut Vec<u8>, v: &crate::value::Vector, attr: Attr) {
    out.push(attr.wire_tag());
    out.extend_from_slice(&(v.len() as u32).to_le_bytes());
    use crate::value::Vector::*;
    match v {
        Boolean(xs) => xs.iter().for_each(|b| out.push(*b as u8)),
        Guid(xs) => xs.iter().for_each(|g| out.extend_from_slice(g)),
        Byte(xs) => out.extend_from_slice(xs),
        Short(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Short, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Int(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Int, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Long(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Long, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Real(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Real, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Float(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Float, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Char(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Char, |o, v| o.push(*v))),
        Symbol(xs) => xs.iter().for_each(|e| match e {
            Some(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            None => out.push(0),
        }),
        Timestamp(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Timestamp, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Month(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Month, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Date(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Date, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Datetime(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Datetime, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Timespan(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Timespan, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Minute(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Minute, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Second(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Second, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
        Time(xs) => xs.iter().for_each(|e| write_vector_element(out, e, Kind::Time, |o, v| o.extend_from_slice(&v.to_le_bytes()))),
    }
}

fn write_table(out: &mut Vec<u8>, t: &Table) {
    out.extend_from_slice(&(t.key_len as u32).to_le_bytes());
    out.extend_from_slice(&(t.columns.len() as u32).to_le_bytes());
    for (name, vector) in &t.columns {
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.push(vector.kind().vector_code() as u8);
        write_vector(out, vector, Attr::None);
    }
}

fn write_dict(out: &mut Vec<u8>, d: &Dict) {
    write_value(out, &d.keys);
    write_value(out, &d.values);
}

/// Append `value`'s wire encoding (type code byte followed by its body) to
/// `out`.
pub fn write_value(out: &mut Vec<u8>, value: &Value) {
    out.push(value.type_code());
    match value {
        Value::Scalar(s) => write_scalar_payload(out, s),
        Value::Null(k) => out.extend_from_slice(&null_scalar_bytes(*k)),
        Value::Vector(v, attr) => write_vector(out, v, *attr),
        Value::Mixed(items) => {
            out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            for item in items {
                write_value(out, item);
            }
        }
        Value::Table(t) => write_table(out, t),
        Value::Dict(d) => write_dict(out, d),
        Value::Error(msg) => {
            out.extend_from_slice(&(msg.len() as u32).to_le_bytes());
            out.extend_from_slice(msg.as_bytes());
        }
    }
}

/// Encode a top-level [`Value`] to its own byte buffer (without a frame
/// header — see [`super::frame`] and [`super::encode_message`]).
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_value(&mut out, value);
    out
}

// Sanity checks: TABLE_CODE/DICT_CODE/ERROR_CODE must equal what `write_value`
// relies on `Value::type_code` to have produced.
const _: i8 = TABLE_CODE;
const _: i8 = DICT_CODE;
const _: i8 = ERROR_CODE;
