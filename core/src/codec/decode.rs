//! Inverse of [`super::encode`]: bytes to [`Value`]. Operates on a borrowed
//! slice with an internal cursor so the caller controls buffering; no I/O
//! happens here.
//!
//! Grounded on the same `qail-pg/src/protocol/encoder.rs` shape, read in
//! reverse (every `encode_*` there has an implicit inverse the server-side
//! startup/auth parsing performs) and on `other_examples/`'s ClickHouse
//! protocol reader for the "cursor over a byte slice with bounds-checked
//! reads" pattern used by binary column-oriented wire protocols generally.

use crate::codec::frame::Endianness;
use crate::error::CodecError;
use crate::value::{Attr, Dict, Kind, Scalar, Table, Value, Vector, DICT_CODE, ERROR_CODE, NULLARY_CODE, TABLE_CODE};

pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    endianness: Endianness,
}

impl<'a> Cursor<'a> {
    /// A cursor that decodes multi-byte fields in `endianness` — the server's
    /// declared byte order for this message, read off the frame header.
    pub fn new(bytes: &'a [u8], endianness: Endianness) -> Self {
        Cursor { bytes, pos: 0, endianness }
    }

    fn require(&self, n: usize) -> Result<(), CodecError> {
        if self.pos + n > self.bytes.len() {
            Err(CodecError::Truncated {
                expected: self.pos + n,
                actual: self.bytes.len(),
            })
        } else {
            Ok(())
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        self.require(n)?;
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.u8()? as i8)
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        let bytes = self.take(2)?.try_into().unwrap();
        Ok(match self.endianness {
            Endianness::Little => u16::from_le_bytes(bytes),
            Endianness::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?.try_into().unwrap();
        Ok(match self.endianness {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        })
    }

    fn i16(&mut self) -> Result<i16, CodecError> {
        let bytes = self.take(2)?.try_into().unwrap();
        Ok(match self.endianness {
            Endianness::Little => i16::from_le_bytes(bytes),
            Endianness::Big => i16::from_be_bytes(bytes),
        })
    }

    fn i32(&mut self) -> Result<i32, CodecError> {
        let bytes = self.take(4)?.try_into().unwrap();
        Ok(match self.endianness {
            Endianness::Little => i32::from_le_bytes(bytes),
            Endianness::Big => i32::from_be_bytes(bytes),
        })
    }

    fn i64(&mut self) -> Result<i64, CodecError> {
        let bytes = self.take(8)?.try_into().unwrap();
        Ok(match self.endianness {
            Endianness::Little => i64::from_le_bytes(bytes),
            Endianness::Big => i64::from_be_bytes(bytes),
        })
    }

    fn f32(&mut self) -> Result<f32, CodecError> {
        let bytes = self.take(4)?.try_into().unwrap();
        Ok(match self.endianness {
            Endianness::Little => f32::from_le_bytes(bytes),
            Endianness::Big => f32::from_be_bytes(bytes),
        })
    }

    fn f64(&mut self) -> Result<f64, CodecError> {
        let bytes = self.take(8)?.try_into().unwrap();
        Ok(match self.endianness {
            Endianness::Little => f64::from_le_bytes(bytes),
            Endianness::Big => f64::from_be_bytes(bytes),
        })
    }

    fn cstr(&mut self) -> Result<String, CodecError> {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != 0 {
            self.pos += 1;
        }
        self.require(1)?; // the NUL terminator itself
        let raw = &self.bytes[start..self.pos];
        self.pos += 1;
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8 { field: "symbol" })
    }
}

fn is_null_i16(v: i16) -> bool {
    v == i16::MIN
}
fn is_null_i32(v: i32) -> bool {
    v == i32::MIN
}
fn is_null_i64(v: i64) -> bool {
    v == i64::MIN
}
fn is_null_f32(v: f32) -> bool {
    v.is_nan()
}
fn is_null_f64(v: f64) -> bool {
    v.is_nan()
}

macro_rules! read_nullable_column {
    ($cur:expr, $len:expr, $read:ident, $is_null:ident) => {{
        let mut out = Vec::with_capacity($len);
        for _ in 0..$len {
            let raw = $cur.$read()?;
            out.push(if $is_null(raw) { None } else { Some(raw) });
        }
        out
    }};
}

fn read_vector(cur: &mut Cursor, kind: Kind) -> Result<(Vector, Attr), CodecError> {
    let attr = Attr::from_wire_tag(cur.u8()?)
        .ok_or(CodecError::Unsupported("unknown vector attribute tag"))?;
    let len = cur.u32()? as usize;
    let vector = match kind {
        Kind::Boolean => Vector::Boolean((0..len).map(|_| cur.u8().map(|b| b != 0)).collect::<Result<_, _>>()?),
        Kind::Guid => {
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                out.push(cur.take(16)?.try_into().unwrap());
            }
            Vector::Guid(out)
        }
        Kind::Byte => Vector::Byte(cur.take(len)?.to_vec()),
        Kind::Short => Vector::Short(read_nullable_column!(cur, len, i16, is_null_i16)),
        Kind::Int => Vector::Int(read_nullable_column!(cur, len, i32, is_null_i32)),
        Kind::Long => Vector::Long(read_nullable_column!(cur, len, i64, is_null_i64)),
        Kind::Real => Vector::Real(read_nullable_column!(cur, len, f32, is_null_f32)),
        Kind::Float => Vector::Float(read_nullable_column!(cur, len, f64, is_null_f64)),
        Kind::Char => {
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                let b = cur.u8()?;
                out.push(if b == b' ' { None } else { Some(b) });
            }
            Vector::Char(out)
        }
        Kind::Symbol => {
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                let s = cur.cstr()?;
                out.push(if s.is_empty() { None } else { Some(s) });
            }
            Vector::Symbol(out)
        }
        Kind::Timestamp => Vector::Timestamp(read_nullable_column!(cur, len, i64, is_null_i64)),
        Kind::Month => Vector::Month(read_nullable_column!(cur, len, i32, is_null_i32)),
        Kind::Date => Vector::Date(read_nullable_column!(cur, len, i32, is_null_i32)),
        Kind::Datetime => Vector::Datetime(read_nullable_column!(cur, len, f64, is_null_f64)),
        Kind::Timespan => Vector::Timespan(read_nullable_column!(cur, len, i64, is_null_i64)),
        Kind::Minute => Vector::Minute(read_nullable_column!(cur, len, i32, is_null_i32)),
        Kind::Second => Vector::Second(read_nullable_column!(cur, len, i32, is_null_i32)),
        Kind::Time => Vector::Time(read_nullable_column!(cur, len, i32, is_null_i32)),
    };
    if vector.len() != len {
        return Err(CodecError::LengthMismatch {
            declared: len,
            actual: vector.len(),
        });
    }
    Ok((vector, attr))
}

fn read_scalar(cur: &mut Cursor, kind: Kind) -> Result<Scalar, CodecError> {
    Ok(match kind {
        Kind::Boolean => Scalar::Boolean(cur.u8()? != 0),
        Kind::Guid => Scalar::Guid(cur.take(16)?.try_into().unwrap()),
        Kind::Byte => Scalar::Byte(cur.u8()?),
        Kind::Short => Scalar::Short(cur.i16()?),
        Kind::Int => Scalar::Int(cur.i32()?),
        Kind::Long => Scalar::Long(cur.i64()?),
        Kind::Real => Scalar::Real(cur.f32()?),
        Kind::Float => Scalar::Float(cur.f64()?),
        Kind::Char => Scalar::Char(cur.u8()?),
        Kind::Symbol => Scalar::Symbol(cur.cstr()?),
        Kind::Timestamp => Scalar::Timestamp(cur.i64()?),
        Kind::Month => Scalar::Month(cur.i32()?),
        Kind::Date => Scalar::Date(cur.i32()?),
        Kind::Datetime => Scalar::Datetime(cur.f64()?),
        Kind::Timespan => Scalar::Timespan(cur.i64()?),
        Kind::Minute => Scalar::Minute(cur.i32()?),
        Kind::Second => Scalar::Second(cur.i32()?),
        Kind::Time => Scalar::Time(cur.i32()?),
    })
}

fn scalar_is_null(kind: Kind, payload_start: usize, bytes: &[u8], endianness: Endianness) -> bool {
    macro_rules! int_from {
        ($ty:ty, $width:expr) => {{
            let raw: [u8; $width] = bytes[payload_start..payload_start + $width].try_into().unwrap();
            match endianness {
                Endianness::Little => <$ty>::from_le_bytes(raw),
                Endianness::Big => <$ty>::from_be_bytes(raw),
            }
        }};
    }
    match kind {
        Kind::Short => int_from!(i16, 2) == i16::MIN,
        Kind::Int | Kind::Month | Kind::Date | Kind::Minute | Kind::Second | Kind::Time => int_from!(i32, 4) == i32::MIN,
        Kind::Long | Kind::Timestamp | Kind::Timespan => int_from!(i64, 8) == i64::MIN,
        Kind::Real => int_from!(f32, 4).is_nan(),
        Kind::Float | Kind::Datetime => int_from!(f64, 8).is_nan(),
        Kind::Char => bytes[payload_start] == b' ',
        Kind::Guid => bytes[payload_start..payload_start + 16].iter().all(|b| *b == 0),
        Kind::Symbol => bytes[payload_start] == 0,
        Kind::Boolean | Kind::Byte => false,
    }
}

fn read_table(cur: &mut Cursor) -> Result<Table, CodecError> {
    let key_len = cur.u32()? as usize;
    let col_count = cur.u32()? as usize;
    let mut columns = Vec::with_capacity(col_count);
    for _ in 0..col_count {
        let name_len = cur.u16()? as usize;
        let name_bytes = cur.take(name_len)?;
        let name = String::from_utf8(name_bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { field: "column name" })?;
        let kind_code = cur.i8()?;
        let kind = Kind::from_code(kind_code).ok_or(CodecError::UnknownTypeCode(kind_code))?;
        let (vector, _attr) = read_vector(cur, kind)?;
        columns.push((name, vector));
    }
    Ok(Table { columns, key_len })
}

fn read_dict(cur: &mut Cursor) -> Result<Dict, CodecError> {
    let keys = read_value(cur)?;
    let values = read_value(cur)?;
    Ok(Dict {
        keys: Box::new(keys),
        values: Box::new(values),
    })
}

/// Decode one `Value` starting at the current cursor position.
fn read_value(cur: &mut Cursor) -> Result<Value, CodecError> {
    let code = cur.i8()?;
    match code {
        0 => {
            let count = cur.u32()? as usize;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read_value(cur)?);
            }
            Ok(Value::Mixed(items))
        }
        TABLE_CODE => Ok(Value::Table(read_table(cur)?)),
        DICT_CODE => Ok(Value::Dict(read_dict(cur)?)),
        NULLARY_CODE => Ok(Value::Mixed(Vec::new())),
        ERROR_CODE => {
            let len = cur.u32()? as usize;
            let raw = cur.take(len)?;
            let msg = String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8 { field: "error message" })?;
            Ok(Value::Error(msg))
        }
        c if c > 0 => {
            let kind = Kind::from_code(c).ok_or(CodecError::UnknownTypeCode(c))?;
            let (vector, attr) = read_vector(cur, kind)?;
            Ok(Value::Vector(vector, attr))
        }
        c => {
            let kind = Kind::from_code(c).ok_or(CodecError::UnknownTypeCode(c))?;
            if kind == Kind::Symbol {
                let s = cur.cstr()?;
                return Ok(if s.is_empty() {
                    Value::Null(Kind::Symbol)
                } else {
                    Value::Scalar(Scalar::Symbol(s))
                });
            }
            let payload_start = cur.pos;
            let width = kind.fixed_width().expect("non-symbol kinds are fixed-width");
            cur.require(width)?;
            let is_null = scalar_is_null(kind, payload_start, cur.bytes, cur.endianness);
            let scalar = read_scalar(cur, kind)?;
            debug_assert_eq!(cur.pos, payload_start + width);
            if is_null {
                Ok(Value::Null(kind))
            } else {
                Ok(Value::Scalar(scalar))
            }
        }
    }
}

fn read_value_with_len(bytes: &[u8], endianness: Endianness) -> Result<(Value, usize), CodecError> {
    let mut cur = Cursor::new(bytes, endianness);
    let value = read_value(&mut cur)?;
    Ok((value, cur.pos))
}

/// Decode a top-level [`Value`] from `bytes` (no frame header — see
/// [`super::frame`] and [`super::decode_message`]), honoring the byte
/// order `endianness` declares for this message's multi-byte fields.
/// Returns an error if trailing bytes remain after one complete value is
/// read.
pub fn decode_value(bytes: &[u8], endianness: Endianness) -> Result<Value, CodecError> {
    let (value, consumed) = read_value_with_len(bytes, endianness)?;
    if consumed != bytes.len() {
        return Err(CodecError::LengthMismatch {
            declared: bytes.len(),
            actual: consumed,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode::encode_value;
    use crate::value::{Attr, Scalar};

    fn round_trip(v: Value) {
        let bytes = encode_value(&v);
        assert_eq!(decode_value(&bytes, Endianness::Little).unwrap(), v);
    }

    #[test]
    fn round_trips_scalars() {
        round_trip(Value::Scalar(Scalar::Long(7)));
        round_trip(Value::Scalar(Scalar::Symbol("AAPL".into())));
        round_trip(Value::Null(Kind::Float));
        round_trip(Value::Null(Kind::Symbol));
    }

    #[test]
    fn round_trips_vector_with_nulls() {
        round_trip(Value::Vector(Vector::Int(vec![Some(1), None, Some(3)]), Attr::None));
        round_trip(Value::Vector(
            Vector::Symbol(vec![Some("a".into()), None]),
            Attr::Sorted,
        ));
    }

    #[test]
    fn round_trips_table() {
        let t = Table::new(vec![
            ("px".into(), Vector::Float(vec![Some(1.5), None])),
            ("sym".into(), Vector::Symbol(vec![Some("X".into()), Some("Y".into())])),
        ]);
        round_trip(Value::Table(t));
    }

    #[test]
    fn round_trips_dict() {
        let d = Dict {
            keys: Box::new(Value::Vector(Vector::Symbol(vec![Some("a".into())]), Attr::None)),
            values: Box::new(Value::Vector(Vector::Long(vec![Some(1)]), Attr::None)),
        };
        round_trip(Value::Dict(d));
    }

    #[test]
    fn round_trips_error() {
        round_trip(Value::Error("type".into()));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = encode_value(&Value::Scalar(Scalar::Long(1)));
        bytes.push(0xFF);
        assert!(decode_value(&bytes, Endianness::Little).is_err());
    }

    #[test]
    fn honors_declared_big_endian_on_decode() {
        // A scalar Long(7): type code -7 (Kind::Long, scalar form), then
        // its 8-byte payload written in big-endian order.
        let bytes: Vec<u8> = vec![(-7i8) as u8, 0, 0, 0, 0, 0, 0, 0, 7];
        assert_eq!(
            decode_value(&bytes, Endianness::Big).unwrap(),
            Value::Scalar(Scalar::Long(7))
        );
        // The same bytes read as little-endian decode to a different value.
        assert_ne!(
            decode_value(&bytes, Endianness::Little).unwrap(),
            Value::Scalar(Scalar::Long(7))
        );
    }
}
