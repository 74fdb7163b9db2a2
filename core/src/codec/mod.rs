//! Wire codec: frame header, compression envelope, and value encode/decode,
//! composed into whole-message `encode_message`/`decode_message` pairs.

pub mod compress;
pub mod decode;
pub mod encode;
pub mod frame;

use crate::error::{CodecError, Error};
use crate::value::Value;
use frame::{Endianness, FrameHeader, MessageKind, HEADER_LEN};

/// Below this body size, compression is skipped even if requested — the
/// header and control-byte overhead would net-lose against small bodies.
const COMPRESSION_THRESHOLD: usize = 64;

/// Encode `value` as a complete framed message: header, then (optionally
/// compressed) body.
pub fn encode_message(value: &Value, kind: MessageKind, compress_if_smaller: bool) -> Vec<u8> {
    let body = encode::encode_value(value);
    let (compressed, use_compressed_flag) = if compress_if_smaller && body.len() >= COMPRESSION_THRESHOLD {
        let packed = compress::compress(&body);
        if packed.len() < body.len() {
            (packed, true)
        } else {
            (body, false)
        }
    } else {
        (body, false)
    };

    let header = FrameHeader {
        endianness: Endianness::Little,
        kind,
        compressed: use_compressed_flag,
        length: (HEADER_LEN + compressed.len()) as u32,
    };
    let mut out = Vec::with_capacity(header.length as usize);
    header.write(&mut out);
    out.extend_from_slice(&compressed);
    out
}

/// Decode a complete framed message (header + body) into its `Value` and
/// the header's `MessageKind`.
pub fn decode_message(bytes: &[u8]) -> Result<(Value, MessageKind), Error> {
    let header = FrameHeader::parse(bytes)?;
    if bytes.len() < header.length as usize {
        return Err(CodecError::Truncated {
            expected: header.length as usize,
            actual: bytes.len(),
        }
        .into());
    }
    let body = &bytes[HEADER_LEN..header.length as usize];
    let decoded_body;
    let plain_body = if header.compressed {
        decoded_body = compress::decompress(body)?;
        &decoded_body[..]
    } else {
        body
    };
    let value = decode::decode_value(plain_body, header.endianness)?;
    Ok((value, header.kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Scalar, Vector};

    #[test]
    fn small_message_round_trips_uncompressed() {
        let v = Value::Scalar(Scalar::Long(99));
        let bytes = encode_message(&v, MessageKind::Sync, true);
        let (decoded, kind) = decode_message(&bytes).unwrap();
        assert_eq!(decoded, v);
        assert_eq!(kind, MessageKind::Sync);
    }

    #[test]
    fn large_repetitive_message_compresses_and_round_trips() {
        let v = Value::Vector(Vector::Long((0..500).map(|i| Some(i % 3)).collect()), crate::value::Attr::None);
        let bytes = encode_message(&v, MessageKind::Response, true);
        let (decoded, _) = decode_message(&bytes).unwrap();
        assert_eq!(decoded, v);
    }
}
