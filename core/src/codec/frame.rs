//! The 8-byte frame header every message is wrapped in, and the
//! compression envelope layered inside it.
//!
//! Grounded on `qail-pg/src/protocol/encoder.rs`'s per-message encode
//! functions, which each open with a fixed-size header written before the
//! variable-length body — the same "reserve header, write body, backfill
//! length" shape, generalized from Postgres's 1-byte-tag-plus-`i32`-length
//! framing to this protocol's 8-byte header.

use crate::error::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Fire-and-forget; no response expected.
    Async,
    /// Request expecting a response on the same connection.
    Sync,
    /// A response to a prior `Sync` request.
    Response,
}

impl MessageKind {
    const fn wire_tag(self) -> u8 {
        match self {
            MessageKind::Async => 0,
            MessageKind::Sync => 1,
            MessageKind::Response => 2,
        }
    }

    fn from_wire_tag(tag: u8) -> Result<MessageKind, CodecError> {
        match tag {
            0 => Ok(MessageKind::Async),
            1 => Ok(MessageKind::Sync),
            2 => Ok(MessageKind::Response),
            other => Err(CodecError::Unsupported(
                Box::leak(format!("unknown message kind tag {other}").into_boxed_str()),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub endianness: Endianness,
    pub kind: MessageKind,
    pub compressed: bool,
    /// Total frame length in bytes, header included.
    pub length: u32,
}

pub const HEADER_LEN: usize = 8;

impl FrameHeader {
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(match self.endianness {
            Endianness::Little => 1,
            Endianness::Big => 0,
        });
        out.push(self.kind.wire_tag());
        out.push(self.compressed as u8);
        out.push(0); // reserved
        match self.endianness {
            Endianness::Little => out.extend_from_slice(&self.length.to_le_bytes()),
            Endianness::Big => out.extend_from_slice(&self.length.to_be_bytes()),
        }
    }

    pub fn parse(bytes: &[u8]) -> Result<FrameHeader, CodecError> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let endianness = if bytes[0] == 1 { Endianness::Little } else { Endianness::Big };
        let kind = MessageKind::from_wire_tag(bytes[1])?;
        let compressed = bytes[2] != 0;
        let length = match endianness {
            Endianness::Little => u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            Endianness::Big => u32::from_be_bytes(bytes[4..8].try_into().unwrap()),
        };
        Ok(FrameHeader {
            endianness,
            kind,
            compressed,
            length,
        })
    }
}
