//! Block compression for frame bodies: an LZ-family scheme with an 8-way
//! control byte (one bit per following literal/back-reference decision,
//! LSB first) and a 256-entry hash table of recent 2-byte runs, matching
//! the shape spec.md §4.1 describes for this protocol's wire compression.
//!
//! There's no teacher analogue for a compressor (`qail-pg` never
//! compresses its wire format), so this is grounded directly on that
//! description: a back-reference is a `(hash-index, extra-length)` pair —
//! the hash-index byte doubles as the table slot the decoder looks up
//! (both sides maintain the same 256-entry table as they produce the same
//! output, so no separate distance needs to cross the wire), and the
//! second byte extends the match past its guaranteed 2-byte minimum.

use crate::error::CodecError;

const HASH_SIZE: usize = 256;
const MIN_MATCH: usize = 2;
const MAX_EXTRA: usize = 255;

/// Fold the two bytes just produced into a table slot. Both the
/// compressor and decompressor compute this identically as they go, so a
/// back-reference only needs to carry the slot index, not a raw distance.
fn hash2(b0: u8, b1: u8) -> u8 {
    ((b0 as u32).wrapping_mul(2654435761) ^ (b1 as u32).wrapping_mul(2246822519)).wrapping_shr(24) as u8
}

/// Compress `input`, returning a buffer whose first 4 bytes (little-endian)
/// are the decompressed length, followed by the compressed body. Callers
/// compare compressed-with-header size against the original and only set
/// the frame's compression flag when it's smaller, per spec.md §4.1.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() / 2 + 16);
    out.extend_from_slice(&(input.len() as u32).to_le_bytes());

    let mut table: [Option<usize>; HASH_SIZE] = [None; HASH_SIZE];
    let mut pos = 0usize;
    let mut flag_pos: Option<usize> = None;
    let mut flag_bits = 0u8;
    let mut bit_index = 0u8;

    macro_rules! push_token {
        ($is_match:expr) => {{
            if flag_pos.is_none() {
                flag_pos = Some(out.len());
                out.push(0);
                bit_index = 0;
                flag_bits = 0;
            }
            if $is_match {
                flag_bits |= 1 << bit_index;
            }
            bit_index += 1;
            if bit_index == 8 {
                let fp = flag_pos.take().unwrap();
                out[fp] = flag_bits;
            }
        }};
    }

    while pos < input.len() {
        let mut found: Option<(u8, usize, usize)> = None; // (hash, candidate, extra)
        if pos + MIN_MATCH <= input.len() {
            let h = hash2(input[pos], input[pos + 1]);
            if let Some(cand) = table[h as usize] {
                if input[cand] == input[pos] && input[cand + 1] == input[pos + 1] {
                    let mut extra = 0usize;
                    let mut p = cand + 2;
                    let mut j = pos + 2;
                    while extra < MAX_EXTRA && j < input.len() && p < pos && input[p] == input[j] {
                        extra += 1;
                        p += 1;
                        j += 1;
                    }
                    found = Some((h, cand, extra));
                }
            }
            table[h as usize] = Some(pos);
        }

        match found {
            Some((h, _cand, extra)) => {
                push_token!(true);
                out.push(h);
                out.push(extra as u8);
                let matched = MIN_MATCH + extra;
                // Keep the table current for every 2-byte window the match
                // steps over, the same as a literal-by-literal walk would.
                for step in 1..matched {
                    if pos + step + 1 < input.len() {
                        let hh = hash2(input[pos + step], input[pos + step + 1]);
                        table[hh as usize] = Some(pos + step);
                    }
                }
                pos += matched;
            }
            None => {
                push_token!(false);
                out.push(input[pos]);
                pos += 1;
            }
        }
    }
    if let Some(fp) = flag_pos {
        out[fp] = flag_bits;
    }
    out
}

/// Inverse of [`compress`]. `input` must begin with the 4-byte
/// decompressed-length prefix `compress` writes.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    if input.len() < 4 {
        return Err(CodecError::Compression("missing length prefix".into()));
    }
    let expected_len = u32::from_le_bytes(input[0..4].try_into().unwrap()) as usize;
    let mut body = &input[4..];
    let mut out = Vec::with_capacity(expected_len);
    let mut table: [Option<usize>; HASH_SIZE] = [None; HASH_SIZE];

    while out.len() < expected_len {
        if body.is_empty() {
            return Err(CodecError::Compression("truncated flag byte".into()));
        }
        let flags = body[0];
        body = &body[1..];
        for bit in 0..8 {
            if out.len() >= expected_len {
                break;
            }
            let is_match = (flags >> bit) & 1 != 0;
            if is_match {
                if body.len() < 2 {
                    return Err(CodecError::Compression("truncated back-reference".into()));
                }
                let hash_index = body[0];
                let extra = body[1] as usize;
                body = &body[2..];
                let start = table[hash_index as usize].ok_or_else(|| {
                    CodecError::Compression(format!("back-reference to empty hash slot {hash_index}"))
                })?;
                if start + 1 >= out.len() {
                    return Err(CodecError::Compression("back-reference points past produced output".into()));
                }
                let run = MIN_MATCH + extra;
                for i in 0..run {
                    let b = out[start + i];
                    out.push(b);
                    if out.len() >= 2 {
                        let n = out.len();
                        let h = hash2(out[n - 2], out[n - 1]);
                        table[h as usize] = Some(n - 2);
                    }
                }
            } else {
                if body.is_empty() {
                    return Err(CodecError::Compression("truncated literal byte".into()));
                }
                out.push(body[0]);
                body = &body[1..];
                if out.len() >= 2 {
                    let n = out.len();
                    let h = hash2(out[n - 2], out[n - 1]);
                    table[h as usize] = Some(n - 2);
                }
            }
        }
    }

    if out.len() != expected_len {
        return Err(CodecError::Compression(format!(
            "expected {expected_len} decompressed bytes, got {}",
            out.len()
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_repetitive_input() {
        let input = b"abcabcabcabcabcabcabcabcabcabcXYZ".repeat(8);
        let compressed = compress(&input);
        let restored = decompress(&compressed).unwrap();
        assert_eq!(restored, input);
    }

    #[test]
    fn round_trips_short_input() {
        let input = b"hi";
        let compressed = compress(input);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn round_trips_incompressible_input() {
        let input: Vec<u8> = (0u8..=255).cycle().take(600).collect();
        let compressed = compress(&input);
        assert_eq!(decompress(&compressed).unwrap(), input);
    }

    #[test]
    fn round_trips_empty_input() {
        let compressed = compress(&[]);
        assert_eq!(decompress(&compressed).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_back_reference_into_empty_table() {
        let mut bogus = (2u32).to_le_bytes().to_vec();
        bogus.push(0b0000_0001);
        bogus.push(0); // hash slot never populated
        bogus.push(0); // extra
        assert!(decompress(&bogus).is_err());
    }
}
