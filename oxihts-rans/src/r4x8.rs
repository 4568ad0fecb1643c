//! The fixed 4-way byte-renormalizing rANS block format.
//!
//! Stream layout:
//!
//! ```text
//! order:u8 | clen:u32le | ulen:u32le | freqs | body
//! ```
//!
//! where `clen` counts the `freqs | body` bytes and `ulen` the raw input.
//! An empty input is a bare 9-byte header with both lengths zero.

use crate::coder;
use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};

/// Number of interleaved lanes in this format.
const LANES: usize = 4;

/// Compress `data` with the given order (0 or 1).
pub fn encode(order: u8, data: &[u8]) -> Result<Vec<u8>> {
    if order > 1 {
        return Err(HtsCodecError::value_out_of_range(format!(
            "rANS 4x8 order must be 0 or 1, got {order}"
        )));
    }
    let ulen = u32::try_from(data.len()).map_err(|_| {
        HtsCodecError::value_out_of_range("rANS 4x8 input exceeds 4 GiB".to_string())
    })?;

    let payload = if data.is_empty() {
        Vec::new()
    } else if order == 1 {
        coder::encode_order1(data, LANES)?
    } else {
        coder::encode_order0(data, LANES)?
    };

    let mut out = Vec::with_capacity(9 + payload.len());
    out.push(order);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&ulen.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decompress a 4x8 block.
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    let mut cur = ByteCursor::new(src);
    let order = cur.read_u8()?;
    if order > 1 {
        return Err(HtsCodecError::malformed_header(format!(
            "rANS 4x8 order byte {order} unknown"
        )));
    }
    let clen = cur.read_u32_le()? as usize;
    let ulen = cur.read_u32_le()? as usize;
    if cur.remaining() < clen {
        return Err(HtsCodecError::unexpected_eof(clen - cur.remaining()));
    }
    if ulen == 0 {
        return Ok(Vec::new());
    }

    let mut body = ByteCursor::new(cur.take(clen)?);
    if order == 1 {
        coder::decode_order1(&mut body, ulen, LANES)
    } else {
        coder::decode_order0(&mut body, ulen, LANES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(order: u8, data: &[u8]) {
        let encoded = encode(order, data).unwrap();
        assert_eq!(decode(&encoded).unwrap(), data, "order={order}");
    }

    #[test]
    fn test_roundtrip_basics() {
        for order in [0u8, 1] {
            roundtrip(order, b"");
            roundtrip(order, b"A");
            roundtrip(order, b"hello hello hello");
            roundtrip(order, &[0u8; 257]);
            let tail: Vec<u8> = (0..41).map(|i| (i % 5) as u8).collect();
            roundtrip(order, &tail);
        }
    }

    #[test]
    fn test_single_symbol_frequency_table() {
        // Six 'A's: the order-0 table holds exactly one symbol at full
        // weight, serialized as 'A' 0x90 0x00 and the terminator.
        let encoded = encode(0, b"AAAAAA").unwrap();
        assert_eq!(encoded[0], 0);
        let clen = u32::from_le_bytes(encoded[1..5].try_into().unwrap());
        let ulen = u32::from_le_bytes(encoded[5..9].try_into().unwrap());
        assert_eq!(ulen, 6);
        assert_eq!(clen as usize, encoded.len() - 9);
        assert_eq!(&encoded[9..13], &[0x41, 0x90, 0x00, 0x00]);
        assert_eq!(decode(&encoded).unwrap(), b"AAAAAA");
    }

    #[test]
    fn test_empty_block_layout() {
        let encoded = encode(0, b"").unwrap();
        assert_eq!(encoded, vec![0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(decode(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_bad_order_rejected() {
        assert!(encode(2, b"x").is_err());
        let mut encoded = encode(0, b"x").unwrap();
        encoded[0] = 9;
        assert!(decode(&encoded).is_err());
    }

    #[test]
    fn test_truncated_body() {
        let encoded = encode(0, b"hello world").unwrap();
        assert!(decode(&encoded[..encoded.len() - 4]).is_err());
    }

    #[test]
    fn test_corrupt_frequency_sum() {
        let mut encoded = encode(0, b"AAAAAA").unwrap();
        // Drop the single frequency from 4096 to 0x0F00.
        encoded[10] = 0x8F;
        assert!(decode(&encoded).is_err());
    }

    #[test]
    fn test_random_roundtrip() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        let mut rng = StdRng::seed_from_u64(0x3478);
        for _ in 0..8 {
            let len = rng.random_range(0..5000);
            let data: Vec<u8> = (0..len).map(|_| rng.random_range(0..32) as u8).collect();
            roundtrip(0, &data);
            roundtrip(1, &data);
        }
    }
}
