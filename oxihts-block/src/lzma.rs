//! LZMA block bodies, carried in xz containers via `liblzma`.

use oxihts_core::error::{HtsCodecError, Result};
use std::io::{Read, Write};

/// Default xz preset when the caller does not choose one.
pub const DEFAULT_PRESET: u32 = 6;

/// Compress `data` at the given preset (0-9).
pub fn compress(data: &[u8], preset: u32) -> Result<Vec<u8>> {
    let mut encoder = liblzma::write::XzEncoder::new(Vec::new(), preset.min(9));
    encoder
        .write_all(data)
        .map_err(|e| HtsCodecError::compression(format!("lzma encode: {e}")))?;
    encoder
        .finish()
        .map_err(|e| HtsCodecError::compression(format!("lzma encode: {e}")))
}

/// Decompress an xz stream.
pub fn uncompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    liblzma::read::XzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| HtsCodecError::compression(format!("lzma decode: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let data = b"The quick brown fox jumps over the lazy dog".repeat(10);
        let compressed = compress(&data, DEFAULT_PRESET).unwrap();
        assert_eq!(uncompress(&compressed).unwrap(), data);
    }

    #[test]
    fn test_empty() {
        let compressed = compress(b"", DEFAULT_PRESET).unwrap();
        assert!(uncompress(&compressed).unwrap().is_empty());
    }
}
