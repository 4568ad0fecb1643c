//! GZIP block bodies (RFC 1952) via `flate2`.

use oxihts_core::error::{HtsCodecError, Result};
use std::io::{Read, Write};

/// Default deflate effort when the caller does not choose one.
pub const DEFAULT_LEVEL: u32 = 6;

/// Compress `data` at the given level (0-9).
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(level.min(9)));
    encoder
        .write_all(data)
        .map_err(|e| HtsCodecError::compression(format!("gzip encode: {e}")))?;
    encoder
        .finish()
        .map_err(|e| HtsCodecError::compression(format!("gzip encode: {e}")))
}

/// Decompress a gzip stream.
pub fn uncompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::MultiGzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| HtsCodecError::compression(format!("gzip decode: {e}")))?;
    Ok(out)
}
