//! BZIP2 block bodies via the `bzip2` crate.

use oxihts_core::error::{HtsCodecError, Result};
use std::io::{Read, Write};

/// Compress `data` with the default block size.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| HtsCodecError::compression(format!("bzip2 encode: {e}")))?;
    encoder
        .finish()
        .map_err(|e| HtsCodecError::compression(format!("bzip2 encode: {e}")))
}

/// Decompress a bzip2 stream.
pub fn uncompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    bzip2::read::BzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| HtsCodecError::compression(format!("bzip2 decode: {e}")))?;
    Ok(out)
}
