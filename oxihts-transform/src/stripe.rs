//! Stripe interleaving.
//!
//! Striping splits a stream into K sub-streams by index modulo K, so that
//! byte `i` of the input lands in sub-stream `i % K`. Each sub-stream is
//! then compressed independently; columns of structured data (fixed-width
//! integers, quality ladders) compress far better this way.

use oxihts_core::error::{HtsCodecError, Result};

/// Split `data` into `k` interleaved sub-streams.
pub fn split(data: &[u8], k: usize) -> Vec<Vec<u8>> {
    let mut parts: Vec<Vec<u8>> = (0..k)
        .map(|_| Vec::with_capacity(data.len() / k + 1))
        .collect();
    for (i, &byte) in data.iter().enumerate() {
        parts[i % k].push(byte);
    }
    parts
}

/// Reassemble `n` bytes from interleaved sub-streams.
pub fn merge(parts: &[Vec<u8>], n: usize) -> Result<Vec<u8>> {
    let k = parts.len();
    if k == 0 {
        return if n == 0 {
            Ok(Vec::new())
        } else {
            Err(HtsCodecError::malformed_header("stripe with zero sub-streams"))
        };
    }

    for (j, part) in parts.iter().enumerate() {
        let expected = n / k + usize::from(j < n % k);
        if part.len() != expected {
            return Err(HtsCodecError::malformed_header(format!(
                "stripe sub-stream {j} has {} bytes, expected {expected}",
                part.len()
            )));
        }
    }

    let mut out = vec![0u8; n];
    for (j, part) in parts.iter().enumerate() {
        for (i, &byte) in part.iter().enumerate() {
            out[i * k + j] = byte;
        }
    }
    Ok(out)
}
