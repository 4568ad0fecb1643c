//! The Nx16 block format: N-way rANS plus optional byte transforms.
//!
//! Stream layout:
//!
//! ```text
//! flags:u8 | [ulen:uint7 unless NOSZ] | [pack-meta] | [rle-meta] | body
//! ```
//!
//! Striping replaces everything after `ulen` with
//! `K:u8 | clen_1..clen_K:uint7 | substream_1..substream_K` where each
//! substream is itself a complete Nx16 stream carrying elements
//! `i*K + j` of the input.
//!
//! On the compress path pack is applied first, then RLE, then the entropy
//! coder; CAT and EXT replace the entropy stage with literal bytes or a
//! BZIP2 stream respectively.

use crate::coder;
use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};
use oxihts_core::varint::{read_uint7, write_uint7};
use oxihts_transform::{pack, rle, stripe};
use std::io::{Read, Write};

/// Order-1 context modelling.
pub const ORDER: u8 = 0x01;
/// 32 lanes instead of 4.
pub const N32: u8 = 0x02;
/// Body is a BZIP2 stream.
pub const EXT: u8 = 0x04;
/// K-way interleaved sub-streams.
pub const STRIPE: u8 = 0x08;
/// Uncompressed size is supplied out of band.
pub const NOSZ: u8 = 0x10;
/// Body is literal bytes.
pub const CAT: u8 = 0x20;
/// Run-length split before entropy coding.
pub const RLE: u8 = 0x40;
/// Dense-index bit packing before everything else.
pub const PACK: u8 = 0x80;

fn lane_count(flags: u8) -> usize {
    if flags & N32 != 0 { 32 } else { 4 }
}

/// Compress `data` under the given format flags.
///
/// The PACK flag is cleared from the emitted header when the input uses
/// more than 16 distinct byte values.
pub fn encode(flags: u8, data: &[u8]) -> Result<Vec<u8>> {
    let n = lane_count(flags);

    // At most one of CAT, EXT and RLE is meaningful; keep the strongest so
    // the emitted header always matches the body actually written.
    let mut flags = flags;
    if flags & CAT != 0 {
        flags &= !(EXT | RLE);
    } else if flags & EXT != 0 {
        flags &= !RLE;
    }

    if flags & STRIPE != 0 {
        return encode_striped(flags, data, n);
    }
    let mut packed = None;
    if flags & PACK != 0 {
        match pack::pack(data) {
            Some(result) => packed = Some(result),
            None => flags &= !PACK,
        }
    }

    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    out.push(flags);
    if flags & NOSZ == 0 {
        write_uint7(&mut out, data.len() as u32);
    }

    let work: &[u8] = match &packed {
        Some((meta, packed_bytes)) => {
            out.push(meta.symbols.len() as u8);
            out.extend_from_slice(&meta.symbols);
            write_uint7(&mut out, packed_bytes.len() as u32);
            packed_bytes
        }
        None => data,
    };

    if flags & CAT != 0 {
        out.extend_from_slice(work);
    } else if flags & EXT != 0 {
        out.extend_from_slice(&bzip2_compress(work)?);
    } else if flags & RLE != 0 {
        let (literals, meta) = rle::split(work);
        // The metadata is itself worth entropy coding when large.
        let compressed_meta = encode(NOSZ, &meta)?;
        if compressed_meta.len() < meta.len() {
            write_uint7(&mut out, (meta.len() as u32) << 1);
            write_uint7(&mut out, literals.len() as u32);
            write_uint7(&mut out, compressed_meta.len() as u32);
            out.extend_from_slice(&compressed_meta);
        } else {
            write_uint7(&mut out, ((meta.len() as u32) << 1) | 1);
            write_uint7(&mut out, literals.len() as u32);
            out.extend_from_slice(&meta);
        }
        out.extend_from_slice(&entropy_encode(flags, &literals, n)?);
    } else {
        out.extend_from_slice(&entropy_encode(flags, work, n)?);
    }

    Ok(out)
}

fn encode_striped(flags: u8, data: &[u8], n: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    out.push(flags);
    if flags & NOSZ == 0 {
        write_uint7(&mut out, data.len() as u32);
    }

    let sub_flags = (flags & !STRIPE) | NOSZ;
    let parts = stripe::split(data, n);
    let mut streams = Vec::with_capacity(n);
    for part in &parts {
        streams.push(encode(sub_flags, part)?);
    }

    out.push(n as u8);
    for stream in &streams {
        write_uint7(&mut out, stream.len() as u32);
    }
    for stream in &streams {
        out.extend_from_slice(stream);
    }
    Ok(out)
}

fn entropy_encode(flags: u8, data: &[u8], n: usize) -> Result<Vec<u8>> {
    if data.is_empty() {
        Ok(Vec::new())
    } else if flags & ORDER != 0 {
        coder::encode_order1(data, n)
    } else {
        coder::encode_order0(data, n)
    }
}

/// Decompress an Nx16 stream. `known_len` supplies the output size for
/// NOSZ streams.
pub fn decode(src: &[u8], known_len: Option<usize>) -> Result<Vec<u8>> {
    let mut cur = ByteCursor::new(src);
    let flags = cur.read_u8()?;
    let n = lane_count(flags);

    let len = if flags & NOSZ != 0 {
        known_len.ok_or_else(|| {
            HtsCodecError::malformed_header("no-size stream decoded without an expected length")
        })?
    } else {
        read_uint7(&mut cur)? as usize
    };

    if flags & STRIPE != 0 {
        return decode_striped(&mut cur, len);
    }

    let mut pack_meta = None;
    let mut stage_len = len;
    if flags & PACK != 0 {
        let n_sym = usize::from(cur.read_u8()?);
        let symbols = cur.take(n_sym)?.to_vec();
        stage_len = read_uint7(&mut cur)? as usize;
        pack_meta = Some(pack::PackMeta { symbols });
    }
    let packed_len = stage_len;

    let mut rle_meta = None;
    if flags & RLE != 0 {
        let meta_len = read_uint7(&mut cur)?;
        stage_len = read_uint7(&mut cur)? as usize;
        let meta = if meta_len & 1 != 0 {
            cur.take((meta_len >> 1) as usize)?.to_vec()
        } else {
            let comp_len = read_uint7(&mut cur)? as usize;
            decode(cur.take(comp_len)?, Some((meta_len >> 1) as usize))?
        };
        rle_meta = Some(meta);
    }

    let mut data = if flags & CAT != 0 {
        cur.take(stage_len)?.to_vec()
    } else if flags & EXT != 0 {
        bzip2_decompress(cur.take(cur.remaining())?)?
    } else if stage_len == 0 {
        Vec::new()
    } else if flags & ORDER != 0 {
        coder::decode_order1(&mut cur, stage_len, n)?
    } else {
        coder::decode_order0(&mut cur, stage_len, n)?
    };

    if let Some(meta) = rle_meta {
        data = rle::expand(&data, &meta)?;
        if data.len() != packed_len {
            return Err(HtsCodecError::malformed_header(format!(
                "run-length expansion produced {} bytes, expected {packed_len}",
                data.len()
            )));
        }
    }
    if let Some(meta) = pack_meta {
        data = pack::unpack(&meta, &data, len)?;
    }

    if data.len() != len {
        return Err(HtsCodecError::malformed_header(format!(
            "decoded {} bytes, expected {len}",
            data.len()
        )));
    }
    Ok(data)
}

fn decode_striped(cur: &mut ByteCursor<'_>, len: usize) -> Result<Vec<u8>> {
    let k = usize::from(cur.read_u8()?);
    if k == 0 {
        return Err(HtsCodecError::malformed_header("stripe with zero sub-streams"));
    }
    let mut clens = Vec::with_capacity(k);
    for _ in 0..k {
        clens.push(read_uint7(cur)? as usize);
    }
    let mut parts = Vec::with_capacity(k);
    for (j, &clen) in clens.iter().enumerate() {
        let part_len = len / k + usize::from(j < len % k);
        parts.push(decode(cur.take(clen)?, Some(part_len))?);
    }
    stripe::merge(&parts, len)
}

pub(crate) fn bzip2_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| HtsCodecError::compression(format!("bzip2 encode: {e}")))?;
    encoder
        .finish()
        .map_err(|e| HtsCodecError::compression(format!("bzip2 encode: {e}")))
}

pub(crate) fn bzip2_decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    bzip2::read::BzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| HtsCodecError::compression(format!("bzip2 decode: {e}")))?;
    Ok(out)
}
