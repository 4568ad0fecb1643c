//! Stream framing for the adaptive arithmetic coder.
//!
//! The prefix matches the rANS Nx16 block: a flags byte, the uncompressed
//! size as uint7 unless NOSZ, then pack metadata when packing is active.
//! The body is range-coded under order-0 or order-1 byte models, with an
//! in-band run-length variant, or is literal bytes (CAT) or a BZIP2
//! stream (EXT). Striping splits into four independently framed
//! sub-streams.

use crate::model::ByteModel;
use crate::range_coder::{RangeDecoder, RangeEncoder};
use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};
use oxihts_core::varint::{read_uint7, write_uint7};
use oxihts_transform::{pack, stripe};
use std::io::{Read, Write};

/// Order-1 context modelling.
pub const ORDER: u8 = 0x01;
/// Body is a BZIP2 stream.
pub const EXT: u8 = 0x04;
/// Four-way interleaved sub-streams.
pub const STRIPE: u8 = 0x08;
/// Uncompressed size is supplied out of band.
pub const NOSZ: u8 = 0x10;
/// Body is literal bytes.
pub const CAT: u8 = 0x20;
/// In-band run-length coding.
pub const RLE: u8 = 0x40;
/// Dense-index bit packing before coding.
pub const PACK: u8 = 0x80;

/// Sub-stream count used when striping.
const STRIPE_WAYS: usize = 4;

/// Run-length parts take values 0-3; 3 means another part follows.
const RUN_PART_MAX: u8 = 3;
/// Run contexts: one per literal byte plus two continuation slots.
const RUN_CONTEXTS: usize = 258;

/// Compress `data` under the given format flags.
///
/// The PACK flag is cleared from the emitted header when the input uses
/// more than 16 distinct byte values.
pub fn encode(flags: u8, data: &[u8]) -> Result<Vec<u8>> {
    let mut flags = flags;
    if flags & CAT != 0 {
        flags &= !(EXT | RLE);
    } else if flags & EXT != 0 {
        flags &= !RLE;
    }

    if flags & STRIPE != 0 {
        return encode_striped(flags, data);
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
    } else if !work.is_empty() {
        if flags & RLE != 0 {
            encode_rle(&mut out, work, flags & ORDER != 0)?;
        } else if flags & ORDER != 0 {
            encode_order1(&mut out, work)?;
        } else {
            encode_order0(&mut out, work)?;
        }
    }

    Ok(out)
}

fn encode_striped(flags: u8, data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    out.push(flags);
    if flags & NOSZ == 0 {
        write_uint7(&mut out, data.len() as u32);
    }

    let sub_flags = (flags & !STRIPE) | NOSZ;
    let parts = stripe::split(data, STRIPE_WAYS);
    let mut streams = Vec::with_capacity(STRIPE_WAYS);
    for part in &parts {
        streams.push(encode(sub_flags, part)?);
    }

    out.push(STRIPE_WAYS as u8);
    for stream in &streams {
        write_uint7(&mut out, stream.len() as u32);
    }
    for stream in &streams {
        out.extend_from_slice(stream);
    }
    Ok(out)
}

/// Decompress an arithmetic-coded stream. `known_len` supplies the output
/// size for NOSZ streams.
pub fn decode(src: &[u8], known_len: Option<usize>) -> Result<Vec<u8>> {
    let mut cur = ByteCursor::new(src);
    let flags = cur.read_u8()?;

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

    let mut data = if flags & CAT != 0 {
        cur.take(stage_len)?.to_vec()
    } else if flags & EXT != 0 {
        bzip2_decompress(cur.take(cur.remaining())?)?
    } else if stage_len == 0 {
        Vec::new()
    } else if flags & RLE != 0 {
        decode_rle(&mut cur, stage_len, flags & ORDER != 0)?
    } else if flags & ORDER != 0 {
        decode_order1(&mut cur, stage_len)?
    } else {
        decode_order0(&mut cur, stage_len)?
    };

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

fn max_symbol(data: &[u8]) -> u8 {
    data.iter().copied().max().unwrap_or(0)
}

fn encode_order0(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let max = max_symbol(data);
    out.push(max);
    let mut model = ByteModel::new(usize::from(max) + 1);
    let mut rc = RangeEncoder::new();
    for &b in data {
        model.encode(&mut rc, out, b)?;
    }
    rc.finish(out);
    Ok(())
}

fn decode_order0(cur: &mut ByteCursor<'_>, len: usize) -> Result<Vec<u8>> {
    let max = cur.read_u8()?;
    let mut model = ByteModel::new(usize::from(max) + 1);
    let mut rc = RangeDecoder::new(cur)?;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(model.decode(&mut rc, cur)?);
    }
    Ok(out)
}

fn encode_order1(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    let max = max_symbol(data);
    out.push(max);
    let alphabet = usize::from(max) + 1;
    let mut models: Vec<ByteModel> = (0..alphabet).map(|_| ByteModel::new(alphabet)).collect();
    let mut rc = RangeEncoder::new();
    let mut ctx = 0usize;
    for &b in data {
        models[ctx].encode(&mut rc, out, b)?;
        ctx = usize::from(b);
    }
    rc.finish(out);
    Ok(())
}

fn decode_order1(cur: &mut ByteCursor<'_>, len: usize) -> Result<Vec<u8>> {
    let max = cur.read_u8()?;
    let alphabet = usize::from(max) + 1;
    let mut models: Vec<ByteModel> = (0..alphabet).map(|_| ByteModel::new(alphabet)).collect();
    let mut rc = RangeDecoder::new(cur)?;
    let mut out = Vec::with_capacity(len);
    let mut ctx = 0usize;
    for _ in 0..len {
        let b = models[ctx].decode(&mut rc, cur)?;
        out.push(b);
        ctx = usize::from(b);
    }
    Ok(out)
}

fn encode_rle(out: &mut Vec<u8>, data: &[u8], order1: bool) -> Result<()> {
    let max = max_symbol(data);
    out.push(max);
    let alphabet = usize::from(max) + 1;
    let lit_contexts = if order1 { alphabet } else { 1 };
    let mut literals: Vec<ByteModel> =
        (0..lit_contexts).map(|_| ByteModel::new(alphabet)).collect();
    let mut runs: Vec<ByteModel> = (0..RUN_CONTEXTS)
        .map(|_| ByteModel::new(usize::from(RUN_PART_MAX) + 1))
        .collect();
    let mut rc = RangeEncoder::new();

    let mut i = 0usize;
    let mut last = 0usize;
    while i < data.len() {
        let byte = data[i];
        let lit_ctx = if order1 { last } else { 0 };
        literals[lit_ctx].encode(&mut rc, out, byte)?;
        last = usize::from(byte);

        let mut extra = 0usize;
        while i + 1 + extra < data.len() && data[i + 1 + extra] == byte {
            extra += 1;
        }
        i += 1 + extra;

        // The run length is a sum of 2-bit parts; part 3 chains to the
        // continuation contexts 256 then 257.
        let mut remaining = extra;
        let mut run_ctx = usize::from(byte);
        loop {
            let part = remaining.min(usize::from(RUN_PART_MAX)) as u8;
            runs[run_ctx].encode(&mut rc, out, part)?;
            remaining -= usize::from(part);
            if part < RUN_PART_MAX {
                break;
            }
            run_ctx = if run_ctx == 256 || run_ctx == 257 { 257 } else { 256 };
        }
    }
    rc.finish(out);
    Ok(())
}

fn decode_rle(cur: &mut ByteCursor<'_>, len: usize, order1: bool) -> Result<Vec<u8>> {
    let max = cur.read_u8()?;
    let alphabet = usize::from(max) + 1;
    let lit_contexts = if order1 { alphabet } else { 1 };
    let mut literals: Vec<ByteModel> =
        (0..lit_contexts).map(|_| ByteModel::new(alphabet)).collect();
    let mut runs: Vec<ByteModel> = (0..RUN_CONTEXTS)
        .map(|_| ByteModel::new(usize::from(RUN_PART_MAX) + 1))
        .collect();
    let mut rc = RangeDecoder::new(cur)?;

    let mut out = Vec::with_capacity(len);
    let mut last = 0usize;
    while out.len() < len {
        let lit_ctx = if order1 { last } else { 0 };
        let byte = literals[lit_ctx].decode(&mut rc, cur)?;
        last = usize::from(byte);

        let mut extra = 0usize;
        let mut run_ctx = usize::from(byte);
        loop {
            let part = runs[run_ctx].decode(&mut rc, cur)?;
            extra += usize::from(part);
            if part < RUN_PART_MAX {
                break;
            }
            run_ctx = if run_ctx == 256 || run_ctx == 257 { 257 } else { 256 };
        }

        if out.len() + 1 + extra > len {
            return Err(HtsCodecError::malformed_header(
                "run-length output exceeds declared size",
            ));
        }
        for _ in 0..=extra {
            out.push(byte);
        }
    }
    Ok(out)
}

fn bzip2_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| HtsCodecError::compression(format!("bzip2 encode: {e}")))?;
    encoder
        .finish()
        .map_err(|e| HtsCodecError::compression(format!("bzip2 encode: {e}")))
}

fn bzip2_decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    bzip2::read::BzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| HtsCodecError::compression(format!("bzip2 decode: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(flags: u8, data: &[u8]) {
        let encoded = encode(flags, data).unwrap();
        let known = if flags & NOSZ != 0 { Some(data.len()) } else { None };
        assert_eq!(
            decode(&encoded, known).unwrap(),
            data,
            "flags={flags:#010b} len={}",
            data.len()
        );
    }

    fn sample_inputs() -> Vec<Vec<u8>> {
        vec![
            Vec::new(),
            b"h".to_vec(),
            b"hello".to_vec(),
            b"aaaaaaaaaabbbbbbbbbbcccccccccc".to_vec(),
            (0..1001).map(|i| (i % 19) as u8).collect(),
            vec![0xFF; 300],
        ]
    }

    #[test]
    fn test_all_required_combinations() {
        // order x rle x pack x stripe, per the round-trip matrix.
        for data in sample_inputs() {
            for order in [0, ORDER] {
                for rle in [0, RLE] {
                    for pack_flag in [0, PACK] {
                        for stripe_flag in [0, STRIPE] {
                            roundtrip(order | rle | pack_flag | stripe_flag, &data);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_cat_and_external() {
        for data in sample_inputs() {
            roundtrip(CAT, &data);
            roundtrip(EXT, &data);
        }
    }

    #[test]
    fn test_nosz() {
        let data = b"sized elsewhere";
        let encoded = encode(NOSZ, data).unwrap();
        assert!(decode(&encoded, None).is_err());
        assert_eq!(decode(&encoded, Some(data.len())).unwrap(), data);
    }

    #[test]
    fn test_deterministic_output() {
        let a = encode(ORDER, b"hello").unwrap();
        let b = encode(ORDER, b"hello").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_long_runs_cross_continuation_contexts() {
        // Runs long enough to chain 3-parts through contexts 256 and 257.
        let mut data = Vec::new();
        for i in 0..10 {
            data.extend(std::iter::repeat_n((i % 3) as u8, 1 + i * 37));
        }
        roundtrip(RLE, &data);
        roundtrip(RLE | ORDER, &data);
    }

    #[test]
    fn test_pack_flag_cleared_for_wide_alphabet() {
        let data: Vec<u8> = (0..40).collect();
        let encoded = encode(PACK, &data).unwrap();
        assert_eq!(encoded[0] & PACK, 0);
        assert_eq!(decode(&encoded, None).unwrap(), data);
    }

    #[test]
    fn test_random_roundtrip() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        let mut rng = StdRng::seed_from_u64(0xA17);
        for _ in 0..30 {
            let len = rng.random_range(0..1500);
            let spread: u8 = [2, 8, 255][rng.random_range(0..3)];
            let data: Vec<u8> = (0..len).map(|_| rng.random_range(0..spread)).collect();
            let flags = rng.random::<u8>() & (ORDER | PACK | RLE | STRIPE);
            roundtrip(flags, &data);
        }
    }
}
