//! The interleaved rANS lane machinery shared by the 4x8 and Nx16 framings.
//!
//! N parallel 32-bit states own contiguous segments of the input: lane `j`
//! covers `[j*(len/N), (j+1)*(len/N))` and the last lane also the
//! remainder. The decoder advances all lanes in lock-step rounds, one
//! symbol per lane per round, then drains the tail on the last lane. The
//! encoder replays that schedule in exact reverse into a scratch buffer
//! and reverses it, so renormalization bytes interleave precisely as the
//! decoder will consume them and the flushed states surface at the stream
//! head, lane 0 first, little-endian.

use crate::freq::{FreqTable, TOTAL_FREQ, TOTAL_FREQ_SHIFT, normalize_counts, read_freqs, write_freqs};
use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};

/// Renormalization lower bound: states live in `[1<<23, 1<<31)`.
pub const LOWER_BOUND: u32 = 1 << 23;

/// Encoder-side lane state.
#[derive(Debug, Clone, Copy)]
struct EncState(u32);

impl EncState {
    fn new() -> Self {
        Self(LOWER_BOUND)
    }

    /// Push one symbol, spilling low bytes while the state is too large to
    /// stay invertible for this frequency.
    #[inline]
    fn put(&mut self, rev: &mut Vec<u8>, cum: u32, freq: u32) {
        let x_max = ((LOWER_BOUND >> TOTAL_FREQ_SHIFT) << 8) * freq;
        let mut x = self.0;
        while x >= x_max {
            rev.push(x as u8);
            x >>= 8;
        }
        self.0 = ((x / freq) << TOTAL_FREQ_SHIFT) + (x % freq) + cum;
    }

    /// Spill the final state, big-endian so the whole-buffer reversal
    /// leaves it little-endian for the decoder.
    fn flush(self, rev: &mut Vec<u8>) {
        let x = self.0;
        rev.extend_from_slice(&[(x >> 24) as u8, (x >> 16) as u8, (x >> 8) as u8, x as u8]);
    }
}

/// Decoder-side lane state.
#[derive(Debug, Clone, Copy)]
struct DecState(u32);

impl DecState {
    fn init(cur: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self(cur.read_u32_le()?))
    }

    #[inline]
    fn slot(&self) -> u32 {
        self.0 & (TOTAL_FREQ - 1)
    }

    #[inline]
    fn advance(&mut self, cur: &mut ByteCursor<'_>, cum: u32, freq: u32) -> Result<()> {
        self.0 = freq * (self.0 >> TOTAL_FREQ_SHIFT) + self.slot() - cum;
        while self.0 < LOWER_BOUND {
            self.0 = (self.0 << 8) | u32::from(cur.read_u8()?);
        }
        Ok(())
    }
}

/// Segment start of lane `j` for an input of `len` bytes over `n` lanes.
#[inline]
fn lane_start(j: usize, len: usize, n: usize) -> usize {
    j * (len / n)
}

/// Encode `data` with order-0 context, returning `freqs | body`.
pub fn encode_order0(data: &[u8], n: usize) -> Result<Vec<u8>> {
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let freq = normalize_counts(&counts);
    let table = FreqTable::from_freqs(freq, 0)?;

    let mut out = Vec::new();
    write_freqs(&mut out, &table.freq);

    let mut rev = Vec::with_capacity(data.len() + 4 * n);
    let mut lanes = vec![EncState::new(); n];
    let seg = data.len() / n;

    for p in (n * seg..data.len()).rev() {
        let s = data[p] as usize;
        lanes[n - 1].put(&mut rev, table.cum[s], table.freq[s]);
    }
    for i in (0..seg).rev() {
        for j in (0..n).rev() {
            let s = data[lane_start(j, data.len(), n) + i] as usize;
            lanes[j].put(&mut rev, table.cum[s], table.freq[s]);
        }
    }
    for j in (0..n).rev() {
        lanes[j].flush(&mut rev);
    }
    rev.reverse();

    out.extend_from_slice(&rev);
    Ok(out)
}

/// Decode `out_len` order-0 bytes from `cur` (freq table first).
pub fn decode_order0(cur: &mut ByteCursor<'_>, out_len: usize, n: usize) -> Result<Vec<u8>> {
    let freq = read_freqs(cur)?;
    let table = FreqTable::from_freqs(freq, 0)?;

    let mut lanes = Vec::with_capacity(n);
    for _ in 0..n {
        lanes.push(DecState::init(cur)?);
    }

    let seg = out_len / n;
    let mut out = vec![0u8; out_len];
    for i in 0..seg {
        for (j, lane) in lanes.iter_mut().enumerate() {
            let s = table.symbol_at(lane.slot());
            out[lane_start(j, out_len, n) + i] = s;
            lane.advance(cur, table.cum[s as usize], table.freq[s as usize])?;
        }
    }
    for slot_pos in n * seg..out_len {
        let lane = &mut lanes[n - 1];
        let s = table.symbol_at(lane.slot());
        out[slot_pos] = s;
        lane.advance(cur, table.cum[s as usize], table.freq[s as usize])?;
    }

    Ok(out)
}

/// Context of the byte at `p` within its lane segment: the previous byte,
/// or 0 at a segment start.
#[inline]
fn order1_context(data: &[u8], p: usize, starts: &[usize]) -> usize {
    if starts.contains(&p) { 0 } else { data[p - 1] as usize }
}

/// Encode `data` with order-1 (previous byte) context.
pub fn encode_order1(data: &[u8], n: usize) -> Result<Vec<u8>> {
    let seg = data.len() / n;
    let starts: Vec<usize> = (0..n).map(|j| lane_start(j, data.len(), n)).collect();

    let mut counts: Vec<[u64; 256]> = vec![[0u64; 256]; 256];
    for j in 0..n {
        let end = if j == n - 1 { data.len() } else { starts[j] + seg };
        let mut ctx = 0usize;
        for p in starts[j]..end {
            counts[ctx][data[p] as usize] += 1;
            ctx = data[p] as usize;
        }
    }

    let mut tables: Vec<Option<FreqTable>> = Vec::with_capacity(256);
    let mut out = Vec::new();
    for (ctx, row) in counts.iter().enumerate() {
        if row.iter().any(|&c| c > 0) {
            let freq = normalize_counts(row);
            tables.push(Some(FreqTable::from_freqs(freq, ctx as u32)?));
        } else {
            tables.push(None);
        }
    }
    write_freqs_order1(&mut out, &tables);

    let mut rev = Vec::with_capacity(data.len() + 4 * n);
    let mut lanes = vec![EncState::new(); n];

    let put = |rev: &mut Vec<u8>, lanes: &mut Vec<EncState>, j: usize, p: usize| -> Result<()> {
        let ctx = order1_context(data, p, &starts);
        let s = data[p] as usize;
        let table = tables[ctx].as_ref().expect("context row was counted");
        if table.freq[s] == 0 {
            return Err(HtsCodecError::malformed_frequencies(ctx as u32, 0, TOTAL_FREQ));
        }
        lanes[j].put(rev, table.cum[s], table.freq[s]);
        Ok(())
    };

    for p in (n * seg..data.len()).rev() {
        put(&mut rev, &mut lanes, n - 1, p)?;
    }
    for i in (0..seg).rev() {
        for j in (0..n).rev() {
            put(&mut rev, &mut lanes, j, starts[j] + i)?;
        }
    }
    for j in (0..n).rev() {
        lanes[j].flush(&mut rev);
    }
    rev.reverse();

    out.extend_from_slice(&rev);
    Ok(out)
}

/// Decode `out_len` order-1 bytes from `cur` (context table set first).
pub fn decode_order1(cur: &mut ByteCursor<'_>, out_len: usize, n: usize) -> Result<Vec<u8>> {
    let tables = read_freqs_order1(cur)?;

    let mut lanes = Vec::with_capacity(n);
    for _ in 0..n {
        lanes.push(DecState::init(cur)?);
    }

    let seg = out_len / n;
    let mut out = vec![0u8; out_len];
    let mut ctxs = vec![0usize; n];

    let step = |cur: &mut ByteCursor<'_>,
                lane: &mut DecState,
                ctx: &mut usize|
     -> Result<u8> {
        let table = tables[*ctx].as_ref().ok_or_else(|| {
            HtsCodecError::malformed_header(format!("order-1 context row {ctx} missing"))
        })?;
        let s = table.symbol_at(lane.slot());
        lane.advance(cur, table.cum[s as usize], table.freq[s as usize])?;
        *ctx = s as usize;
        Ok(s)
    };

    for i in 0..seg {
        for j in 0..n {
            out[lane_start(j, out_len, n) + i] = step(cur, &mut lanes[j], &mut ctxs[j])?;
        }
    }
    for p in n * seg..out_len {
        out[p] = step(cur, &mut lanes[n - 1], &mut ctxs[n - 1])?;
    }

    Ok(out)
}

/// Serialize the order-1 context rows: the same symbol/run walk as the
/// order-0 table applied to context values, each present context followed
/// by its own order-0 table.
fn write_freqs_order1(out: &mut Vec<u8>, tables: &[Option<FreqTable>]) {
    let present = |i: usize| tables[i].is_some();
    let mut rle = 0u32;
    for i in 0..256usize {
        let Some(table) = tables[i].as_ref() else {
            continue;
        };
        if rle > 0 {
            rle -= 1;
        } else {
            out.push(i as u8);
            if i > 0 && present(i - 1) {
                let mut t = i + 1;
                while t < 256 && present(t) {
                    t += 1;
                }
                rle = (t - i - 1) as u32;
                out.push(rle as u8);
            }
        }
        write_freqs(out, &table.freq);
    }
    out.push(0);
}

/// Parse the order-1 context rows.
fn read_freqs_order1(cur: &mut ByteCursor<'_>) -> Result<Vec<Option<FreqTable>>> {
    let mut tables: Vec<Option<FreqTable>> = (0..256).map(|_| None).collect();
    let mut i = usize::from(cur.read_u8()?);
    let mut rle = 0u32;
    loop {
        if tables[i].is_some() {
            return Err(HtsCodecError::malformed_header(format!(
                "order-1 table repeats context {i}"
            )));
        }
        let freq = read_freqs(cur)?;
        tables[i] = Some(FreqTable::from_freqs(freq, i as u32)?);
        if rle > 0 {
            rle -= 1;
            i += 1;
            if i > 255 {
                return Err(HtsCodecError::malformed_header(
                    "order-1 context run past 255",
                ));
            }
        } else if i < 255 && cur.peek_u8() == Some(i as u8 + 1) {
            i = usize::from(cur.read_u8()?);
            rle = u32::from(cur.read_u8()?);
        } else {
            i = usize::from(cur.read_u8()?);
            if i == 0 {
                return Ok(tables);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_o0(data: &[u8], n: usize) {
        let encoded = encode_order0(data, n).unwrap();
        let mut cur = ByteCursor::new(&encoded);
        let decoded = decode_order0(&mut cur, data.len(), n).unwrap();
        assert_eq!(decoded, data, "order-0 n={n} len={}", data.len());
    }

    fn roundtrip_o1(data: &[u8], n: usize) {
        let encoded = encode_order1(data, n).unwrap();
        let mut cur = ByteCursor::new(&encoded);
        let decoded = decode_order1(&mut cur, data.len(), n).unwrap();
        assert_eq!(decoded, data, "order-1 n={n} len={}", data.len());
    }

    #[test]
    fn test_order0_roundtrip_shapes() {
        for n in [4usize, 32] {
            roundtrip_o0(b"A", n);
            roundtrip_o0(b"AAAAAA", n);
            roundtrip_o0(b"hello world", n);
            roundtrip_o0(&[7u8; 1000], n);
            let ramp: Vec<u8> = (0..1023).map(|i| (i * 7 % 256) as u8).collect();
            roundtrip_o0(&ramp, n);
        }
    }

    #[test]
    fn test_order1_roundtrip_shapes() {
        for n in [4usize, 32] {
            roundtrip_o1(b"A", n);
            roundtrip_o1(b"abababababab", n);
            roundtrip_o1(b"the quick brown fox jumps over the lazy dog", n);
            let ramp: Vec<u8> = (0..999).map(|i| (i % 7) as u8).collect();
            roundtrip_o1(&ramp, n);
        }
    }

    #[test]
    fn test_non_multiple_of_lanes() {
        for extra in 1..5 {
            let data: Vec<u8> = (0..(40 + extra)).map(|i| (i % 11) as u8).collect();
            roundtrip_o0(&data, 4);
            roundtrip_o1(&data, 4);
        }
    }

    #[test]
    fn test_random_roundtrip() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        let mut rng = StdRng::seed_from_u64(0x4A4E53);
        for _ in 0..10 {
            let len = rng.random_range(1..4000);
            let data: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            roundtrip_o0(&data, 4);
            roundtrip_o0(&data, 32);
            roundtrip_o1(&data, 4);
            roundtrip_o1(&data, 32);
        }
    }
}
