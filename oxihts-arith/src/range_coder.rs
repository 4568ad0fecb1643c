//! The byte-wise range coder with carry propagation.
//!
//! The encoder keeps `low` in a 64-bit accumulator whose bit 32 is the
//! pending carry; after every shift it is masked back to 32 bits. Output
//! is deferred through a one-byte cache plus a counter of pending 0xFF
//! bytes: a carry converts the cached byte to `cache+1` and the queued
//! run to 0x00s. Five terminal shifts flush everything, and the matching
//! decoder seeds its 32-bit `code` from the first five stream bytes (the
//! first being the encoder's initial zero cache).

use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::Result;

/// Renormalization threshold: shift out a byte while `range` is below it.
const TOP: u32 = 1 << 24;

/// Range encoder state.
#[derive(Debug)]
pub struct RangeEncoder {
    low: u64,
    range: u32,
    cache: u8,
    ff_num: u32,
}

impl RangeEncoder {
    /// Create a fresh encoder.
    pub fn new() -> Self {
        Self {
            low: 0,
            range: 0xFFFF_FFFF,
            cache: 0,
            ff_num: 0,
        }
    }

    fn shift_low(&mut self, out: &mut Vec<u8>) {
        let carry = (self.low >> 32) as u8;
        if (self.low as u32) < 0xFF00_0000 || carry != 0 {
            out.push(self.cache.wrapping_add(carry));
            while self.ff_num > 0 {
                out.push(0xFFu8.wrapping_add(carry));
                self.ff_num -= 1;
            }
            self.cache = (self.low >> 24) as u8;
        } else {
            self.ff_num += 1;
        }
        self.low = (self.low << 8) & 0xFFFF_FFFF;
    }

    /// Narrow the interval to the symbol spanning `[cum, cum+freq)` out of
    /// `tot`, renormalizing as needed.
    pub fn encode(&mut self, out: &mut Vec<u8>, cum: u32, freq: u32, tot: u32) {
        self.range /= tot;
        self.low += u64::from(cum) * u64::from(self.range);
        self.range *= freq;
        while self.range < TOP {
            self.range <<= 8;
            self.shift_low(out);
        }
    }

    /// Terminate the stream: five shifts flush the cache, any queued 0xFF
    /// run and the remaining significant bytes of `low`.
    pub fn finish(mut self, out: &mut Vec<u8>) {
        for _ in 0..5 {
            self.shift_low(out);
        }
    }
}

impl Default for RangeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Range decoder state.
#[derive(Debug)]
pub struct RangeDecoder {
    range: u32,
    code: u32,
}

impl RangeDecoder {
    /// Seed `code` from the first five stream bytes.
    pub fn new(cur: &mut ByteCursor<'_>) -> Result<Self> {
        let mut code = 0u32;
        for _ in 0..5 {
            code = (code << 8) | u32::from(cur.read_u8()?);
        }
        Ok(Self {
            range: 0xFFFF_FFFF,
            code,
        })
    }

    /// Return the frequency slot the current code falls into, dividing the
    /// range down by `tot` in the process.
    pub fn get_freq(&mut self, tot: u32) -> u32 {
        self.range /= tot;
        self.code / self.range
    }

    /// Consume the symbol spanning `[cum, cum+freq)`, mirroring the
    /// encoder's renormalization.
    pub fn advance(&mut self, cur: &mut ByteCursor<'_>, cum: u32, freq: u32) -> Result<()> {
        self.code -= cum * self.range;
        self.range *= freq;
        while self.range < TOP {
            self.code = (self.code << 8) | u32::from(cur.read_u8()?);
            self.range <<= 8;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_symbols_roundtrip() {
        // A fixed uniform model over 4 symbols, no adaptation.
        let symbols = [0u32, 3, 1, 2, 2, 0, 3, 3, 1, 0];
        let mut out = Vec::new();
        let mut enc = RangeEncoder::new();
        for &s in &symbols {
            enc.encode(&mut out, s, 1, 4);
        }
        enc.finish(&mut out);

        let mut cur = ByteCursor::new(&out);
        let mut dec = RangeDecoder::new(&mut cur).unwrap();
        for &s in &symbols {
            let f = dec.get_freq(4);
            assert_eq!(f, s);
            dec.advance(&mut cur, f, 1).unwrap();
        }
    }

    #[test]
    fn test_stream_starts_with_zero_cache() {
        let mut out = Vec::new();
        let mut enc = RangeEncoder::new();
        enc.encode(&mut out, 1, 1, 2);
        enc.finish(&mut out);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn test_carry_propagation() {
        // Repeatedly coding the top sliver of the interval drives `low`
        // toward 0xFFFF.. and forces pending-byte resolution via carries.
        let mut out = Vec::new();
        let mut enc = RangeEncoder::new();
        for _ in 0..64 {
            enc.encode(&mut out, 4095, 1, 4096);
        }
        enc.finish(&mut out);

        let mut cur = ByteCursor::new(&out);
        let mut dec = RangeDecoder::new(&mut cur).unwrap();
        for _ in 0..64 {
            let f = dec.get_freq(4096);
            assert_eq!(f, 4095);
            dec.advance(&mut cur, 4095, 1).unwrap();
        }
    }

    #[test]
    fn test_skewed_model_roundtrip() {
        // 255:1 skew, the worst case for renormalization cadence.
        let bits: Vec<u32> = (0..500).map(|i| u32::from(i % 17 == 0)).collect();
        let mut out = Vec::new();
        let mut enc = RangeEncoder::new();
        for &b in &bits {
            if b == 0 {
                enc.encode(&mut out, 0, 255, 256);
            } else {
                enc.encode(&mut out, 255, 1, 256);
            }
        }
        enc.finish(&mut out);

        let mut cur = ByteCursor::new(&out);
        let mut dec = RangeDecoder::new(&mut cur).unwrap();
        for &b in &bits {
            let f = dec.get_freq(256);
            if b == 0 {
                assert!(f < 255);
                dec.advance(&mut cur, 0, 255).unwrap();
            } else {
                assert_eq!(f, 255);
                dec.advance(&mut cur, 255, 1).unwrap();
            }
        }
    }
}
