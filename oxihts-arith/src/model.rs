//! The adaptive per-context symbol model.
//!
//! A `ByteModel` starts uniform over its alphabet and adds a fixed step to
//! a symbol's frequency each time it is coded. When the total would
//! overflow the coder's precision every frequency is halved (never below
//! one) and, after each update, the touched slot may swap with its left
//! neighbour - a single adjacent exchange that keeps the table
//! approximately sorted by frequency without ever paying for a full sort.

use crate::range_coder::{RangeDecoder, RangeEncoder};
use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};

/// Frequency increment per coded symbol.
const STEP: u32 = 16;

/// Renormalize when the total exceeds this.
const MAX_TOTAL: u32 = (1 << 16) - 17;

/// Adaptive frequency table for one context.
#[derive(Debug, Clone)]
pub struct ByteModel {
    total: u32,
    symbols: Vec<u8>,
    freqs: Vec<u32>,
}

impl ByteModel {
    /// Create a uniform model over `num_symbols` symbols (1-256).
    pub fn new(num_symbols: usize) -> Self {
        Self {
            total: num_symbols as u32,
            symbols: (0..num_symbols).map(|s| s as u8).collect(),
            freqs: vec![1; num_symbols],
        }
    }

    fn update(&mut self, i: usize) {
        self.freqs[i] += STEP;
        self.total += STEP;

        if self.total > MAX_TOTAL {
            self.total = 0;
            for f in &mut self.freqs {
                *f -= *f >> 1;
                self.total += *f;
            }
        }

        if i > 0 && self.freqs[i] > self.freqs[i - 1] {
            self.freqs.swap(i, i - 1);
            self.symbols.swap(i, i - 1);
        }
    }

    /// Encode `symbol` through the range coder and adapt.
    pub fn encode(&mut self, rc: &mut RangeEncoder, out: &mut Vec<u8>, symbol: u8) -> Result<()> {
        let mut cum = 0u32;
        let mut i = 0;
        while self.symbols[i] != symbol {
            cum += self.freqs[i];
            i += 1;
            if i == self.symbols.len() {
                return Err(HtsCodecError::value_out_of_range(format!(
                    "symbol {symbol} outside model alphabet of {}",
                    self.symbols.len()
                )));
            }
        }
        rc.encode(out, cum, self.freqs[i], self.total);
        self.update(i);
        Ok(())
    }

    /// Decode one symbol through the range coder and adapt.
    pub fn decode(&mut self, rc: &mut RangeDecoder, cur: &mut ByteCursor<'_>) -> Result<u8> {
        let f = rc.get_freq(self.total);
        let mut cum = 0u32;
        let mut i = 0;
        while cum + self.freqs[i] <= f {
            cum += self.freqs[i];
            i += 1;
            if i == self.freqs.len() {
                return Err(HtsCodecError::malformed_header(
                    "arithmetic stream slot outside model total",
                ));
            }
        }
        rc.advance(cur, cum, self.freqs[i])?;
        let symbol = self.symbols[i];
        self.update(i);
        Ok(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_roundtrip() {
        let data = b"mississippi mississippi mississippi";
        let mut out = Vec::new();
        let mut rc = RangeEncoder::new();
        let mut model = ByteModel::new(256);
        for &b in data {
            model.encode(&mut rc, &mut out, b).unwrap();
        }
        rc.finish(&mut out);

        let mut cur = ByteCursor::new(&out);
        let mut rc = RangeDecoder::new(&mut cur).unwrap();
        let mut model = ByteModel::new(256);
        let decoded: Vec<u8> = (0..data.len())
            .map(|_| model.decode(&mut rc, &mut cur).unwrap())
            .collect();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_symbol_outside_alphabet() {
        let mut out = Vec::new();
        let mut rc = RangeEncoder::new();
        let mut model = ByteModel::new(4);
        assert!(model.encode(&mut rc, &mut out, 9).is_err());
    }

    #[test]
    fn test_renormalization_keeps_frequencies_positive() {
        // Hammer one symbol far past the renormalization threshold.
        let mut out = Vec::new();
        let mut rc = RangeEncoder::new();
        let mut model = ByteModel::new(16);
        for _ in 0..10_000 {
            model.encode(&mut rc, &mut out, 5).unwrap();
        }
        assert!(model.freqs.iter().all(|&f| f >= 1));
        assert_eq!(model.freqs.iter().sum::<u32>(), model.total);
        // The hot symbol bubbles to the front of the table.
        assert_eq!(model.symbols[0], 5);
    }
}
