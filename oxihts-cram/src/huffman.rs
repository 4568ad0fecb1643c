//! Canonical Huffman codes built from an explicit (value, bit length) list.
//!
//! The compression header ships the alphabet and per-symbol code lengths;
//! codes are assigned canonically: symbols sorted by (length, value), the
//! first code of each length derived from the previous length's last code.
//! A one-symbol alphabet is the degenerate case that occupies zero bits on
//! the wire in both directions.

use oxihts_core::bitstream::{BitReader, BitWriter};
use oxihts_core::error::{HtsCodecError, Result};

/// Longest admissible code.
const MAX_CODE_LEN: usize = 31;

/// A canonical Huffman codec over `i32` symbols.
#[derive(Debug, Clone)]
pub struct CanonicalHuffman {
    /// Symbols sorted by (code length, value); decode permutation order.
    symbols: Vec<i32>,
    /// Code length per sorted symbol.
    lengths: Vec<u8>,
    /// Canonical code per sorted symbol.
    codes: Vec<u32>,
    min_len: u8,
    max_len: u8,
    /// First canonical code of each length.
    bases: [u32; MAX_CODE_LEN + 1],
    /// Last canonical code of each length.
    limits: [u32; MAX_CODE_LEN + 1],
    /// Index into `symbols` where each length's run starts.
    base_index: [u32; MAX_CODE_LEN + 1],
}

impl CanonicalHuffman {
    /// Build the codec from parallel value and bit-length lists.
    pub fn new(alphabet: &[i32], bit_lengths: &[i32]) -> Result<Self> {
        if alphabet.is_empty() || alphabet.len() != bit_lengths.len() {
            return Err(HtsCodecError::malformed_header(
                "huffman alphabet and bit lengths disagree",
            ));
        }

        let mut pairs: Vec<(u8, i32)> = Vec::with_capacity(alphabet.len());
        for (&value, &length) in alphabet.iter().zip(bit_lengths) {
            if !(0..=MAX_CODE_LEN as i32).contains(&length) {
                return Err(HtsCodecError::malformed_header(format!(
                    "huffman code length {length} out of range"
                )));
            }
            if length == 0 && alphabet.len() > 1 {
                return Err(HtsCodecError::malformed_header(
                    "zero-length huffman code in a multi-symbol alphabet",
                ));
            }
            pairs.push((length as u8, value));
        }
        pairs.sort_unstable();

        let symbols: Vec<i32> = pairs.iter().map(|&(_, v)| v).collect();
        let lengths: Vec<u8> = pairs.iter().map(|&(l, _)| l).collect();
        let min_len = lengths[0];
        let max_len = lengths[lengths.len() - 1];

        let mut counts = [0u32; MAX_CODE_LEN + 1];
        for &l in &lengths {
            counts[usize::from(l)] += 1;
        }

        let mut bases = [0u32; MAX_CODE_LEN + 1];
        let mut limits = [0u32; MAX_CODE_LEN + 1];
        let mut base_index = [0u32; MAX_CODE_LEN + 1];
        let mut code = 0u64;
        let mut index = 0u32;
        for l in 1..=usize::from(max_len) {
            bases[l] = code as u32;
            base_index[l] = index;
            let count = counts[l];
            if code + u64::from(count) > (1u64 << l) {
                return Err(HtsCodecError::malformed_header(
                    "huffman code lengths overflow the code space",
                ));
            }
            limits[l] = if count > 0 { code as u32 + count - 1 } else { code as u32 };
            code = (code + u64::from(count)) << 1;
            index += count;
        }

        let mut codes = vec![0u32; symbols.len()];
        let mut next = bases;
        for (i, &l) in lengths.iter().enumerate() {
            if l > 0 {
                codes[i] = next[usize::from(l)];
                next[usize::from(l)] += 1;
            }
        }

        Ok(Self {
            symbols,
            lengths,
            codes,
            min_len,
            max_len,
            bases,
            limits,
            base_index,
        })
    }

    /// Whether the alphabet holds a single symbol (zero-bit codes).
    pub fn is_single(&self) -> bool {
        self.symbols.len() == 1
    }

    /// Decode one symbol.
    pub fn read(&self, bits: &mut BitReader<'_>) -> Result<i32> {
        if self.is_single() {
            return Ok(self.symbols[0]);
        }

        let mut code = bits.read_bits(self.min_len)?;
        for len in self.min_len..=self.max_len {
            let l = usize::from(len);
            if self.counts_at(l) > 0 && code >= self.bases[l] && code <= self.limits[l] {
                let idx = self.base_index[l] + (code - self.bases[l]);
                return Ok(self.symbols[idx as usize]);
            }
            if len == self.max_len {
                break;
            }
            code = (code << 1) | u32::from(bits.read_bit()?);
        }
        Err(HtsCodecError::malformed_record(
            "bit pattern matches no huffman code",
        ))
    }

    fn counts_at(&self, l: usize) -> u32 {
        if l + 1 <= usize::from(self.max_len) {
            self.base_index[l + 1] - self.base_index[l]
        } else {
            self.symbols.len() as u32 - self.base_index[l]
        }
    }

    /// Encode one symbol.
    pub fn write(&self, bits: &mut BitWriter, value: i32) -> Result<()> {
        if self.is_single() {
            if value != self.symbols[0] {
                return Err(HtsCodecError::value_out_of_range(format!(
                    "symbol {value} outside single-value huffman alphabet"
                )));
            }
            return Ok(());
        }
        let i = self.index_of(value)?;
        bits.write_bits(self.codes[i], self.lengths[i])
    }

    /// Code length for `value`, in bits.
    pub fn number_of_bits(&self, value: i32) -> Result<u8> {
        if self.is_single() {
            return Ok(0);
        }
        Ok(self.lengths[self.index_of(value)?])
    }

    fn index_of(&self, value: i32) -> Result<usize> {
        self.symbols
            .iter()
            .position(|&s| s == value)
            .ok_or_else(|| {
                HtsCodecError::value_out_of_range(format!(
                    "symbol {value} outside huffman alphabet"
                ))
            })
    }
}
