//! Per-series codecs built from encoding descriptors.
//!
//! A [`SeriesCodec`] is the runtime form of an [`Encoding`]: Huffman
//! tables are prebuilt, byte-array-len children are nested codec values,
//! and every read/write borrows the slice streams for the duration of the
//! call. The bit-level codes (Beta, Gamma, Subexponential, Golomb) work
//! on the core bitstream; External and ByteArrayStop work on external
//! byte streams; ByteArrayLen may span both.

use crate::encoding::Encoding;
use crate::huffman::CanonicalHuffman;
use crate::streams::{ReadStreams, WriteStreams};
use oxihts_core::error::{HtsCodecError, Result};
use oxihts_core::varint::{read_itf8, read_ltf8, write_itf8, write_ltf8};

/// A constructed codec for one data series.
#[derive(Debug, Clone)]
pub enum SeriesCodec {
    /// Produces defaults, writes nothing.
    Null,
    /// Raw values on an external stream.
    External {
        /// External block id.
        content_id: i32,
    },
    /// Canonical Huffman on the core bitstream.
    Huffman(CanonicalHuffman),
    /// Fixed-width binary on the core bitstream.
    Beta {
        /// Offset added before coding.
        offset: i32,
        /// Bits per value.
        bits: u32,
    },
    /// Elias gamma on the core bitstream.
    Gamma {
        /// Offset added before coding.
        offset: i32,
    },
    /// Elias subexponential on the core bitstream.
    Subexponential {
        /// Offset added before coding.
        offset: i32,
        /// Split parameter.
        k: u32,
    },
    /// Golomb on the core bitstream.
    Golomb {
        /// Offset added before coding.
        offset: i32,
        /// Modulus.
        m: i32,
    },
    /// Golomb-Rice on the core bitstream.
    GolombRice {
        /// Offset added before coding.
        offset: i32,
        /// Log2 of the modulus.
        log2m: u32,
    },
    /// Length through one child codec, bytes through another.
    ByteArrayLen {
        /// Length codec.
        len: Box<SeriesCodec>,
        /// Byte codec.
        bytes: Box<SeriesCodec>,
    },
    /// Bytes until a sentinel on an external stream.
    ByteArrayStop {
        /// Terminating byte.
        stop: u8,
        /// External block id.
        content_id: i32,
    },
}

impl SeriesCodec {
    /// Build the runtime codec for a descriptor.
    pub fn from_encoding(encoding: &Encoding) -> Result<Self> {
        Ok(match encoding {
            Encoding::Null => Self::Null,
            Encoding::External { content_id } => Self::External {
                content_id: *content_id,
            },
            Encoding::Huffman {
                alphabet,
                bit_lengths,
            } => Self::Huffman(CanonicalHuffman::new(alphabet, bit_lengths)?),
            Encoding::Beta { offset, bits } => {
                if *bits > 32 {
                    return Err(HtsCodecError::malformed_header(format!(
                        "beta width {bits} exceeds 32 bits"
                    )));
                }
                Self::Beta {
                    offset: *offset,
                    bits: *bits,
                }
            }
            Encoding::Gamma { offset } => Self::Gamma { offset: *offset },
            Encoding::Subexponential { offset, k } => {
                if *k > 31 {
                    return Err(HtsCodecError::malformed_header(format!(
                        "subexponential split parameter {k} too large"
                    )));
                }
                Self::Subexponential {
                    offset: *offset,
                    k: *k,
                }
            }
            Encoding::Golomb { offset, m } => {
                if *m < 1 {
                    return Err(HtsCodecError::malformed_header(format!(
                        "golomb modulus {m} must be positive"
                    )));
                }
                Self::Golomb {
                    offset: *offset,
                    m: *m,
                }
            }
            Encoding::GolombRice { offset, log2m } => {
                if *log2m > 31 {
                    return Err(HtsCodecError::malformed_header(format!(
                        "golomb-rice log2 modulus {log2m} too large"
                    )));
                }
                Self::GolombRice {
                    offset: *offset,
                    log2m: *log2m,
                }
            }
            Encoding::ByteArrayLen {
                len_encoding,
                bytes_encoding,
            } => Self::ByteArrayLen {
                len: Box::new(Self::from_encoding(len_encoding)?),
                bytes: Box::new(Self::from_encoding(bytes_encoding)?),
            },
            Encoding::ByteArrayStop {
                stop_byte,
                content_id,
            } => Self::ByteArrayStop {
                stop: *stop_byte,
                content_id: *content_id,
            },
        })
    }

    /// Read one integer value.
    pub fn read_int(&self, streams: &mut ReadStreams<'_>) -> Result<i32> {
        match self {
            Self::Null => Ok(0),
            Self::External { content_id } => read_itf8(streams.external(*content_id)?),
            Self::Huffman(huffman) => huffman.read(&mut streams.core),
            Self::Beta { offset, bits } => {
                let raw = streams.core.read_bits(*bits as u8)?;
                Ok((raw as i32).wrapping_sub(*offset))
            }
            Self::Gamma { offset } => {
                let zeros = streams.core.read_unary_zeros()?;
                if zeros > 31 {
                    return Err(HtsCodecError::malformed_record(
                        "gamma code longer than 32 bits",
                    ));
                }
                let tail = streams.core.read_bits(zeros as u8)?;
                let value = (1u32 << zeros) | tail;
                Ok((value as i32).wrapping_sub(*offset))
            }
            Self::Subexponential { offset, k } => {
                let u = streams.core.read_unary_ones()?;
                let n = if u == 0 {
                    streams.core.read_bits(*k as u8)?
                } else {
                    let b = u + k - 1;
                    if b > 31 {
                        return Err(HtsCodecError::malformed_record(
                            "subexponential code longer than 32 bits",
                        ));
                    }
                    (1u32 << b) | streams.core.read_bits(b as u8)?
                };
                Ok((n as i32).wrapping_sub(*offset))
            }
            Self::Golomb { offset, m } => {
                let q = streams.core.read_unary_ones()?;
                let m = *m as u32;
                let r = read_truncated_binary(streams, m)?;
                let n = q
                    .checked_mul(m)
                    .and_then(|v| v.checked_add(r))
                    .ok_or_else(|| {
                        HtsCodecError::malformed_record("golomb value overflows 32 bits")
                    })?;
                Ok((n as i32).wrapping_sub(*offset))
            }
            Self::GolombRice { offset, log2m } => {
                let q = streams.core.read_unary_ones()?;
                let r = streams.core.read_bits(*log2m as u8)?;
                let n = q
                    .checked_mul(1u32 << *log2m)
                    .and_then(|v| v.checked_add(r))
                    .ok_or_else(|| {
                        HtsCodecError::malformed_record("golomb-rice value overflows 32 bits")
                    })?;
                Ok((n as i32).wrapping_sub(*offset))
            }
            Self::ByteArrayLen { .. } | Self::ByteArrayStop { .. } => Err(
                HtsCodecError::malformed_record("byte-array encoding read as an integer"),
            ),
        }
    }

    /// Write one integer value.
    pub fn write_int(&self, streams: &mut WriteStreams, value: i32) -> Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::External { content_id } => {
                write_itf8(streams.external(*content_id), value);
                Ok(())
            }
            Self::Huffman(huffman) => huffman.write(&mut streams.core, value),
            Self::Beta { offset, bits } => {
                let shifted = i64::from(value) + i64::from(*offset);
                if shifted < 0 || shifted >= 1i64 << *bits {
                    return Err(HtsCodecError::value_out_of_range(format!(
                        "{value} does not fit beta width {bits} with offset {offset}"
                    )));
                }
                streams.core.write_bits(shifted as u32, *bits as u8)
            }
            Self::Gamma { offset } => {
                let shifted = i64::from(value) + i64::from(*offset);
                if shifted < 1 {
                    return Err(HtsCodecError::value_out_of_range(format!(
                        "{value} plus offset {offset} must be at least 1 for gamma"
                    )));
                }
                let n = shifted as u32;
                let len = 32 - n.leading_zeros();
                streams.core.write_bits(0, (len - 1) as u8)?;
                streams.core.write_bits(n, len as u8)
            }
            Self::Subexponential { offset, k } => {
                let shifted = i64::from(value) + i64::from(*offset);
                if shifted < 0 {
                    return Err(HtsCodecError::value_out_of_range(format!(
                        "{value} plus offset {offset} is negative for subexponential"
                    )));
                }
                let n = shifted as u32;
                let (u, b) = if n < 1u32 << *k {
                    (0u32, *k)
                } else {
                    let b = 31 - n.leading_zeros();
                    (b - k + 1, b)
                };
                streams.core.write_unary_ones(u)?;
                streams.core.write_bits(n, b as u8)
            }
            Self::Golomb { offset, m } => {
                let shifted = i64::from(value) + i64::from(*offset);
                if shifted < 0 {
                    return Err(HtsCodecError::value_out_of_range(format!(
                        "{value} plus offset {offset} is negative for golomb"
                    )));
                }
                let m = *m as u32;
                let n = shifted as u32;
                streams.core.write_unary_ones(n / m)?;
                write_truncated_binary(streams, n % m, m)
            }
            Self::GolombRice { offset, log2m } => {
                let shifted = i64::from(value) + i64::from(*offset);
                if shifted < 0 {
                    return Err(HtsCodecError::value_out_of_range(format!(
                        "{value} plus offset {offset} is negative for golomb-rice"
                    )));
                }
                let n = shifted as u32;
                streams.core.write_unary_ones(n >> *log2m)?;
                streams.core.write_bits(n & ((1 << *log2m) - 1), *log2m as u8)
            }
            Self::ByteArrayLen { .. } | Self::ByteArrayStop { .. } => Err(
                HtsCodecError::malformed_record("byte-array encoding written as an integer"),
            ),
        }
    }

    /// Read one long value.
    pub fn read_long(&self, streams: &mut ReadStreams<'_>) -> Result<i64> {
        match self {
            Self::Null => Ok(0),
            Self::External { content_id } => read_ltf8(streams.external(*content_id)?),
            _ => Ok(i64::from(self.read_int(streams)?)),
        }
    }

    /// Write one long value.
    pub fn write_long(&self, streams: &mut WriteStreams, value: i64) -> Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::External { content_id } => {
                write_ltf8(streams.external(*content_id), value);
                Ok(())
            }
            _ => {
                let narrow = i32::try_from(value).map_err(|_| {
                    HtsCodecError::value_out_of_range(format!(
                        "{value} does not fit a 32-bit core code"
                    ))
                })?;
                self.write_int(streams, narrow)
            }
        }
    }

    /// Read one byte value.
    pub fn read_byte(&self, streams: &mut ReadStreams<'_>) -> Result<u8> {
        match self {
            Self::Null => Ok(0),
            Self::External { content_id } => streams.external(*content_id)?.read_u8(),
            _ => {
                let value = self.read_int(streams)?;
                u8::try_from(value).map_err(|_| {
                    HtsCodecError::malformed_record(format!("byte series decoded {value}"))
                })
            }
        }
    }

    /// Write one byte value.
    pub fn write_byte(&self, streams: &mut WriteStreams, value: u8) -> Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::External { content_id } => {
                streams.external(*content_id).push(value);
                Ok(())
            }
            _ => self.write_int(streams, i32::from(value)),
        }
    }

    /// Read a byte array. `len` is required for encodings that do not
    /// carry their own length (External); ByteArrayStop ignores it.
    pub fn read_bytes(&self, streams: &mut ReadStreams<'_>, len: Option<usize>) -> Result<Vec<u8>> {
        match self {
            Self::Null => Ok(Vec::new()),
            Self::External { content_id } => {
                let len = len.ok_or_else(|| {
                    HtsCodecError::malformed_record(
                        "external byte array read without a length",
                    )
                })?;
                Ok(streams.external(*content_id)?.take(len)?.to_vec())
            }
            Self::ByteArrayStop { stop, content_id } => {
                Ok(streams.external(*content_id)?.read_until(*stop)?.to_vec())
            }
            Self::ByteArrayLen { len: len_codec, bytes } => {
                let n = len_codec.read_int(streams)?;
                if n < 0 {
                    return Err(HtsCodecError::malformed_record(format!(
                        "negative byte array length {n}"
                    )));
                }
                bytes.read_bytes(streams, Some(n as usize))
            }
            _ => {
                // Core-bit codecs produce byte arrays one element at a time.
                let len = len.ok_or_else(|| {
                    HtsCodecError::malformed_record("byte array read without a length")
                })?;
                let mut out = Vec::with_capacity(len);
                for _ in 0..len {
                    out.push(self.read_byte(streams)?);
                }
                Ok(out)
            }
        }
    }

    /// Write a byte array.
    pub fn write_bytes(&self, streams: &mut WriteStreams, data: &[u8]) -> Result<()> {
        match self {
            Self::Null => Ok(()),
            Self::External { content_id } => {
                streams.external(*content_id).extend_from_slice(data);
                Ok(())
            }
            Self::ByteArrayStop { stop, content_id } => {
                if data.contains(stop) {
                    return Err(HtsCodecError::value_out_of_range(format!(
                        "byte array contains its own stop byte {stop:#04x}"
                    )));
                }
                let buf = streams.external(*content_id);
                buf.extend_from_slice(data);
                buf.push(*stop);
                Ok(())
            }
            Self::ByteArrayLen { len, bytes } => {
                len.write_int(streams, data.len() as i32)?;
                bytes.write_bytes(streams, data)
            }
            _ => {
                for &b in data {
                    self.write_byte(streams, b)?;
                }
                Ok(())
            }
        }
    }
}

/// Truncated-binary remainder read for Golomb modulus `m`.
fn read_truncated_binary(streams: &mut ReadStreams<'_>, m: u32) -> Result<u32> {
    if m == 1 {
        return Ok(0);
    }
    let b = 32 - (m - 1).leading_zeros();
    let cutoff = (1u32 << b) - m;
    let head = streams.core.read_bits((b - 1) as u8)?;
    if head < cutoff {
        Ok(head)
    } else {
        let bit = u32::from(streams.core.read_bit()?);
        Ok(((head << 1) | bit) - cutoff)
    }
}

/// Truncated-binary remainder write for Golomb modulus `m`.
fn write_truncated_binary(streams: &mut WriteStreams, r: u32, m: u32) -> Result<()> {
    if m == 1 {
        return Ok(());
    }
    let b = 32 - (m - 1).leading_zeros();
    let cutoff = (1u32 << b) - m;
    if r < cutoff {
        streams.core.write_bits(r, (b - 1) as u8)
    } else {
        streams.core.write_bits(r + cutoff, b as u8)
    }
}
