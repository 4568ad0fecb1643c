//! Encoding descriptors: the per-series choice of codec and its parameters.
//!
//! A slice's compression header declares one descriptor per data series.
//! On the wire a descriptor is `id:u8 | params_len:itf8 | params`, with
//! the parameters themselves ITF8 integers (plus the raw stop byte of
//! byte-array-stop). Byte-array-len nests two complete descriptors inside
//! its parameter block, one for the length and one for the bytes.

use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};
use oxihts_core::varint::{read_itf8, read_itf8_array, write_itf8};
use std::fmt;

/// A data-series encoding descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// Produces the default value on read; writes nothing.
    Null,
    /// Raw values on the external stream `content_id`.
    External {
        /// External block the series lives in.
        content_id: i32,
    },
    /// Unary quotient plus truncated-binary remainder, modulus `m`.
    Golomb {
        /// Added to each value before coding.
        offset: i32,
        /// Golomb modulus.
        m: i32,
    },
    /// Canonical Huffman over an explicit alphabet.
    Huffman {
        /// Symbol values.
        alphabet: Vec<i32>,
        /// Code length per symbol, parallel to `alphabet`.
        bit_lengths: Vec<i32>,
    },
    /// Length via one child encoding, bytes via another.
    ByteArrayLen {
        /// Integer encoding for the array length.
        len_encoding: Box<Encoding>,
        /// Byte encoding for the array body.
        bytes_encoding: Box<Encoding>,
    },
    /// Bytes until a sentinel on an external stream.
    ByteArrayStop {
        /// The terminating byte.
        stop_byte: u8,
        /// External block the bytes live in.
        content_id: i32,
    },
    /// Fixed-width binary.
    Beta {
        /// Added to each value before coding.
        offset: i32,
        /// Bits per value.
        bits: u32,
    },
    /// Elias subexponential with split parameter `k`.
    Subexponential {
        /// Added to each value before coding.
        offset: i32,
        /// Split parameter.
        k: u32,
    },
    /// Golomb with a power-of-two modulus `1 << log2m`.
    GolombRice {
        /// Added to each value before coding.
        offset: i32,
        /// Log2 of the modulus.
        log2m: u32,
    },
    /// Elias gamma.
    Gamma {
        /// Added to each value before coding.
        offset: i32,
    },
}

impl Encoding {
    /// Wire id of this descriptor.
    pub fn id(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::External { .. } => 1,
            Self::Golomb { .. } => 2,
            Self::Huffman { .. } => 3,
            Self::ByteArrayLen { .. } => 4,
            Self::ByteArrayStop { .. } => 5,
            Self::Beta { .. } => 6,
            Self::Subexponential { .. } => 7,
            Self::GolombRice { .. } => 8,
            Self::Gamma { .. } => 9,
        }
    }

    /// Serialize as `id | params_len | params`.
    pub fn serialize(&self, out: &mut Vec<u8>) {
        let mut params = Vec::new();
        match self {
            Self::Null => {}
            Self::External { content_id } => write_itf8(&mut params, *content_id),
            Self::Golomb { offset, m } => {
                write_itf8(&mut params, *offset);
                write_itf8(&mut params, *m);
            }
            Self::Huffman {
                alphabet,
                bit_lengths,
            } => {
                write_itf8(&mut params, alphabet.len() as i32);
                for &value in alphabet {
                    write_itf8(&mut params, value);
                }
                write_itf8(&mut params, bit_lengths.len() as i32);
                for &length in bit_lengths {
                    write_itf8(&mut params, length);
                }
            }
            Self::ByteArrayLen {
                len_encoding,
                bytes_encoding,
            } => {
                len_encoding.serialize(&mut params);
                bytes_encoding.serialize(&mut params);
            }
            Self::ByteArrayStop {
                stop_byte,
                content_id,
            } => {
                params.push(*stop_byte);
                write_itf8(&mut params, *content_id);
            }
            Self::Beta { offset, bits } => {
                write_itf8(&mut params, *offset);
                write_itf8(&mut params, *bits as i32);
            }
            Self::Subexponential { offset, k } => {
                write_itf8(&mut params, *offset);
                write_itf8(&mut params, *k as i32);
            }
            Self::GolombRice { offset, log2m } => {
                write_itf8(&mut params, *offset);
                write_itf8(&mut params, *log2m as i32);
            }
            Self::Gamma { offset } => write_itf8(&mut params, *offset),
        }
        out.push(self.id());
        write_itf8(out, params.len() as i32);
        out.extend_from_slice(&params);
    }

    /// Parse one descriptor from the cursor.
    pub fn parse(cur: &mut ByteCursor<'_>) -> Result<Self> {
        let id = cur.read_u8()?;
        let params_len = read_itf8(cur)?;
        if params_len < 0 {
            return Err(HtsCodecError::malformed_header(
                "negative encoding parameter length",
            ));
        }
        let mut params = ByteCursor::new(cur.take(params_len as usize)?);

        let encoding = match id {
            0 => Self::Null,
            1 => Self::External {
                content_id: read_itf8(&mut params)?,
            },
            2 => Self::Golomb {
                offset: read_itf8(&mut params)?,
                m: read_itf8(&mut params)?,
            },
            3 => {
                let n = read_itf8(&mut params)?;
                let alphabet = read_itf8_array(&mut params, n.max(0) as usize)?;
                let n_lengths = read_itf8(&mut params)?;
                let bit_lengths = read_itf8_array(&mut params, n_lengths.max(0) as usize)?;
                Self::Huffman {
                    alphabet,
                    bit_lengths,
                }
            }
            4 => Self::ByteArrayLen {
                len_encoding: Box::new(Self::parse(&mut params)?),
                bytes_encoding: Box::new(Self::parse(&mut params)?),
            },
            5 => Self::ByteArrayStop {
                stop_byte: params.read_u8()?,
                content_id: read_itf8(&mut params)?,
            },
            6 => Self::Beta {
                offset: read_itf8(&mut params)?,
                bits: read_itf8(&mut params)? as u32,
            },
            7 => Self::Subexponential {
                offset: read_itf8(&mut params)?,
                k: read_itf8(&mut params)? as u32,
            },
            8 => Self::GolombRice {
                offset: read_itf8(&mut params)?,
                log2m: read_itf8(&mut params)? as u32,
            },
            9 => Self::Gamma {
                offset: read_itf8(&mut params)?,
            },
            other => {
                return Err(HtsCodecError::malformed_header(format!(
                    "unknown encoding id {other}"
                )));
            }
        };

        if !params.is_empty() {
            return Err(HtsCodecError::malformed_header(format!(
                "{} trailing bytes after encoding {id} parameters",
                params.remaining()
            )));
        }
        Ok(encoding)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::External { content_id } => write!(f, "EXTERNAL({content_id})"),
            Self::Golomb { offset, m } => write!(f, "GOLOMB(offset={offset}, m={m})"),
            Self::Huffman { alphabet, .. } => write!(f, "HUFFMAN({} symbols)", alphabet.len()),
            Self::ByteArrayLen {
                len_encoding,
                bytes_encoding,
            } => write!(f, "BYTE_ARRAY_LEN(len={len_encoding}, bytes={bytes_encoding})"),
            Self::ByteArrayStop {
                stop_byte,
                content_id,
            } => write!(f, "BYTE_ARRAY_STOP(stop={stop_byte:#04x}, id={content_id})"),
            Self::Beta { offset, bits } => write!(f, "BETA(offset={offset}, bits={bits})"),
            Self::Subexponential { offset, k } => {
                write!(f, "SUBEXPONENTIAL(offset={offset}, k={k})")
            }
            Self::GolombRice { offset, log2m } => {
                write!(f, "GOLOMB_RICE(offset={offset}, log2m={log2m})")
            }
            Self::Gamma { offset } => write!(f, "GAMMA(offset={offset})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(encoding: Encoding) {
        let mut buf = Vec::new();
        encoding.serialize(&mut buf);
        let mut cur = ByteCursor::new(&buf);
        assert_eq!(Encoding::parse(&mut cur).unwrap(), encoding);
        assert!(cur.is_empty());
    }

    #[test]
    fn test_roundtrip_every_variant() {
        roundtrip(Encoding::Null);
        roundtrip(Encoding::External { content_id: 42 });
        roundtrip(Encoding::Golomb { offset: -3, m: 10 });
        roundtrip(Encoding::Huffman {
            alphabet: vec![1, 2, 3, 1000],
            bit_lengths: vec![1, 2, 3, 3],
        });
        roundtrip(Encoding::ByteArrayStop {
            stop_byte: b'\t',
            content_id: 7,
        });
        roundtrip(Encoding::Beta { offset: 0, bits: 8 });
        roundtrip(Encoding::Subexponential { offset: 0, k: 2 });
        roundtrip(Encoding::GolombRice { offset: 1, log2m: 3 });
        roundtrip(Encoding::Gamma { offset: 1 });
    }

    #[test]
    fn test_roundtrip_nested_byte_array_len() {
        roundtrip(Encoding::ByteArrayLen {
            len_encoding: Box::new(Encoding::Huffman {
                alphabet: vec![3],
                bit_lengths: vec![0],
            }),
            bytes_encoding: Box::new(Encoding::External { content_id: 42 }),
        });
        // Deeper nesting: the bytes child is itself composite.
        roundtrip(Encoding::ByteArrayLen {
            len_encoding: Box::new(Encoding::Gamma { offset: 1 }),
            bytes_encoding: Box::new(Encoding::ByteArrayLen {
                len_encoding: Box::new(Encoding::Beta { offset: 0, bits: 4 }),
                bytes_encoding: Box::new(Encoding::External { content_id: 9 }),
            }),
        });
    }

    #[test]
    fn test_unknown_id_rejected() {
        let buf = [77u8, 0];
        let mut cur = ByteCursor::new(&buf);
        assert!(Encoding::parse(&mut cur).is_err());
    }

    #[test]
    fn test_trailing_parameter_bytes_rejected() {
        let mut buf = Vec::new();
        Encoding::Gamma { offset: 1 }.serialize(&mut buf);
        // Widen the declared parameter block by one byte.
        buf[1] += 1;
        buf.push(0xEE);
        let mut cur = ByteCursor::new(&buf);
        assert!(Encoding::parse(&mut cur).is_err());
    }
}
