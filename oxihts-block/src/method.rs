//! The closed set of block compression methods.

use oxihts_core::error::{HtsCodecError, Result};
use std::fmt;

/// Compression method tag carried by every compressed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCompressionMethod {
    /// Stored bytes, no compression.
    Raw,
    /// RFC 1952 gzip.
    Gzip,
    /// Burrows-Wheeler bzip2.
    Bzip2,
    /// LZMA in an xz container.
    Lzma,
    /// 4-way interleaved rANS, byte renormalization.
    Rans4x8,
    /// N-way interleaved rANS with byte transforms.
    RansNx16,
    /// Adaptive arithmetic (range) coding.
    AdaptiveArithmetic,
    /// Read-name tokenizer (tag only; not implemented here).
    NameTokeniser,
    /// Quality-score model codec (tag only; not implemented here).
    Fqzcomp,
}

impl BlockCompressionMethod {
    /// Wire id of this method.
    pub fn id(self) -> u8 {
        match self {
            Self::Raw => 0,
            Self::Gzip => 1,
            Self::Bzip2 => 2,
            Self::Lzma => 3,
            Self::Rans4x8 => 4,
            Self::RansNx16 => 5,
            Self::AdaptiveArithmetic => 6,
            Self::NameTokeniser => 7,
            Self::Fqzcomp => 8,
        }
    }

    /// Parse a wire id.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::Raw),
            1 => Ok(Self::Gzip),
            2 => Ok(Self::Bzip2),
            3 => Ok(Self::Lzma),
            4 => Ok(Self::Rans4x8),
            5 => Ok(Self::RansNx16),
            6 => Ok(Self::AdaptiveArithmetic),
            7 => Ok(Self::NameTokeniser),
            8 => Ok(Self::Fqzcomp),
            other => Err(HtsCodecError::malformed_header(format!(
                "unknown block compression method {other}"
            ))),
        }
    }
}

impl fmt::Display for BlockCompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "raw",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Lzma => "lzma",
            Self::Rans4x8 => "rans4x8",
            Self::RansNx16 => "ransNx16",
            Self::AdaptiveArithmetic => "adaptive arithmetic",
            Self::NameTokeniser => "name tokeniser",
            Self::Fqzcomp => "fqzcomp",
        };
        f.write_str(name)
    }
}
