//! The uniform compress/uncompress contract over every block method.

use crate::method::BlockCompressionMethod;
use crate::{bzip2, gzip, lzma};
use log::debug;
use oxihts_core::error::{HtsCodecError, Result};

/// A block compressor: a method tag plus one per-method integer argument.
///
/// The argument carries the gzip level, the 4x8 order byte, or the
/// Nx16/arithmetic flags byte; `-1` selects the method default. Two
/// compressors are equal when both tag and argument match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalCompressor {
    method: BlockCompressionMethod,
    arg: i32,
}

impl ExternalCompressor {
    /// Create a compressor from a method tag and raw argument.
    pub fn new(method: BlockCompressionMethod, arg: i32) -> Self {
        Self { method, arg }
    }

    /// Stored bytes.
    pub fn raw() -> Self {
        Self::new(BlockCompressionMethod::Raw, -1)
    }

    /// GZIP at the given level, or `-1` for the default.
    pub fn gzip(level: i32) -> Self {
        Self::new(BlockCompressionMethod::Gzip, level)
    }

    /// BZIP2 with the default block size.
    pub fn bzip2() -> Self {
        Self::new(BlockCompressionMethod::Bzip2, -1)
    }

    /// LZMA (xz) at the default preset.
    pub fn lzma() -> Self {
        Self::new(BlockCompressionMethod::Lzma, -1)
    }

    /// rANS 4x8 with the given order byte, or `-1` for order 0.
    pub fn rans_4x8(order: i32) -> Self {
        Self::new(BlockCompressionMethod::Rans4x8, order)
    }

    /// rANS Nx16 with the given flags byte, or `-1` for plain order 0.
    pub fn rans_nx16(flags: i32) -> Self {
        Self::new(BlockCompressionMethod::RansNx16, flags)
    }

    /// Adaptive arithmetic with the given flags byte, or `-1` for order 0.
    pub fn adaptive_arithmetic(flags: i32) -> Self {
        Self::new(BlockCompressionMethod::AdaptiveArithmetic, flags)
    }

    /// Default-argument compressor for a decoded method tag.
    pub fn method_for(id: u8) -> Result<Self> {
        Ok(Self::new(BlockCompressionMethod::from_id(id)?, -1))
    }

    /// The method tag.
    pub fn method(&self) -> BlockCompressionMethod {
        self.method
    }

    /// The per-method argument (`-1` means default).
    pub fn arg(&self) -> i32 {
        self.arg
    }

    fn arg_or(&self, default: u32) -> u32 {
        if self.arg < 0 { default } else { self.arg as u32 }
    }

    /// Compress a whole block.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.method {
            BlockCompressionMethod::Raw => Ok(data.to_vec()),
            BlockCompressionMethod::Gzip => gzip::compress(data, self.arg_or(gzip::DEFAULT_LEVEL)),
            BlockCompressionMethod::Bzip2 => bzip2::compress(data),
            BlockCompressionMethod::Lzma => lzma::compress(data, self.arg_or(lzma::DEFAULT_PRESET)),
            BlockCompressionMethod::Rans4x8 => {
                oxihts_rans::r4x8::encode(self.arg_or(0) as u8, data)
            }
            BlockCompressionMethod::RansNx16 => {
                oxihts_rans::nx16::encode(self.arg_or(0) as u8, data)
            }
            BlockCompressionMethod::AdaptiveArithmetic => {
                oxihts_arith::codec::encode(self.arg_or(0) as u8, data)
            }
            BlockCompressionMethod::NameTokeniser | BlockCompressionMethod::Fqzcomp => Err(
                HtsCodecError::not_supported(format!("{} compression", self.method)),
            ),
        }
    }

    /// Decompress a whole block.
    pub fn uncompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let out = match self.method {
            BlockCompressionMethod::Raw => Ok(data.to_vec()),
            BlockCompressionMethod::Gzip => gzip::uncompress(data),
            BlockCompressionMethod::Bzip2 => bzip2::uncompress(data),
            BlockCompressionMethod::Lzma => lzma::uncompress(data),
            BlockCompressionMethod::Rans4x8 => oxihts_rans::r4x8::decode(data),
            BlockCompressionMethod::RansNx16 => oxihts_rans::nx16::decode(data, None),
            BlockCompressionMethod::AdaptiveArithmetic => oxihts_arith::codec::decode(data, None),
            BlockCompressionMethod::NameTokeniser | BlockCompressionMethod::Fqzcomp => Err(
                HtsCodecError::not_supported(format!("{} decompression", self.method)),
            ),
        }?;
        debug!(
            "uncompressed {} block: {} -> {} bytes",
            self.method,
            data.len(),
            out.len()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Vec<u8>> {
        vec![
            Vec::new(),
            b"x".to_vec(),
            b"Hello, block world!".to_vec(),
            vec![0u8; 4096],
            (0..2048u32).map(|i| (i * 31 % 256) as u8).collect(),
        ]
    }

    #[test]
    fn test_roundtrip_every_supported_method() {
        let compressors = [
            ExternalCompressor::raw(),
            ExternalCompressor::gzip(-1),
            ExternalCompressor::gzip(1),
            ExternalCompressor::bzip2(),
            ExternalCompressor::lzma(),
            ExternalCompressor::rans_4x8(0),
            ExternalCompressor::rans_4x8(1),
            ExternalCompressor::rans_nx16(-1),
            ExternalCompressor::rans_nx16(0x01),
            ExternalCompressor::adaptive_arithmetic(-1),
            ExternalCompressor::adaptive_arithmetic(0x41),
        ];
        for compressor in compressors {
            for data in corpus() {
                let block = compressor.compress(&data).unwrap();
                assert_eq!(
                    compressor.uncompress(&block).unwrap(),
                    data,
                    "{} arg={}",
                    compressor.method(),
                    compressor.arg()
                );
            }
        }
    }

    #[test]
    fn test_unsupported_methods() {
        for compressor in [
            ExternalCompressor::new(BlockCompressionMethod::NameTokeniser, -1),
            ExternalCompressor::new(BlockCompressionMethod::Fqzcomp, -1),
        ] {
            assert!(matches!(
                compressor.compress(b"x"),
                Err(HtsCodecError::NotSupported { .. })
            ));
        }
    }

    #[test]
    fn test_equality_by_method_and_arg() {
        assert_eq!(ExternalCompressor::gzip(5), ExternalCompressor::gzip(5));
        assert_ne!(ExternalCompressor::gzip(5), ExternalCompressor::gzip(6));
        assert_ne!(ExternalCompressor::gzip(-1), ExternalCompressor::bzip2());
    }

    #[test]
    fn test_method_for() {
        let compressor = ExternalCompressor::method_for(4).unwrap();
        assert_eq!(compressor.method(), BlockCompressionMethod::Rans4x8);
        assert_eq!(compressor.arg(), -1);
        assert!(ExternalCompressor::method_for(42).is_err());
    }
}
