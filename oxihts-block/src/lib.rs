//! # OxiHts Block
//!
//! Whole-block compression for CRAM external blocks and core streams.
//!
//! Every block carries a one-byte method tag; this crate maps tags to
//! codecs behind the uniform [`ExternalCompressor`] contract:
//!
//! - **RAW** - stored bytes
//! - **GZIP** / **BZIP2** / **LZMA** - general-purpose wrappers
//! - **rANS 4x8** / **rANS Nx16** - interleaved rANS ([`oxihts_rans`])
//! - **Adaptive arithmetic** - range coding ([`oxihts_arith`])
//!
//! The name-tokeniser and fqzcomp tags are recognized but intentionally
//! unimplemented; using them fails with `NotSupported`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bzip2;
pub mod compressor;
pub mod gzip;
pub mod lzma;
pub mod method;

pub use compressor::ExternalCompressor;
pub use method::BlockCompressionMethod;
