//! # OxiHts Core
//!
//! Core components for the OxiHts CRAM/BCF codec library.
//!
//! This crate provides the fundamental building blocks shared by every
//! codec crate in the workspace:
//!
//! - [`bitstream`]: MSB-first bit I/O for the CRAM core block
//! - [`bytes`]: bounds-checked sequential reads over byte slices
//! - [`varint`]: ITF8, LTF8 and uint7 integer codings
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! OxiHts is designed as a layered codec stack:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Record codecs                                       │
//! │     CRAM slice records, BCF site/genotype records       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Block codecs                                        │
//! │     rANS 4x8 / Nx16, range coder, GZIP/BZIP2/LZMA       │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Byte transforms                                     │
//! │     pack, RLE, stripe                                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L0: Bit & byte primitives (this crate)                  │
//! │     BitReader/BitWriter, ByteCursor, ITF8/LTF8/uint7    │
//! └─────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod bytes;
pub mod error;
pub mod varint;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use bytes::ByteCursor;
pub use error::{HtsCodecError, Result};
pub use varint::{
    itf8_size_of, ltf8_size_of, read_itf8, read_itf8_array, read_ltf8, read_uint7, uint7_size_of,
    write_itf8, write_ltf8, write_uint7,
};
