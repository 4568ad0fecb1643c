//! Byte transforms for OxiHts.
//!
//! The Nx16-family codecs (rANS Nx16 and the adaptive arithmetic coder)
//! optionally reshape their input before entropy coding:
//!
//! 1. [`pack`] - dense-index bit packing for alphabets of at most 16 symbols
//! 2. [`rle`] - run-length splitting into a literal stream plus metadata
//! 3. [`stripe`] - K-way interleave so each column compresses on its own
//!
//! On the compress path pack is applied first, then RLE, then the entropy
//! coder; stripe wraps whole streams. The CAT "transform" is the identity
//! and lives entirely in the codec framing, so it has no module here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod pack;
pub mod rle;
pub mod stripe;

pub use pack::{PackMeta, pack, unpack};
