//! # OxiHts rANS
//!
//! Interleaved range-variant ANS entropy coders in the two CRAM block
//! flavours:
//!
//! - [`r4x8`]: the fixed 4-way, byte-renormalizing format with a 9-byte
//!   `order | clen | ulen` header.
//! - [`nx16`]: the N-way (N of 4 or 32) format whose flags byte also
//!   selects the pack, RLE, stripe, CAT and external-BZIP2 transforms.
//!
//! Both share the same entropy core: 32-bit lane states in
//! `[1<<23, 1<<31)` over frequencies scaled to a fixed total of 4096, with
//! order-0 or order-1 (previous byte) context modelling.
//!
//! ## Usage
//!
//! ```
//! let data = b"GATTACA GATTACA";
//! let block = oxihts_rans::r4x8::encode(0, data).unwrap();
//! assert_eq!(oxihts_rans::r4x8::decode(&block).unwrap(), data);
//!
//! let block = oxihts_rans::nx16::encode(oxihts_rans::nx16::ORDER, data).unwrap();
//! assert_eq!(oxihts_rans::nx16::decode(&block, None).unwrap(), data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod coder;
pub mod freq;
pub mod nx16;
pub mod r4x8;

pub use freq::{FreqTable, TOTAL_FREQ, TOTAL_FREQ_SHIFT};
