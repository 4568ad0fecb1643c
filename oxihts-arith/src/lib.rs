//! # OxiHts Arith
//!
//! The adaptive arithmetic ("range") coder used for CRAM blocks.
//!
//! A byte-wise range coder with explicit carry propagation drives
//! per-context adaptive frequency tables:
//!
//! - [`range_coder`]: the `low`/`range`/`code` state machines, including
//!   the deferred-byte `shift_low` carry handling
//! - [`model`]: the adaptive [`ByteModel`] with its single-adjacent-swap
//!   reordering rule
//! - [`codec`]: stream framing with order-0/order-1 contexts, in-band
//!   run-length coding, bit packing, striping, CAT and external-BZIP2
//!   bodies
//!
//! ## Usage
//!
//! ```
//! use oxihts_arith::codec;
//!
//! let data = b"hello hello hello";
//! let block = codec::encode(codec::ORDER, data).unwrap();
//! assert_eq!(codec::decode(&block, None).unwrap(), data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod model;
pub mod range_coder;

pub use codec::{decode, encode};
pub use model::ByteModel;
pub use range_coder::{RangeDecoder, RangeEncoder};
