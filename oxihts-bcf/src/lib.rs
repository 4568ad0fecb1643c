//! # OxiHts BCF
//!
//! The binary VCF record codec:
//!
//! - [`types`]: the typed-value system, its descriptor byte, integer
//!   width promotion and the missing/end-of-vector sentinels
//! - [`dictionary`]: dense and sparse offset-to-string maps built from
//!   header lines
//! - [`header`]: the `BCF\x02\x02` file prelude and version gate
//! - [`record`]: the site block, INFO pairs, and the lazily decoded
//!   genotype block
//!
//! VCF text parsing is a collaborator concern; this crate starts from
//! structured header lines and raw record bytes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod dictionary;
pub mod header;
pub mod record;
pub mod types;

pub use dictionary::{Dictionary, HeaderLine, HeaderLineKind, build_contig_dictionary,
    build_string_dictionary};
pub use header::{VersionPolicy, read_header, write_header};
pub use record::{BcfRecord, GenotypeBlock, GenotypeField, RecordDecoder, read_record,
    read_record_with, write_record};
pub use types::{TypeKind, TypedValue};
