//! Error types for OxiHts operations.
//!
//! This module provides a single error type covering all failure modes of
//! the codec layer: truncated streams, malformed headers and frequency
//! tables, encoder arguments that cannot be represented, malformed records,
//! unsupported flag combinations, and failures surfaced from the external
//! block compressors.

use std::io;
use thiserror::Error;

/// The main error type for OxiHts operations.
#[derive(Debug, Error)]
pub enum HtsCodecError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stream ended mid-record or mid-block.
    #[error("Unexpected end of stream: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },

    /// Bad magic, unsupported version, corrupt frequency table,
    /// inconsistent IDX usage, size overflow, or unknown encoding id.
    #[error("Malformed header: {message}")]
    MalformedHeader {
        /// Description of the header defect.
        message: String,
    },

    /// Encoder argument cannot be represented in the declared width.
    #[error("Value out of range: {message}")]
    ValueOutOfRange {
        /// Description of the offending value and its bounds.
        message: String,
    },

    /// Unknown CRAM read-feature operator, missing data series, or a
    /// dictionary offset with no entry.
    #[error("Malformed record: {message}")]
    MalformedRecord {
        /// Description of the record defect.
        message: String,
    },

    /// A recognized feature or flag combination this implementation does
    /// not handle.
    #[error("Not supported: {feature}")]
    NotSupported {
        /// The unsupported feature or flag combination.
        feature: String,
    },

    /// Failure surfaced from an external block compressor.
    #[error("Compression error: {message}")]
    Compression {
        /// Description of the compressor failure.
        message: String,
    },
}

/// Result type alias for OxiHts operations.
pub type Result<T> = std::result::Result<T, HtsCodecError>;

impl HtsCodecError {
    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create a malformed header error.
    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    /// Create a malformed header error for a frequency table whose rows do
    /// not sum to the fixed total.
    pub fn malformed_frequencies(context: u32, sum: u32, expected: u32) -> Self {
        Self::MalformedHeader {
            message: format!(
                "frequency table for context {context} sums to {sum}, expected {expected}"
            ),
        }
    }

    /// Create a value out of range error.
    pub fn value_out_of_range(message: impl Into<String>) -> Self {
        Self::ValueOutOfRange {
            message: message.into(),
        }
    }

    /// Create a malformed record error.
    pub fn malformed_record(message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            message: message.into(),
        }
    }

    /// Create a not supported error.
    pub fn not_supported(feature: impl Into<String>) -> Self {
        Self::NotSupported {
            feature: feature.into(),
        }
    }

    /// Create a compression error.
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HtsCodecError::unexpected_eof(4);
        assert!(err.to_string().contains("expected 4 more bytes"));

        let err = HtsCodecError::malformed_frequencies(7, 4000, 4096);
        assert!(err.to_string().contains("context 7"));
        assert!(err.to_string().contains("4096"));

        let err = HtsCodecError::not_supported("fqzcomp");
        assert!(err.to_string().contains("fqzcomp"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err: HtsCodecError = io_err.into();
        assert!(matches!(err, HtsCodecError::Io(_)));
    }
}
