//! The BCF file prelude: magic, version gate, and the embedded header
//! text block.
//!
//! ```text
//! "BCF" | major:u8 | minor:u8 | header_len:u32le | header text, NUL-terminated
//! ```
//!
//! The header text itself is VCF; parsing it into lines is a collaborator
//! concern, so this module only frames the bytes and enforces the version
//! and size gates.

use log::debug;
use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};

/// File magic.
pub const MAGIC: [u8; 3] = *b"BCF";

/// The major version this codec speaks.
pub const SUPPORTED_MAJOR: u8 = 2;
/// The minor version the default policy insists on.
pub const SUPPORTED_MINOR: u8 = 2;

/// Reject header text blocks larger than this.
pub const MAX_HEADER_LEN: usize = 128 * 1024 * 1024;

/// How strictly to gate the version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionPolicy {
    /// Require major 2, minor 2.
    #[default]
    Strict,
    /// Require major 2, accept any minor.
    AnyMinor,
}

impl VersionPolicy {
    fn check(self, major: u8, minor: u8) -> Result<()> {
        if major != SUPPORTED_MAJOR {
            return Err(HtsCodecError::malformed_header(format!(
                "unsupported BCF major version {major}"
            )));
        }
        if self == Self::Strict && minor != SUPPORTED_MINOR {
            return Err(HtsCodecError::malformed_header(format!(
                "unsupported BCF minor version {minor}"
            )));
        }
        Ok(())
    }
}

/// Read the file prelude, returning the header text (without its
/// terminating NUL).
pub fn read_header(cur: &mut ByteCursor<'_>, policy: VersionPolicy) -> Result<Vec<u8>> {
    let magic = cur.take(3)?;
    if magic != MAGIC {
        return Err(HtsCodecError::malformed_header(format!(
            "bad magic {magic:02x?}, expected \"BCF\""
        )));
    }
    let major = cur.read_u8()?;
    let minor = cur.read_u8()?;
    policy.check(major, minor)?;

    let header_len = cur.read_u32_le()? as usize;
    if header_len > MAX_HEADER_LEN {
        return Err(HtsCodecError::malformed_header(format!(
            "header of {header_len} bytes exceeds the 128 MiB limit"
        )));
    }
    let mut text = cur.take(header_len)?.to_vec();
    match text.pop() {
        Some(0) => {}
        _ => {
            return Err(HtsCodecError::malformed_header(
                "header text is not NUL-terminated",
            ));
        }
    }
    debug!("BCF {major}.{minor} header, {} bytes of text", text.len());
    Ok(text)
}

/// Write the file prelude around the given header text.
pub fn write_header(out: &mut Vec<u8>, text: &[u8]) -> Result<()> {
    let framed_len = text.len() + 1;
    if framed_len > MAX_HEADER_LEN {
        return Err(HtsCodecError::value_out_of_range(format!(
            "header of {framed_len} bytes exceeds the 128 MiB limit"
        )));
    }
    out.extend_from_slice(&MAGIC);
    out.push(SUPPORTED_MAJOR);
    out.push(SUPPORTED_MINOR);
    out.extend_from_slice(&(framed_len as u32).to_le_bytes());
    out.extend_from_slice(text);
    out.push(0);
    Ok(())
}
