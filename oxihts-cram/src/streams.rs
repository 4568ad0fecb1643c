//! The two stream families a slice record touches.
//!
//! A record's fields land either in the single bit-addressable core block
//! or in one of many byte-addressable external blocks keyed by content id.
//! The record reader/writer owns both; codecs borrow them per call and
//! hold no stream state of their own.

use oxihts_core::bitstream::{BitReader, BitWriter};
use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};
use std::collections::{BTreeMap, HashMap};

/// Decode-side streams: the core bit cursor plus external byte cursors.
#[derive(Debug)]
pub struct ReadStreams<'a> {
    /// The core bitstream.
    pub core: BitReader<'a>,
    external: HashMap<i32, ByteCursor<'a>>,
}

impl<'a> ReadStreams<'a> {
    /// Wrap an uncompressed core block and a map of uncompressed external
    /// blocks.
    pub fn new(core: &'a [u8], external_blocks: &HashMap<i32, &'a [u8]>) -> Self {
        Self {
            core: BitReader::new(core),
            external: external_blocks
                .iter()
                .map(|(&id, &data)| (id, ByteCursor::new(data)))
                .collect(),
        }
    }

    /// Cursor for external block `content_id`.
    pub fn external(&mut self, content_id: i32) -> Result<&mut ByteCursor<'a>> {
        self.external.get_mut(&content_id).ok_or_else(|| {
            HtsCodecError::malformed_record(format!(
                "record references missing external block {content_id}"
            ))
        })
    }
}

/// Encode-side streams: the core bit writer plus external byte buffers.
#[derive(Debug, Default)]
pub struct WriteStreams {
    /// The core bitstream.
    pub core: BitWriter,
    external: BTreeMap<i32, Vec<u8>>,
}

impl WriteStreams {
    /// Fresh, empty streams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer for external block `content_id`, created on first use.
    pub fn external(&mut self, content_id: i32) -> &mut Vec<u8> {
        self.external.entry(content_id).or_default()
    }

    /// Finish writing: pad the core block to a byte boundary and hand back
    /// all buffers.
    pub fn finish(self) -> (Vec<u8>, BTreeMap<i32, Vec<u8>>) {
        (self.core.into_vec(), self.external)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_external_block() {
        let blocks = HashMap::new();
        let mut streams = ReadStreams::new(&[], &blocks);
        assert!(matches!(
            streams.external(5),
            Err(HtsCodecError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_write_then_read() {
        let mut w = WriteStreams::new();
        w.core.write_bits(0b101, 3).unwrap();
        w.external(1).extend_from_slice(b"abc");
        let (core, external) = w.finish();

        let borrowed: HashMap<i32, &[u8]> =
            external.iter().map(|(&k, v)| (k, v.as_slice())).collect();
        let mut r = ReadStreams::new(&core, &borrowed);
        assert_eq!(r.core.read_bits(3).unwrap(), 0b101);
        assert_eq!(r.external(1).unwrap().read_u8().unwrap(), b'a');
    }
}
