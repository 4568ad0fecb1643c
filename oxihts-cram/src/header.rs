//! The slice compression header: which encoding each series uses, how
//! read names and positions are preserved, and the tag dictionary.
//!
//! Container framing is out of scope here; callers hand this structure to
//! the record reader/writer already parsed. Series without a descriptor
//! are legal as long as no record needs them.

use crate::codec::SeriesCodec;
use crate::encoding::Encoding;
use crate::series::DataSeries;
use oxihts_core::error::Result;
use std::collections::HashMap;

/// Preservation switches from the header's preservation map.
#[derive(Debug, Clone, Copy)]
pub struct Preservation {
    /// RN series is present and read names travel with records.
    pub read_names_included: bool,
    /// AP stores deltas from the previous record instead of absolutes.
    pub ap_delta: bool,
}

impl Default for Preservation {
    fn default() -> Self {
        Self {
            read_names_included: true,
            ap_delta: false,
        }
    }
}

/// A tag key: two name bytes and the BAM type byte packed big-end first.
pub fn tag_key(name: [u8; 2], value_type: u8) -> i32 {
    (i32::from(name[0]) << 16) | (i32::from(name[1]) << 8) | i32::from(value_type)
}

/// The parsed compression header a record reader/writer drives from.
#[derive(Debug, Clone, Default)]
pub struct CompressionHeader {
    /// Preservation switches.
    pub preservation: Preservation,
    /// Encoding descriptor per data series.
    pub encodings: HashMap<DataSeries, Encoding>,
    /// Encoding descriptor per tag key (always byte arrays).
    pub tag_encodings: HashMap<i32, Encoding>,
    /// TD dictionary: each line is the ordered tag-key list one record can
    /// reference through the TL series.
    pub tag_dictionary: Vec<Vec<i32>>,
}

impl CompressionHeader {
    /// Empty header to be populated by a builder or test.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series encoding.
    pub fn set_encoding(&mut self, series: DataSeries, encoding: Encoding) -> &mut Self {
        self.encodings.insert(series, encoding);
        self
    }

    /// Register a tag encoding.
    pub fn set_tag_encoding(&mut self, key: i32, encoding: Encoding) -> &mut Self {
        self.tag_encodings.insert(key, encoding);
        self
    }

    /// Build runtime codecs for every declared series and tag.
    pub fn build_codecs(
        &self,
    ) -> Result<(HashMap<DataSeries, SeriesCodec>, HashMap<i32, SeriesCodec>)> {
        let mut series = HashMap::with_capacity(self.encodings.len());
        for (&key, encoding) in &self.encodings {
            series.insert(key, SeriesCodec::from_encoding(encoding)?);
        }
        let mut tags = HashMap::with_capacity(self.tag_encodings.len());
        for (&key, encoding) in &self.tag_encodings {
            tags.insert(key, SeriesCodec::from_encoding(encoding)?);
        }
        Ok((series, tags))
    }
}
