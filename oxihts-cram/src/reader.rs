//! Deserializing compression records from a slice's streams.
//!
//! The reader owns the core bit cursor and the external byte cursors and
//! visits data series in the order the wire contract prescribes. Changing
//! that order breaks compatibility; it must stay in lockstep with the
//! writer.

use crate::codec::SeriesCodec;
use crate::header::CompressionHeader;
use crate::record::{
    CF_DETACHED, CF_HAS_MATE_DOWNSTREAM, CF_QUALITY_SCORES_STORED, CF_UNKNOWN_BASES, CramRecord,
    MateInfo, ReadFeature,
};
use crate::series::DataSeries;
use crate::streams::ReadStreams;
use oxihts_core::error::{HtsCodecError, Result};
use std::collections::HashMap;

/// Sentinel slice reference id meaning "multiple references; RI is per
/// record".
pub const MULTI_REFERENCE: i32 = -2;

/// Fetch the codec for a series, failing when the compression header never
/// declared one.
pub(crate) fn lookup(
    codecs: &HashMap<DataSeries, SeriesCodec>,
    series: DataSeries,
) -> Result<&SeriesCodec> {
    codecs.get(&series).ok_or_else(|| {
        HtsCodecError::malformed_record(format!(
            "no encoding declared for series {}",
            series.key()
        ))
    })
}

/// Reads successive records from a slice's uncompressed blocks.
#[derive(Debug)]
pub struct RecordReader<'a> {
    streams: ReadStreams<'a>,
    codecs: HashMap<DataSeries, SeriesCodec>,
    tag_codecs: HashMap<i32, SeriesCodec>,
    tag_dictionary: Vec<Vec<i32>>,
    read_names_included: bool,
    ap_delta: bool,
    slice_reference_id: i32,
    last_alignment_start: i32,
    records_read: u64,
}

impl<'a> RecordReader<'a> {
    /// Create a reader over an uncompressed core block and external blocks.
    ///
    /// `slice_reference_id` is the slice header's reference id
    /// ([`MULTI_REFERENCE`] turns on the per-record RI series) and
    /// `initial_alignment_start` seeds AP delta chaining.
    pub fn new(
        header: &CompressionHeader,
        core: &'a [u8],
        external: &HashMap<i32, &'a [u8]>,
        slice_reference_id: i32,
        initial_alignment_start: i32,
    ) -> Result<Self> {
        let (codecs, tag_codecs) = header.build_codecs()?;
        log::debug!(
            "slice reader: {} series codecs, {} tag codecs, reference {}",
            codecs.len(),
            tag_codecs.len(),
            slice_reference_id
        );
        Ok(Self {
            streams: ReadStreams::new(core, external),
            codecs,
            tag_codecs,
            tag_dictionary: header.tag_dictionary.clone(),
            read_names_included: header.preservation.read_names_included,
            ap_delta: header.preservation.ap_delta,
            slice_reference_id,
            last_alignment_start: initial_alignment_start,
            records_read: 0,
        })
    }

    /// Number of records deserialized so far; on failure this is the
    /// count of records that decoded completely.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    fn read_int(&mut self, series: DataSeries) -> Result<i32> {
        let codec = lookup(&self.codecs, series)?;
        codec.read_int(&mut self.streams)
    }

    fn read_byte(&mut self, series: DataSeries) -> Result<u8> {
        let codec = lookup(&self.codecs, series)?;
        codec.read_byte(&mut self.streams)
    }

    fn read_bytes(&mut self, series: DataSeries, len: Option<usize>) -> Result<Vec<u8>> {
        let codec = lookup(&self.codecs, series)?;
        codec.read_bytes(&mut self.streams, len)
    }

    /// Deserialize the next record.
    pub fn read_record(&mut self) -> Result<CramRecord> {
        let mut record = CramRecord::default();

        record.bam_flags = self.read_int(DataSeries::BamBitFlags)?;
        record.cram_flags = self.read_int(DataSeries::CramBitFlags)?;

        record.reference_id = if self.slice_reference_id == MULTI_REFERENCE {
            self.read_int(DataSeries::ReferenceId)?
        } else {
            self.slice_reference_id
        };

        record.read_length = self.read_int(DataSeries::ReadLengths)?;
        if record.read_length < 0 {
            return Err(HtsCodecError::malformed_record(format!(
                "negative read length {}",
                record.read_length
            )));
        }

        let ap = self.read_int(DataSeries::InSeqPositions)?;
        record.alignment_start = if self.ap_delta {
            self.last_alignment_start.wrapping_add(ap)
        } else {
            ap
        };
        self.last_alignment_start = record.alignment_start;

        record.read_group = self.read_int(DataSeries::ReadGroups)?;

        if self.read_names_included {
            record.read_name = self.read_bytes(DataSeries::ReadNames, None)?;
        }

        record.mate = if record.cram_flags & CF_DETACHED != 0 {
            let mate_flags = self.read_int(DataSeries::NextMateBitFlags)?;
            if !self.read_names_included {
                record.read_name = self.read_bytes(DataSeries::ReadNames, None)?;
            }
            MateInfo::Detached {
                mate_flags,
                mate_reference_id: self
                    .read_int(DataSeries::NextFragmentReferenceSequenceId)?,
                mate_alignment_start: self.read_int(DataSeries::NextMateAlignmentStart)?,
                template_size: self.read_int(DataSeries::TemplateSize)?,
            }
        } else if record.cram_flags & CF_HAS_MATE_DOWNSTREAM != 0 {
            MateInfo::Downstream {
                distance: self.read_int(DataSeries::DistanceToNextFragment)?,
            }
        } else {
            MateInfo::None
        };

        record.tag_line = self.read_int(DataSeries::TagIds)?;
        let tag_keys = self
            .tag_dictionary
            .get(record.tag_line as usize)
            .cloned()
            .ok_or_else(|| {
                HtsCodecError::malformed_record(format!(
                    "tag line {} outside the tag dictionary",
                    record.tag_line
                ))
            })?;
        for key in tag_keys {
            let codec = self.tag_codecs.get(&key).ok_or_else(|| {
                HtsCodecError::malformed_record(format!("no encoding for tag key {key:#08x}"))
            })?;
            record.tags.push(codec.read_bytes(&mut self.streams, None)?);
        }

        if record.is_unmapped() {
            self.read_unmapped_body(&mut record)?;
        } else {
            self.read_mapped_body(&mut record)?;
        }

        self.records_read += 1;
        Ok(record)
    }

    fn read_mapped_body(&mut self, record: &mut CramRecord) -> Result<()> {
        let feature_count = self.read_int(DataSeries::NumberOfReadFeatures)?;
        let mut position = 0i32;
        for _ in 0..feature_count {
            let code = self.read_byte(DataSeries::ReadFeaturesCodes)?;
            position += self.read_int(DataSeries::InReadPositions)?;
            let feature = match code {
                b'B' => ReadFeature::ReadBase {
                    position,
                    base: self.read_byte(DataSeries::Bases)?,
                    quality: self.read_byte(DataSeries::QualityScores)?,
                },
                b'X' => ReadFeature::Substitution {
                    position,
                    code: self.read_byte(DataSeries::BaseSubstitutionCodes)?,
                },
                b'I' => ReadFeature::Insertion {
                    position,
                    bases: self.read_bytes(DataSeries::Insertion, None)?,
                },
                b'S' => ReadFeature::SoftClip {
                    position,
                    bases: self.read_bytes(DataSeries::SoftClip, None)?,
                },
                b'H' => ReadFeature::HardClip {
                    position,
                    length: self.read_int(DataSeries::HardClip)?,
                },
                b'P' => ReadFeature::Padding {
                    position,
                    length: self.read_int(DataSeries::Padding)?,
                },
                b'D' => ReadFeature::Deletion {
                    position,
                    length: self.read_int(DataSeries::DeletionLengths)?,
                },
                b'N' => ReadFeature::RefSkip {
                    position,
                    length: self.read_int(DataSeries::ReferenceSkipLength)?,
                },
                b'i' => ReadFeature::InsertBase {
                    position,
                    base: self.read_byte(DataSeries::Bases)?,
                },
                b'b' => ReadFeature::Bases {
                    position,
                    bases: self.read_bytes(DataSeries::StretchesOfBases, None)?,
                },
                b'q' => ReadFeature::Scores {
                    position,
                    scores: self.read_bytes(DataSeries::StretchesOfQualityScores, None)?,
                },
                b'Q' => ReadFeature::Quality {
                    position,
                    score: self.read_byte(DataSeries::QualityScores)?,
                },
                other => {
                    return Err(HtsCodecError::malformed_record(format!(
                        "unknown read feature operator {other:#04x}"
                    )));
                }
            };
            record.features.push(feature);
        }

        record.mapping_quality = self.read_int(DataSeries::MappingQualities)?;
        if record.cram_flags & CF_QUALITY_SCORES_STORED != 0 {
            record.quality_scores =
                self.read_bytes(DataSeries::QualityScores, Some(record.read_length as usize))?;
        }
        Ok(())
    }

    fn read_unmapped_body(&mut self, record: &mut CramRecord) -> Result<()> {
        if record.cram_flags & CF_UNKNOWN_BASES == 0 {
            let len = record.read_length as usize;
            let mut bases = Vec::with_capacity(len);
            for _ in 0..len {
                bases.push(self.read_byte(DataSeries::Bases)?);
            }
            record.bases = bases;
        }
        if record.cram_flags & CF_QUALITY_SCORES_STORED != 0 {
            record.quality_scores =
                self.read_bytes(DataSeries::QualityScores, Some(record.read_length as usize))?;
        }
        Ok(())
    }
}
