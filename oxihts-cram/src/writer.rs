//! Serializing compression records into a slice's streams.
//!
//! The mirror image of the reader: identical series order, identical
//! conditionals. On any error the record is abandoned and the writer's
//! streams must be discarded; no partial record is ever emitted.

use crate::codec::SeriesCodec;
use crate::header::CompressionHeader;
use crate::reader::{MULTI_REFERENCE, lookup};
use crate::record::{
    CF_DETACHED, CF_HAS_MATE_DOWNSTREAM, CF_QUALITY_SCORES_STORED, CF_UNKNOWN_BASES, CramRecord,
    MateInfo, ReadFeature,
};
use crate::series::DataSeries;
use crate::streams::WriteStreams;
use oxihts_core::error::{HtsCodecError, Result};
use std::collections::{BTreeMap, HashMap};

/// Writes successive records into a growing core block and external
/// block buffers.
#[derive(Debug)]
pub struct RecordWriter {
    streams: WriteStreams,
    codecs: HashMap<DataSeries, SeriesCodec>,
    tag_codecs: HashMap<i32, SeriesCodec>,
    tag_dictionary: Vec<Vec<i32>>,
    read_names_included: bool,
    ap_delta: bool,
    slice_reference_id: i32,
    last_alignment_start: i32,
}

impl RecordWriter {
    /// Create a writer for one slice.
    pub fn new(
        header: &CompressionHeader,
        slice_reference_id: i32,
        initial_alignment_start: i32,
    ) -> Result<Self> {
        let (codecs, tag_codecs) = header.build_codecs()?;
        Ok(Self {
            streams: WriteStreams::new(),
            codecs,
            tag_codecs,
            tag_dictionary: header.tag_dictionary.clone(),
            read_names_included: header.preservation.read_names_included,
            ap_delta: header.preservation.ap_delta,
            slice_reference_id,
            last_alignment_start: initial_alignment_start,
        })
    }

    fn write_int(&mut self, series: DataSeries, value: i32) -> Result<()> {
        let codec = lookup(&self.codecs, series)?;
        codec.write_int(&mut self.streams, value)
    }

    fn write_byte(&mut self, series: DataSeries, value: u8) -> Result<()> {
        let codec = lookup(&self.codecs, series)?;
        codec.write_byte(&mut self.streams, value)
    }

    fn write_bytes(&mut self, series: DataSeries, data: &[u8]) -> Result<()> {
        let codec = lookup(&self.codecs, series)?;
        codec.write_bytes(&mut self.streams, data)
    }

    /// Serialize one record.
    pub fn write_record(&mut self, record: &CramRecord) -> Result<()> {
        self.write_int(DataSeries::BamBitFlags, record.bam_flags)?;
        self.write_int(DataSeries::CramBitFlags, record.cram_flags)?;

        if self.slice_reference_id == MULTI_REFERENCE {
            self.write_int(DataSeries::ReferenceId, record.reference_id)?;
        }

        self.write_int(DataSeries::ReadLengths, record.read_length)?;

        if self.ap_delta {
            let delta = record.alignment_start.wrapping_sub(self.last_alignment_start);
            self.write_int(DataSeries::InSeqPositions, delta)?;
        } else {
            self.write_int(DataSeries::InSeqPositions, record.alignment_start)?;
        }
        self.last_alignment_start = record.alignment_start;

        self.write_int(DataSeries::ReadGroups, record.read_group)?;

        if self.read_names_included {
            self.write_bytes(DataSeries::ReadNames, &record.read_name)?;
        }

        match (&record.mate, record.cram_flags) {
            (
                MateInfo::Detached {
                    mate_flags,
                    mate_reference_id,
                    mate_alignment_start,
                    template_size,
                },
                cf,
            ) if cf & CF_DETACHED != 0 => {
                self.write_int(DataSeries::NextMateBitFlags, *mate_flags)?;
                if !self.read_names_included {
                    self.write_bytes(DataSeries::ReadNames, &record.read_name)?;
                }
                self.write_int(
                    DataSeries::NextFragmentReferenceSequenceId,
                    *mate_reference_id,
                )?;
                self.write_int(DataSeries::NextMateAlignmentStart, *mate_alignment_start)?;
                self.write_int(DataSeries::TemplateSize, *template_size)?;
            }
            (MateInfo::Downstream { distance }, cf) if cf & CF_HAS_MATE_DOWNSTREAM != 0 => {
                self.write_int(DataSeries::DistanceToNextFragment, *distance)?;
            }
            (MateInfo::None, cf) if cf & (CF_DETACHED | CF_HAS_MATE_DOWNSTREAM) == 0 => {}
            _ => {
                return Err(HtsCodecError::malformed_record(
                    "CF mate flags disagree with the record's mate information",
                ));
            }
        }

        self.write_int(DataSeries::TagIds, record.tag_line)?;
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
        if tag_keys.len() != record.tags.len() {
            return Err(HtsCodecError::malformed_record(format!(
                "record carries {} tag values but line {} declares {}",
                record.tags.len(),
                record.tag_line,
                tag_keys.len()
            )));
        }
        for (key, value) in tag_keys.iter().zip(&record.tags) {
            let codec = self.tag_codecs.get(key).ok_or_else(|| {
                HtsCodecError::malformed_record(format!("no encoding for tag key {key:#08x}"))
            })?;
            codec.write_bytes(&mut self.streams, value)?;
        }

        if record.is_unmapped() {
            self.write_unmapped_body(record)?;
        } else {
            self.write_mapped_body(record)?;
        }
        Ok(())
    }

    fn write_mapped_body(&mut self, record: &CramRecord) -> Result<()> {
        self.write_int(DataSeries::NumberOfReadFeatures, record.features.len() as i32)?;
        let mut previous = 0i32;
        for feature in &record.features {
            self.write_byte(DataSeries::ReadFeaturesCodes, feature.code())?;
            self.write_int(DataSeries::InReadPositions, feature.position() - previous)?;
            previous = feature.position();
            match feature {
                ReadFeature::ReadBase {
                    base, quality, ..
                } => {
                    self.write_byte(DataSeries::Bases, *base)?;
                    self.write_byte(DataSeries::QualityScores, *quality)?;
                }
                ReadFeature::Substitution { code, .. } => {
                    self.write_byte(DataSeries::BaseSubstitutionCodes, *code)?;
                }
                ReadFeature::Insertion { bases, .. } => {
                    self.write_bytes(DataSeries::Insertion, bases)?;
                }
                ReadFeature::SoftClip { bases, .. } => {
                    self.write_bytes(DataSeries::SoftClip, bases)?;
                }
                ReadFeature::HardClip { length, .. } => {
                    self.write_int(DataSeries::HardClip, *length)?;
                }
                ReadFeature::Padding { length, .. } => {
                    self.write_int(DataSeries::Padding, *length)?;
                }
                ReadFeature::Deletion { length, .. } => {
                    self.write_int(DataSeries::DeletionLengths, *length)?;
                }
                ReadFeature::RefSkip { length, .. } => {
                    self.write_int(DataSeries::ReferenceSkipLength, *length)?;
                }
                ReadFeature::InsertBase { base, .. } => {
                    self.write_byte(DataSeries::Bases, *base)?;
                }
                ReadFeature::Bases { bases, .. } => {
                    self.write_bytes(DataSeries::StretchesOfBases, bases)?;
                }
                ReadFeature::Scores { scores, .. } => {
                    self.write_bytes(DataSeries::StretchesOfQualityScores, scores)?;
                }
                ReadFeature::Quality { score, .. } => {
                    self.write_byte(DataSeries::QualityScores, *score)?;
                }
            }
        }

        self.write_int(DataSeries::MappingQualities, record.mapping_quality)?;
        if record.cram_flags & CF_QUALITY_SCORES_STORED != 0 {
            self.check_scores_length(record)?;
            self.write_bytes(DataSeries::QualityScores, &record.quality_scores)?;
        }
        Ok(())
    }

    fn write_unmapped_body(&mut self, record: &CramRecord) -> Result<()> {
        if record.cram_flags & CF_UNKNOWN_BASES == 0 {
            if record.bases.len() != record.read_length as usize {
                return Err(HtsCodecError::value_out_of_range(format!(
                    "{} bases stored for read length {}",
                    record.bases.len(),
                    record.read_length
                )));
            }
            for &base in &record.bases {
                self.write_byte(DataSeries::Bases, base)?;
            }
        }
        if record.cram_flags & CF_QUALITY_SCORES_STORED != 0 {
            self.check_scores_length(record)?;
            self.write_bytes(DataSeries::QualityScores, &record.quality_scores)?;
        }
        Ok(())
    }

    fn check_scores_length(&self, record: &CramRecord) -> Result<()> {
        if record.quality_scores.len() != record.read_length as usize {
            return Err(HtsCodecError::value_out_of_range(format!(
                "{} quality scores stored for read length {}",
                record.quality_scores.len(),
                record.read_length
            )));
        }
        Ok(())
    }

    /// Finish the slice: flush the core bitstream and hand back all
    /// buffers for block compression.
    pub fn finish(self) -> (Vec<u8>, BTreeMap<i32, Vec<u8>>) {
        self.streams.finish()
    }
}
