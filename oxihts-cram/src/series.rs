//! The named data series of a compression record.
//!
//! Each series is one logical column: the slice's compression header maps
//! it to an encoding descriptor, and the record reader/writer visits the
//! series in a fixed order that is part of the wire contract.

/// Element type a series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Single bytes.
    Byte,
    /// 32-bit integers.
    Int,
    /// 64-bit integers.
    Long,
    /// Variable-length byte arrays.
    ByteArray,
}

/// A CRAM data series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSeries {
    /// BF: BAM bit flags.
    BamBitFlags,
    /// CF: CRAM bit flags.
    CramBitFlags,
    /// RI: reference id, present in multi-reference slices.
    ReferenceId,
    /// RL: read length.
    ReadLengths,
    /// AP: alignment position, possibly delta-coded.
    InSeqPositions,
    /// RG: read group index.
    ReadGroups,
    /// RN: read name.
    ReadNames,
    /// MF: next mate bit flags.
    NextMateBitFlags,
    /// NS: next fragment reference sequence id.
    NextFragmentReferenceSequenceId,
    /// NP: next mate alignment start.
    NextMateAlignmentStart,
    /// TS: template size.
    TemplateSize,
    /// NF: records to the next fragment.
    DistanceToNextFragment,
    /// TL: tag-line index into the tag dictionary.
    TagIds,
    /// FN: number of read features.
    NumberOfReadFeatures,
    /// FC: read-feature operator.
    ReadFeaturesCodes,
    /// FP: in-read position delta.
    InReadPositions,
    /// DL: deletion length.
    DeletionLengths,
    /// BB: stretch of bases.
    StretchesOfBases,
    /// QQ: stretch of quality scores.
    StretchesOfQualityScores,
    /// BA: single base.
    Bases,
    /// QS: single quality score (and the per-read score array).
    QualityScores,
    /// BS: base substitution code.
    BaseSubstitutionCodes,
    /// IN: inserted bases.
    Insertion,
    /// RS: reference skip length.
    ReferenceSkipLength,
    /// PD: padding length.
    Padding,
    /// HC: hard clip length.
    HardClip,
    /// SC: soft clip bases.
    SoftClip,
    /// MQ: mapping quality.
    MappingQualities,
}

impl DataSeries {
    /// The two-letter wire key.
    pub fn key(self) -> &'static str {
        match self {
            Self::BamBitFlags => "BF",
            Self::CramBitFlags => "CF",
            Self::ReferenceId => "RI",
            Self::ReadLengths => "RL",
            Self::InSeqPositions => "AP",
            Self::ReadGroups => "RG",
            Self::ReadNames => "RN",
            Self::NextMateBitFlags => "MF",
            Self::NextFragmentReferenceSequenceId => "NS",
            Self::NextMateAlignmentStart => "NP",
            Self::TemplateSize => "TS",
            Self::DistanceToNextFragment => "NF",
            Self::TagIds => "TL",
            Self::NumberOfReadFeatures => "FN",
            Self::ReadFeaturesCodes => "FC",
            Self::InReadPositions => "FP",
            Self::DeletionLengths => "DL",
            Self::StretchesOfBases => "BB",
            Self::StretchesOfQualityScores => "QQ",
            Self::Bases => "BA",
            Self::QualityScores => "QS",
            Self::BaseSubstitutionCodes => "BS",
            Self::Insertion => "IN",
            Self::ReferenceSkipLength => "RS",
            Self::Padding => "PD",
            Self::HardClip => "HC",
            Self::SoftClip => "SC",
            Self::MappingQualities => "MQ",
        }
    }

    /// Element type this series carries.
    pub fn value_type(self) -> ValueType {
        match self {
            Self::BamBitFlags
            | Self::CramBitFlags
            | Self::ReferenceId
            | Self::ReadLengths
            | Self::InSeqPositions
            | Self::ReadGroups
            | Self::NextMateBitFlags
            | Self::NextFragmentReferenceSequenceId
            | Self::NextMateAlignmentStart
            | Self::TemplateSize
            | Self::DistanceToNextFragment
            | Self::TagIds
            | Self::NumberOfReadFeatures
            | Self::InReadPositions
            | Self::DeletionLengths
            | Self::ReferenceSkipLength
            | Self::Padding
            | Self::HardClip
            | Self::MappingQualities => ValueType::Int,
            Self::ReadFeaturesCodes
            | Self::Bases
            | Self::QualityScores
            | Self::BaseSubstitutionCodes => ValueType::Byte,
            Self::ReadNames
            | Self::StretchesOfBases
            | Self::StretchesOfQualityScores
            | Self::Insertion
            | Self::SoftClip => ValueType::ByteArray,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique() {
        let all = [
            DataSeries::BamBitFlags,
            DataSeries::CramBitFlags,
            DataSeries::ReferenceId,
            DataSeries::ReadLengths,
            DataSeries::InSeqPositions,
            DataSeries::ReadGroups,
            DataSeries::ReadNames,
            DataSeries::NextMateBitFlags,
            DataSeries::NextFragmentReferenceSequenceId,
            DataSeries::NextMateAlignmentStart,
            DataSeries::TemplateSize,
            DataSeries::DistanceToNextFragment,
            DataSeries::TagIds,
            DataSeries::NumberOfReadFeatures,
            DataSeries::ReadFeaturesCodes,
            DataSeries::InReadPositions,
            DataSeries::DeletionLengths,
            DataSeries::StretchesOfBases,
            DataSeries::StretchesOfQualityScores,
            DataSeries::Bases,
            DataSeries::QualityScores,
            DataSeries::BaseSubstitutionCodes,
            DataSeries::Insertion,
            DataSeries::ReferenceSkipLength,
            DataSeries::Padding,
            DataSeries::HardClip,
            DataSeries::SoftClip,
            DataSeries::MappingQualities,
        ];
        let mut keys: Vec<&str> = all.iter().map(|s| s.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), all.len());
    }
}
