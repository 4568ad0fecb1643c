//! The in-memory form of one compression record.

/// CF bit: quality scores are stored as a whole array.
pub const CF_QUALITY_SCORES_STORED: i32 = 0x1;
/// CF bit: mate information is detached and travels inline.
pub const CF_DETACHED: i32 = 0x2;
/// CF bit: the mate is a later record in this slice.
pub const CF_HAS_MATE_DOWNSTREAM: i32 = 0x4;
/// CF bit: bases are unknown and not stored.
pub const CF_UNKNOWN_BASES: i32 = 0x8;

/// BF bit: segment unmapped.
pub const BF_SEGMENT_UNMAPPED: i32 = 0x4;

/// Mate information for one record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MateInfo {
    /// Single fragment, or mate data not recorded.
    #[default]
    None,
    /// The mate is `distance` records downstream in the same slice.
    Downstream {
        /// Records between this one and its mate.
        distance: i32,
    },
    /// Full mate description stored inline.
    Detached {
        /// MF mate flags.
        mate_flags: i32,
        /// NS mate reference sequence id.
        mate_reference_id: i32,
        /// NP mate alignment start.
        mate_alignment_start: i32,
        /// TS template size.
        template_size: i32,
    },
}

/// One read feature: an edit against the reference at an in-read position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFeature {
    /// `B`: one base with its quality score.
    ReadBase {
        /// 1-based in-read position.
        position: i32,
        /// The base.
        base: u8,
        /// Its quality score.
        quality: u8,
    },
    /// `X`: substitution code against the reference.
    Substitution {
        /// 1-based in-read position.
        position: i32,
        /// Substitution matrix code.
        code: u8,
    },
    /// `I`: inserted bases.
    Insertion {
        /// 1-based in-read position.
        position: i32,
        /// The inserted bases.
        bases: Vec<u8>,
    },
    /// `S`: soft-clipped bases.
    SoftClip {
        /// 1-based in-read position.
        position: i32,
        /// The clipped bases.
        bases: Vec<u8>,
    },
    /// `H`: hard clip length.
    HardClip {
        /// 1-based in-read position.
        position: i32,
        /// Clipped length.
        length: i32,
    },
    /// `P`: padding length.
    Padding {
        /// 1-based in-read position.
        position: i32,
        /// Pad length.
        length: i32,
    },
    /// `D`: deletion length.
    Deletion {
        /// 1-based in-read position.
        position: i32,
        /// Deleted length.
        length: i32,
    },
    /// `N`: reference skip length.
    RefSkip {
        /// 1-based in-read position.
        position: i32,
        /// Skipped length.
        length: i32,
    },
    /// `i`: a single inserted base.
    InsertBase {
        /// 1-based in-read position.
        position: i32,
        /// The base.
        base: u8,
    },
    /// `b`: a stretch of bases.
    Bases {
        /// 1-based in-read position.
        position: i32,
        /// The bases.
        bases: Vec<u8>,
    },
    /// `q`: a stretch of quality scores.
    Scores {
        /// 1-based in-read position.
        position: i32,
        /// The scores.
        scores: Vec<u8>,
    },
    /// `Q`: a single quality score.
    Quality {
        /// 1-based in-read position.
        position: i32,
        /// The score.
        score: u8,
    },
}

impl ReadFeature {
    /// The operator byte for this feature.
    pub fn code(&self) -> u8 {
        match self {
            Self::ReadBase { .. } => b'B',
            Self::Substitution { .. } => b'X',
            Self::Insertion { .. } => b'I',
            Self::SoftClip { .. } => b'S',
            Self::HardClip { .. } => b'H',
            Self::Padding { .. } => b'P',
            Self::Deletion { .. } => b'D',
            Self::RefSkip { .. } => b'N',
            Self::InsertBase { .. } => b'i',
            Self::Bases { .. } => b'b',
            Self::Scores { .. } => b'q',
            Self::Quality { .. } => b'Q',
        }
    }

    /// The 1-based in-read position of this feature.
    pub fn position(&self) -> i32 {
        match self {
            Self::ReadBase { position, .. }
            | Self::Substitution { position, .. }
            | Self::Insertion { position, .. }
            | Self::SoftClip { position, .. }
            | Self::HardClip { position, .. }
            | Self::Padding { position, .. }
            | Self::Deletion { position, .. }
            | Self::RefSkip { position, .. }
            | Self::InsertBase { position, .. }
            | Self::Bases { position, .. }
            | Self::Scores { position, .. }
            | Self::Quality { position, .. } => *position,
        }
    }
}

/// One deserialized compression record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CramRecord {
    /// BF: BAM bit flags.
    pub bam_flags: i32,
    /// CF: CRAM bit flags.
    pub cram_flags: i32,
    /// Reference sequence id, per record in multi-reference slices.
    pub reference_id: i32,
    /// RL: read length.
    pub read_length: i32,
    /// AP: absolute alignment start (delta already resolved).
    pub alignment_start: i32,
    /// RG: read group index, -1 for none.
    pub read_group: i32,
    /// RN: read name.
    pub read_name: Vec<u8>,
    /// Mate description.
    pub mate: MateInfo,
    /// TL: index into the header's tag dictionary.
    pub tag_line: i32,
    /// Raw tag values, parallel to the dictionary line's keys.
    pub tags: Vec<Vec<u8>>,
    /// Read features for mapped records.
    pub features: Vec<ReadFeature>,
    /// MQ: mapping quality.
    pub mapping_quality: i32,
    /// Bases for unmapped records stored verbatim.
    pub bases: Vec<u8>,
    /// Quality scores when stored as an array.
    pub quality_scores: Vec<u8>,
}

impl CramRecord {
    /// Whether BF marks this record unmapped.
    pub fn is_unmapped(&self) -> bool {
        self.bam_flags & BF_SEGMENT_UNMAPPED != 0
    }

    /// Whether CF marks the mate as detached.
    pub fn is_detached(&self) -> bool {
        self.cram_flags & CF_DETACHED != 0
    }

    /// Whether CF stores the quality-score array.
    pub fn has_stored_scores(&self) -> bool {
        self.cram_flags & CF_QUALITY_SCORES_STORED != 0
    }
}
