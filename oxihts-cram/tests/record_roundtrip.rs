//! Whole-record round trips through a realistic mixed core/external
//! compression header.

use oxihts_cram::record::{
    CF_DETACHED, CF_HAS_MATE_DOWNSTREAM, CF_QUALITY_SCORES_STORED, CF_UNKNOWN_BASES,
};
use oxihts_cram::{
    CompressionHeader, CramRecord, DataSeries, Encoding, MULTI_REFERENCE, MateInfo, ReadFeature,
    RecordReader, RecordWriter, tag_key,
};
use std::collections::HashMap;

fn external(content_id: i32) -> Encoding {
    Encoding::External { content_id }
}

/// A header exercising core-bit codecs and external streams side by side.
fn test_header() -> CompressionHeader {
    let mut header = CompressionHeader::new();
    header.preservation.ap_delta = true;
    header.preservation.read_names_included = true;

    header
        .set_encoding(DataSeries::BamBitFlags, Encoding::Beta { offset: 0, bits: 16 })
        .set_encoding(DataSeries::CramBitFlags, external(2))
        .set_encoding(DataSeries::ReferenceId, external(3))
        .set_encoding(DataSeries::ReadLengths, Encoding::Gamma { offset: 1 })
        .set_encoding(DataSeries::InSeqPositions, external(5))
        .set_encoding(DataSeries::ReadGroups, external(6))
        .set_encoding(
            DataSeries::ReadNames,
            Encoding::ByteArrayStop {
                stop_byte: 0,
                content_id: 7,
            },
        )
        .set_encoding(DataSeries::NextMateBitFlags, external(8))
        .set_encoding(DataSeries::NextFragmentReferenceSequenceId, external(9))
        .set_encoding(DataSeries::NextMateAlignmentStart, external(10))
        .set_encoding(DataSeries::TemplateSize, external(11))
        .set_encoding(DataSeries::DistanceToNextFragment, external(12))
        .set_encoding(DataSeries::TagIds, external(13))
        .set_encoding(DataSeries::NumberOfReadFeatures, Encoding::Gamma { offset: 1 })
        .set_encoding(
            DataSeries::ReadFeaturesCodes,
            Encoding::Huffman {
                alphabet: vec![
                    i32::from(b'B'),
                    i32::from(b'X'),
                    i32::from(b'I'),
                    i32::from(b'S'),
                    i32::from(b'H'),
                    i32::from(b'D'),
                    i32::from(b'i'),
                    i32::from(b'Q'),
                ],
                bit_lengths: vec![3, 3, 3, 3, 3, 3, 3, 3],
            },
        )
        .set_encoding(DataSeries::InReadPositions, Encoding::Gamma { offset: 1 })
        .set_encoding(DataSeries::DeletionLengths, Encoding::GolombRice { offset: 0, log2m: 2 })
        .set_encoding(DataSeries::Bases, external(17))
        .set_encoding(DataSeries::QualityScores, external(18))
        .set_encoding(DataSeries::BaseSubstitutionCodes, Encoding::Beta { offset: 0, bits: 3 })
        .set_encoding(
            DataSeries::Insertion,
            Encoding::ByteArrayStop {
                stop_byte: 0,
                content_id: 20,
            },
        )
        .set_encoding(
            DataSeries::SoftClip,
            Encoding::ByteArrayLen {
                len_encoding: Box::new(Encoding::Gamma { offset: 1 }),
                bytes_encoding: Box::new(external(22)),
            },
        )
        .set_encoding(DataSeries::HardClip, Encoding::Subexponential { offset: 0, k: 2 })
        .set_encoding(DataSeries::MappingQualities, external(28));

    let nm = tag_key(*b"NM", b'c');
    header.set_tag_encoding(
        nm,
        Encoding::ByteArrayLen {
            len_encoding: Box::new(Encoding::Huffman {
                alphabet: vec![1],
                bit_lengths: vec![0],
            }),
            bytes_encoding: Box::new(external(40)),
        },
    );
    header.tag_dictionary = vec![vec![], vec![nm]];
    header
}

fn mapped_record() -> CramRecord {
    CramRecord {
        bam_flags: 0x63,
        cram_flags: CF_QUALITY_SCORES_STORED | CF_HAS_MATE_DOWNSTREAM,
        reference_id: 1,
        read_length: 8,
        alignment_start: 1_000_123,
        read_group: 0,
        read_name: b"read.0001".to_vec(),
        mate: MateInfo::Downstream { distance: 2 },
        tag_line: 0,
        tags: vec![],
        features: vec![
            ReadFeature::Substitution {
                position: 2,
                code: 3,
            },
            ReadFeature::Deletion {
                position: 4,
                length: 11,
            },
            ReadFeature::SoftClip {
                position: 5,
                bases: b"ACGT".to_vec(),
            },
            ReadFeature::InsertBase {
                position: 7,
                base: b'T',
            },
        ],
        mapping_quality: 37,
        bases: vec![],
        quality_scores: vec![30, 31, 32, 33, 34, 35, 36, 37],
    }
}

fn detached_unmapped_record() -> CramRecord {
    CramRecord {
        bam_flags: 0x4,
        cram_flags: CF_DETACHED,
        reference_id: -1,
        read_length: 4,
        alignment_start: 1_000_200,
        read_group: -1,
        read_name: b"read.0002".to_vec(),
        mate: MateInfo::Detached {
            mate_flags: 0x2,
            mate_reference_id: 3,
            mate_alignment_start: 77_777,
            template_size: -150,
        },
        tag_line: 1,
        tags: vec![vec![0x05]],
        features: vec![],
        mapping_quality: 0,
        bases: b"ACGT".to_vec(),
        quality_scores: vec![],
    }
}

fn unknown_bases_record() -> CramRecord {
    CramRecord {
        bam_flags: 0x4,
        cram_flags: CF_UNKNOWN_BASES,
        reference_id: 2,
        read_length: 100,
        alignment_start: 1_000_200,
        read_group: -1,
        read_name: b"read.0003".to_vec(),
        mate: MateInfo::None,
        tag_line: 0,
        tags: vec![],
        features: vec![],
        mapping_quality: 0,
        bases: vec![],
        quality_scores: vec![],
    }
}

#[test]
fn test_record_roundtrip_multi_reference_delta() {
    let header = test_header();
    let records = [
        mapped_record(),
        detached_unmapped_record(),
        unknown_bases_record(),
    ];

    let mut writer = RecordWriter::new(&header, MULTI_REFERENCE, 1_000_000).unwrap();
    for record in &records {
        writer.write_record(record).unwrap();
    }
    let (core, external_blocks) = writer.finish();

    let borrowed: HashMap<i32, &[u8]> = external_blocks
        .iter()
        .map(|(&k, v)| (k, v.as_slice()))
        .collect();
    let mut reader =
        RecordReader::new(&header, &core, &borrowed, MULTI_REFERENCE, 1_000_000).unwrap();
    for expected in &records {
        let decoded = reader.read_record().unwrap();
        assert_eq!(&decoded, expected);
    }
}

#[test]
fn test_single_reference_slice_skips_ri() {
    let header = test_header();
    let mut record = mapped_record();
    record.reference_id = 5;

    let mut writer = RecordWriter::new(&header, 5, 0).unwrap();
    writer.write_record(&record).unwrap();
    let (core, external_blocks) = writer.finish();

    // RI's external block must stay untouched in a single-reference slice.
    assert!(!external_blocks.contains_key(&3));

    let borrowed: HashMap<i32, &[u8]> = external_blocks
        .iter()
        .map(|(&k, v)| (k, v.as_slice()))
        .collect();
    let mut reader = RecordReader::new(&header, &core, &borrowed, 5, 0).unwrap();
    assert_eq!(reader.read_record().unwrap(), record);
}

#[test]
fn test_missing_ri_series_is_fatal_in_multi_reference_slices() {
    let mut header = test_header();
    header.encodings.remove(&DataSeries::ReferenceId);

    let mut writer = RecordWriter::new(&header, MULTI_REFERENCE, 0).unwrap();
    assert!(writer.write_record(&mapped_record()).is_err());
}

#[test]
fn test_unknown_feature_operator_is_fatal() {
    // Encode FC as beta with offset 0, decode with offset 1: every
    // operator byte shifts down by one, so the substitution 'X' arrives
    // as 'W', which no reader knows.
    let mut header = test_header();
    header.set_encoding(
        DataSeries::ReadFeaturesCodes,
        Encoding::Beta { offset: 0, bits: 8 },
    );

    let mut record = mapped_record();
    record.features = vec![ReadFeature::Substitution {
        position: 1,
        code: 2,
    }];

    let mut writer = RecordWriter::new(&header, MULTI_REFERENCE, 0).unwrap();
    writer.write_record(&record).unwrap();
    let (core, external_blocks) = writer.finish();

    let mut misread_header = header.clone();
    misread_header.set_encoding(
        DataSeries::ReadFeaturesCodes,
        Encoding::Beta { offset: 1, bits: 8 },
    );
    let borrowed: HashMap<i32, &[u8]> = external_blocks
        .iter()
        .map(|(&k, v)| (k, v.as_slice()))
        .collect();
    let mut reader =
        RecordReader::new(&misread_header, &core, &borrowed, MULTI_REFERENCE, 0).unwrap();
    assert!(reader.read_record().is_err());
}

#[test]
fn test_composite_length_descriptor_reads_fixed_width_arrays() {
    // BYTE_ARRAY_LEN(len = single-value huffman of 3, bytes = external 42)
    // parses back to itself and pulls exactly three bytes per read.
    let descriptor = Encoding::ByteArrayLen {
        len_encoding: Box::new(Encoding::Huffman {
            alphabet: vec![3],
            bit_lengths: vec![0],
        }),
        bytes_encoding: Box::new(Encoding::External { content_id: 42 }),
    };
    let mut wire = Vec::new();
    descriptor.serialize(&mut wire);
    let mut cur = oxihts_core::ByteCursor::new(&wire);
    assert_eq!(Encoding::parse(&mut cur).unwrap(), descriptor);

    let codec = oxihts_cram::SeriesCodec::from_encoding(&descriptor).unwrap();
    let block: &[u8] = b"ACGTTT";
    let mut blocks = HashMap::new();
    blocks.insert(42, block);
    let mut streams = oxihts_cram::streams::ReadStreams::new(&[], &blocks);
    assert_eq!(codec.read_bytes(&mut streams, None).unwrap(), b"ACG");
    assert_eq!(codec.read_bytes(&mut streams, None).unwrap(), b"TTT");
}
