//! End-to-end BCF scenarios: prelude framing, dictionary construction and
//! a fully decoded site with genotypes.

use oxihts_bcf::record::{GenotypeBlock, GenotypeField};
use oxihts_bcf::{
    BcfRecord, HeaderLine, HeaderLineKind, TypedValue, VersionPolicy, build_contig_dictionary,
    build_string_dictionary, read_header, read_record, write_header, write_record,
};
use oxihts_core::ByteCursor;

#[test]
fn test_dense_and_sparse_filter_dictionaries() {
    let dense = build_string_dictionary(&[
        HeaderLine::new(HeaderLineKind::Filter, "PASS", Some(0)),
        HeaderLine::new(HeaderLineKind::Filter, "q10", Some(1)),
        HeaderLine::new(HeaderLineKind::Filter, "LowQual", Some(2)),
    ])
    .unwrap();
    assert!(dense.is_dense());
    assert_eq!(
        (dense.get(0), dense.get(1), dense.get(2)),
        (Some("PASS"), Some("q10"), Some("LowQual"))
    );

    let sparse = build_string_dictionary(&[
        HeaderLine::new(HeaderLineKind::Filter, "PASS", Some(0)),
        HeaderLine::new(HeaderLineKind::Filter, "q10", Some(2)),
        HeaderLine::new(HeaderLineKind::Filter, "LowQual", Some(3)),
    ])
    .unwrap();
    assert!(!sparse.is_dense());
    assert_eq!(
        (sparse.get(0), sparse.get(2), sparse.get(3)),
        (Some("PASS"), Some("q10"), Some("LowQual"))
    );
}

#[test]
fn test_site_with_genotypes_decodes_end_to_end() {
    // Dictionaries the record's offsets resolve against.
    let strings = build_string_dictionary(&[
        HeaderLine::new(HeaderLineKind::Info, "AC", None),
        HeaderLine::new(HeaderLineKind::Info, "DB", None),
        HeaderLine::new(HeaderLineKind::Format, "GT", None),
    ])
    .unwrap();
    let contigs = build_contig_dictionary(&[HeaderLine::new(
        HeaderLineKind::Contig,
        "chr20",
        None,
    )])
    .unwrap();

    let ac = strings.index_of("AC").unwrap() as i32;
    let db = strings.index_of("DB").unwrap() as i32;
    let gt = strings.index_of("GT").unwrap() as i32;

    // pos 999, REF A, ALT C and G, FILTER PASS, AC=[1,2], DB as a flag,
    // one sample with GT 0/1 (allele+1 shifted, phase bit clear).
    let record = BcfRecord {
        chrom: 0,
        pos: 999,
        rlen: 1,
        qual: Some(50.0),
        id: Vec::new(),
        alleles: vec![b"A".to_vec(), b"C".to_vec(), b"G".to_vec()],
        filters: vec![0],
        info: vec![
            (ac, TypedValue::Int8(vec![1, 2])),
            (db, TypedValue::Missing),
        ],
        genotypes: GenotypeBlock::from_fields(
            vec![GenotypeField {
                key: gt,
                values: TypedValue::Int8(vec![2, 4]),
            }],
            1,
        ),
    };

    let mut wire = Vec::new();
    write_record(&mut wire, &record).unwrap();
    let mut cur = ByteCursor::new(&wire);
    let decoded = read_record(&mut cur).unwrap();

    assert_eq!(contigs.get(decoded.chrom as u32), Some("chr20"));
    assert_eq!(decoded.start(), 1000);
    assert_eq!(decoded.alleles, vec![b"A".to_vec(), b"C".to_vec(), b"G".to_vec()]);
    assert!(decoded.is_pass());
    assert_eq!(decoded.info_value(ac), Some(&TypedValue::Int8(vec![1, 2])));
    assert!(decoded.flag(db), "FLAG key decodes to TRUE by presence");

    let fields = decoded.genotypes.fields().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].key, gt);
    match &fields[0].values {
        TypedValue::Int8(values) => assert_eq!(values, &vec![2, 4]),
        other => panic!("genotypes stored as {other:?}, expected INT8"),
    }
}

#[test]
fn test_full_file_shape() {
    let text = b"##fileformat=VCFv4.2\n##FILTER=<ID=q10,Description=\"low\">\n#CHROM\tPOS\n";
    let mut file = Vec::new();
    write_header(&mut file, text).unwrap();
    let record = BcfRecord {
        chrom: 0,
        pos: 41,
        rlen: 1,
        qual: None,
        id: b"rs1".to_vec(),
        alleles: vec![b"T".to_vec(), b"C".to_vec()],
        filters: Vec::new(),
        info: Vec::new(),
        genotypes: GenotypeBlock::default(),
    };
    write_record(&mut file, &record).unwrap();

    let mut cur = ByteCursor::new(&file);
    let header_text = read_header(&mut cur, VersionPolicy::Strict).unwrap();
    assert_eq!(header_text, text);
    let decoded = read_record(&mut cur).unwrap();
    assert!(cur.is_empty());
    assert_eq!(decoded.id, b"rs1");
    assert!(decoded.is_unfiltered());
    assert_eq!(decoded.qual, None);
}
