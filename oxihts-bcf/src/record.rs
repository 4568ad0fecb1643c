//! The BCF record codec: site block, INFO pairs, and the genotype block.
//!
//! A record on the wire is
//!
//! ```text
//! site_len:u32le | gt_len:u32le | site block | genotype block
//! ```
//!
//! The site block opens with four untyped little-endian words (contig
//! offset, 0-based position, reference length, QUAL bits) and two packed
//! count words, then switches to typed values for ID, alleles, FILTER and
//! INFO. The genotype block is decoded on demand unless a sample reorder
//! is installed, in which case it is decoded eagerly so the new ordering
//! is frozen before any consumer sees it.

use crate::types::{
    FLOAT_MISSING_BITS, TypedValue, read_typed_scalar_int, read_typed_string, read_typed_value,
    write_int_vec, write_typed_int, write_typed_string, write_typed_value,
};
use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};
use std::cell::OnceCell;

/// One FORMAT field across all samples.
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeField {
    /// String-dictionary offset of the field name.
    pub key: i32,
    /// The flat value vector, `values_per_sample * n_samples` elements.
    pub values: TypedValue,
}

/// The per-sample portion of a record, decoded on demand.
#[derive(Debug, Clone, Default)]
pub struct GenotypeBlock {
    raw: Vec<u8>,
    n_fmt: usize,
    n_samples: usize,
    fields: OnceCell<Vec<GenotypeField>>,
}

impl GenotypeBlock {
    /// Wrap raw genotype bytes for lazy decoding.
    pub fn new(raw: Vec<u8>, n_fmt: usize, n_samples: usize) -> Self {
        Self {
            raw,
            n_fmt,
            n_samples,
            fields: OnceCell::new(),
        }
    }

    /// Wrap raw bytes and a sample reorder map: `reorder[i]` is the old
    /// index of the sample that comes `i`-th in the new order. Decoding
    /// happens eagerly so the frozen ordering is what lazy consumers see.
    pub fn with_reorder(
        raw: Vec<u8>,
        n_fmt: usize,
        n_samples: usize,
        reorder: &[usize],
    ) -> Result<Self> {
        if reorder.len() != n_samples {
            return Err(HtsCodecError::malformed_record(format!(
                "reorder map covers {} samples of {n_samples}",
                reorder.len()
            )));
        }
        let block = Self::new(raw, n_fmt, n_samples);
        let mut fields = block.decode_raw()?;
        for field in &mut fields {
            field.values = permute(&field.values, n_samples, reorder)?;
        }
        let _ = block.fields.set(fields);
        Ok(block)
    }

    /// Build a block directly from decoded fields (the encode path).
    pub fn from_fields(fields: Vec<GenotypeField>, n_samples: usize) -> Self {
        let block = Self {
            raw: Vec::new(),
            n_fmt: fields.len(),
            n_samples,
            fields: OnceCell::new(),
        };
        let _ = block.fields.set(fields);
        block
    }

    /// Number of FORMAT fields.
    pub fn n_fields(&self) -> usize {
        self.n_fmt
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// The decoded fields, decoding now if this is the first access.
    pub fn fields(&self) -> Result<&[GenotypeField]> {
        if let Some(fields) = self.fields.get() {
            return Ok(fields);
        }
        let decoded = self.decode_raw()?;
        Ok(self.fields.get_or_init(|| decoded))
    }

    fn decode_raw(&self) -> Result<Vec<GenotypeField>> {
        let mut cur = ByteCursor::new(&self.raw);
        let mut fields = Vec::with_capacity(self.n_fmt);
        for _ in 0..self.n_fmt {
            let key = read_typed_scalar_int(&mut cur)?;
            let values = read_typed_value(&mut cur)?;
            if self.n_samples > 0 && values.len() % self.n_samples != 0 {
                return Err(HtsCodecError::malformed_record(format!(
                    "genotype vector of {} values across {} samples",
                    values.len(),
                    self.n_samples
                )));
            }
            fields.push(GenotypeField { key, values });
        }
        if !cur.is_empty() {
            return Err(HtsCodecError::malformed_record(format!(
                "{} trailing bytes in the genotype block",
                cur.remaining()
            )));
        }
        Ok(fields)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        if let Some(fields) = self.fields.get() {
            let mut out = Vec::new();
            for field in fields {
                write_typed_int(&mut out, field.key);
                write_typed_value(&mut out, &field.values);
            }
            Ok(out)
        } else {
            Ok(self.raw.clone())
        }
    }
}

fn permute(values: &TypedValue, n_samples: usize, reorder: &[usize]) -> Result<TypedValue> {
    fn shuffle<T: Clone>(v: &[T], n_samples: usize, reorder: &[usize]) -> Result<Vec<T>> {
        let k = v.len() / n_samples;
        let mut out = Vec::with_capacity(v.len());
        for &old in reorder {
            let chunk = v.get(old * k..(old + 1) * k).ok_or_else(|| {
                HtsCodecError::malformed_record(format!("reorder index {old} out of range"))
            })?;
            out.extend_from_slice(chunk);
        }
        Ok(out)
    }

    if n_samples == 0 {
        return Ok(values.clone());
    }
    Ok(match values {
        TypedValue::Missing => TypedValue::Missing,
        TypedValue::Int8(v) => TypedValue::Int8(shuffle(v, n_samples, reorder)?),
        TypedValue::Int16(v) => TypedValue::Int16(shuffle(v, n_samples, reorder)?),
        TypedValue::Int32(v) => TypedValue::Int32(shuffle(v, n_samples, reorder)?),
        TypedValue::Float(v) => TypedValue::Float(shuffle(v, n_samples, reorder)?),
        TypedValue::String(v) => TypedValue::String(shuffle(v, n_samples, reorder)?),
    })
}

/// One BCF record.
#[derive(Debug, Clone, Default)]
pub struct BcfRecord {
    /// Contig dictionary offset.
    pub chrom: i32,
    /// 0-based position as stored.
    pub pos: i32,
    /// Reference allele length.
    pub rlen: i32,
    /// QUAL, `None` when missing.
    pub qual: Option<f32>,
    /// The ID column, empty for ".".
    pub id: Vec<u8>,
    /// Alleles, REF first.
    pub alleles: Vec<Vec<u8>>,
    /// FILTER as string-dictionary offsets; empty means unfiltered.
    pub filters: Vec<i32>,
    /// INFO pairs of (string-dictionary offset, value). FLAG keys carry
    /// [`TypedValue::Missing`].
    pub info: Vec<(i32, TypedValue)>,
    /// The genotype block.
    pub genotypes: GenotypeBlock,
}

impl BcfRecord {
    /// 1-based start position.
    pub fn start(&self) -> i32 {
        self.pos + 1
    }

    /// 1-based inclusive end position.
    pub fn end(&self) -> i32 {
        self.pos + self.rlen
    }

    /// The value stored for an INFO key.
    pub fn info_value(&self, key: i32) -> Option<&TypedValue> {
        self.info
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Whether a FLAG INFO key is present (presence means TRUE).
    pub fn flag(&self, key: i32) -> bool {
        self.info_value(key).is_some()
    }

    /// Whether the record passed filtering (FILTER holds offset 0).
    pub fn is_pass(&self) -> bool {
        self.filters == [0]
    }

    /// Whether the record was never filtered (FILTER is empty).
    pub fn is_unfiltered(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Serialize one record, length prefixes included.
pub fn write_record(out: &mut Vec<u8>, record: &BcfRecord) -> Result<()> {
    let n_alleles = record.alleles.len();
    let n_info = record.info.len();
    if n_alleles > 0xFFFF || n_info > 0xFFFF {
        return Err(HtsCodecError::value_out_of_range(format!(
            "{n_alleles} alleles / {n_info} info keys exceed the 16-bit count fields"
        )));
    }
    let n_fmt = record.genotypes.n_fields();
    let n_samples = record.genotypes.n_samples();
    if n_fmt > 0xFF || n_samples > 0xFF_FFFF {
        return Err(HtsCodecError::value_out_of_range(format!(
            "{n_fmt} format fields / {n_samples} samples exceed the packed count field"
        )));
    }

    let mut site = Vec::new();
    site.extend_from_slice(&record.chrom.to_le_bytes());
    site.extend_from_slice(&record.pos.to_le_bytes());
    site.extend_from_slice(&record.rlen.to_le_bytes());
    let qual_bits = record.qual.map_or(FLOAT_MISSING_BITS, f32::to_bits);
    site.extend_from_slice(&qual_bits.to_le_bytes());
    site.extend_from_slice(&(((n_alleles as u32) << 16) | n_info as u32).to_le_bytes());
    site.extend_from_slice(&(((n_fmt as u32) << 24) | n_samples as u32).to_le_bytes());

    write_typed_string(&mut site, &record.id);
    for allele in &record.alleles {
        write_typed_value(&mut site, &TypedValue::String(allele.clone()));
    }
    write_int_vec(&mut site, &record.filters);
    for (key, value) in &record.info {
        write_typed_int(&mut site, *key);
        write_typed_value(&mut site, value);
    }

    let gt = record.genotypes.encode()?;

    out.extend_from_slice(&(site.len() as u32).to_le_bytes());
    out.extend_from_slice(&(gt.len() as u32).to_le_bytes());
    out.extend_from_slice(&site);
    out.extend_from_slice(&gt);
    Ok(())
}

/// Deserialize one record.
pub fn read_record(cur: &mut ByteCursor<'_>) -> Result<BcfRecord> {
    read_record_with(cur, None)
}

/// Deserialize one record, optionally installing a sample reorder map
/// (which forces eager genotype decoding).
pub fn read_record_with(cur: &mut ByteCursor<'_>, reorder: Option<&[usize]>) -> Result<BcfRecord> {
    let site_len = cur.read_u32_le()? as usize;
    let gt_len = cur.read_u32_le()? as usize;
    let mut site = ByteCursor::new(cur.take(site_len)?);
    let gt = cur.take(gt_len)?;

    let chrom = site.read_i32_le()?;
    let pos = site.read_i32_le()?;
    let rlen = site.read_i32_le()?;
    let qual_bits = site.read_u32_le()?;
    let qual = if qual_bits == FLOAT_MISSING_BITS {
        None
    } else {
        Some(f32::from_bits(qual_bits))
    };

    let packed = site.read_u32_le()?;
    let n_alleles = (packed >> 16) as usize;
    let n_info = (packed & 0xFFFF) as usize;
    let packed = site.read_u32_le()?;
    let n_fmt = (packed >> 24) as usize;
    let n_samples = (packed & 0xFF_FFFF) as usize;

    let id = read_typed_string(&mut site)?;
    let mut alleles = Vec::with_capacity(n_alleles);
    for _ in 0..n_alleles {
        match read_typed_value(&mut site)? {
            TypedValue::String(s) => alleles.push(s),
            other => {
                return Err(HtsCodecError::malformed_record(format!(
                    "allele stored as {other:?}, expected CHAR"
                )));
            }
        }
    }

    let filters = match read_typed_value(&mut site)? {
        TypedValue::Missing => Vec::new(),
        value => value
            .as_ints()
            .map(<[i32]>::to_vec)
            .ok_or_else(|| {
                HtsCodecError::malformed_record("FILTER vector is not integral")
            })?,
    };

    let mut info = Vec::with_capacity(n_info);
    for _ in 0..n_info {
        let key = read_typed_scalar_int(&mut site)?;
        let value = read_typed_value(&mut site)?;
        info.push((key, value));
    }

    if !site.is_empty() {
        return Err(HtsCodecError::malformed_record(format!(
            "{} trailing bytes in the site block",
            site.remaining()
        )));
    }

    let genotypes = match reorder {
        Some(map) => GenotypeBlock::with_reorder(gt.to_vec(), n_fmt, n_samples, map)?,
        None => GenotypeBlock::new(gt.to_vec(), n_fmt, n_samples),
    };

    Ok(BcfRecord {
        chrom,
        pos,
        rlen,
        qual,
        id,
        alleles,
        filters,
        info,
        genotypes,
    })
}

/// Reads successive records, remembering the offset of the last record
/// that decoded completely for error reporting.
#[derive(Debug)]
pub struct RecordDecoder<'a> {
    cur: ByteCursor<'a>,
    last_good_offset: usize,
}

impl<'a> RecordDecoder<'a> {
    /// Start decoding at the current position of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cur: ByteCursor::new(data),
            last_good_offset: 0,
        }
    }

    /// Byte offset just past the last fully decoded record.
    pub fn last_good_offset(&self) -> usize {
        self.last_good_offset
    }

    /// Decode the next record, or `None` at a clean end of stream.
    pub fn next_record(&mut self) -> Result<Option<BcfRecord>> {
        if self.cur.is_empty() {
            return Ok(None);
        }
        let at = self.last_good_offset;
        match read_record(&mut self.cur) {
            Ok(record) => {
                self.last_good_offset = self.cur.position();
                Ok(Some(record))
            }
            Err(e) => Err(HtsCodecError::malformed_record(format!(
                "record after offset {at}: {e}"
            ))),
        }
    }
}
