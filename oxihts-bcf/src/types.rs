//! The BCF typed-value system.
//!
//! Every value starts with a descriptor byte packing the element count in
//! the high nibble and the type id in the low nibble; a count of 15 is the
//! overflow marker, with the real count following as a typed integer.
//! Integers are stored at the narrowest width that holds them and
//! sign-extend on read. Each numeric type reserves two bit patterns:
//! "missing" and "end of vector", the latter padding jagged matrices.
//!
//! Sentinel constants, compared after sign extension:
//!
//! | type  | missing      | end of vector |
//! |-------|--------------|---------------|
//! | INT8  | -128         | -127          |
//! | INT16 | -32768       | -32767        |
//! | INT32 | -2147483648  | -2147483647   |
//! | FLOAT | 0x7F800001   | 0x7F800002    |
//!
//! A raw byte compare is wrong: INT8 -128 only means missing in INT8
//! transport, so classification has to happen on the sign-extended value
//! of the width it was stored at.

use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::{HtsCodecError, Result};

/// INT8 missing sentinel, sign-extended.
pub const INT8_MISSING: i32 = -128;
/// INT8 end-of-vector sentinel, sign-extended.
pub const INT8_EOV: i32 = -127;
/// INT16 missing sentinel, sign-extended.
pub const INT16_MISSING: i32 = -32768;
/// INT16 end-of-vector sentinel, sign-extended.
pub const INT16_EOV: i32 = -32767;
/// INT32 missing sentinel.
pub const INT32_MISSING: i32 = i32::MIN;
/// INT32 end-of-vector sentinel.
pub const INT32_EOV: i32 = i32::MIN + 1;
/// FLOAT missing bit pattern (a quiet NaN).
pub const FLOAT_MISSING_BITS: u32 = 0x7F80_0001;
/// FLOAT end-of-vector bit pattern (a quiet NaN).
pub const FLOAT_EOV_BITS: u32 = 0x7F80_0002;

/// Overflow marker in the descriptor's count nibble.
const COUNT_OVERFLOW: u8 = 15;

/// Type ids in the descriptor's low nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// No payload.
    Missing,
    /// 8-bit signed integers.
    Int8,
    /// 16-bit signed integers, little-endian.
    Int16,
    /// 32-bit signed integers, little-endian.
    Int32,
    /// IEEE-754 single floats, little-endian bit patterns.
    Float,
    /// Characters on INT8 transport.
    Char,
}

impl TypeKind {
    /// Wire id.
    pub fn id(self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 3,
            Self::Float => 5,
            Self::Char => 7,
        }
    }

    /// Parse a wire id.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::Missing),
            1 => Ok(Self::Int8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int32),
            5 => Ok(Self::Float),
            7 => Ok(Self::Char),
            other => Err(HtsCodecError::malformed_header(format!(
                "unknown BCF type id {other}"
            ))),
        }
    }
}

/// One decoded typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Type MISSING with no elements; also a FLAG payload.
    Missing,
    /// INT8 vector, sign-extended.
    Int8(Vec<i32>),
    /// INT16 vector, sign-extended.
    Int16(Vec<i32>),
    /// INT32 vector.
    Int32(Vec<i32>),
    /// FLOAT vector.
    Float(Vec<f32>),
    /// CHAR vector.
    String(Vec<u8>),
}

impl TypedValue {
    /// Number of stored elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Missing => 0,
            Self::Int8(v) | Self::Int16(v) | Self::Int32(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    /// Whether the value holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The integer elements regardless of stored width, when integral.
    pub fn as_ints(&self) -> Option<&[i32]> {
        match self {
            Self::Int8(v) | Self::Int16(v) | Self::Int32(v) => Some(v),
            _ => None,
        }
    }

    /// Whether element `i` is the missing sentinel for the stored width.
    pub fn is_missing(&self, i: usize) -> bool {
        match self {
            Self::Missing => true,
            Self::Int8(v) => v.get(i) == Some(&INT8_MISSING),
            Self::Int16(v) => v.get(i) == Some(&INT16_MISSING),
            Self::Int32(v) => v.get(i) == Some(&INT32_MISSING),
            Self::Float(v) => v.get(i).map(|f| f.to_bits()) == Some(FLOAT_MISSING_BITS),
            Self::String(_) => false,
        }
    }

    /// Whether element `i` is the end-of-vector sentinel for the stored
    /// width.
    pub fn is_end_of_vector(&self, i: usize) -> bool {
        match self {
            Self::Missing => false,
            Self::Int8(v) => v.get(i) == Some(&INT8_EOV),
            Self::Int16(v) => v.get(i) == Some(&INT16_EOV),
            Self::Int32(v) => v.get(i) == Some(&INT32_EOV),
            Self::Float(v) => v.get(i).map(|f| f.to_bits()) == Some(FLOAT_EOV_BITS),
            Self::String(_) => false,
        }
    }
}

/// Write a descriptor byte (and overflow count when needed).
pub fn write_type_descriptor(out: &mut Vec<u8>, kind: TypeKind, count: usize) {
    if count < usize::from(COUNT_OVERFLOW) {
        out.push(((count as u8) << 4) | kind.id());
    } else {
        out.push((COUNT_OVERFLOW << 4) | kind.id());
        write_typed_int(out, count as i32);
    }
}

/// Read a descriptor byte, resolving the overflow count form.
pub fn read_type_descriptor(cur: &mut ByteCursor<'_>) -> Result<(TypeKind, usize)> {
    let byte = cur.read_u8()?;
    let kind = TypeKind::from_id(byte & 0x0F)?;
    let count = byte >> 4;
    if count < COUNT_OVERFLOW {
        Ok((kind, usize::from(count)))
    } else {
        let real = read_typed_scalar_int(cur)?;
        if real < 0 {
            return Err(HtsCodecError::malformed_header(format!(
                "negative overflow count {real}"
            )));
        }
        Ok((kind, real as usize))
    }
}

/// Write a single integer as its own typed scalar (descriptor + payload).
pub fn write_typed_int(out: &mut Vec<u8>, value: i32) {
    if (-120..=127).contains(&value) {
        write_type_descriptor(out, TypeKind::Int8, 1);
        out.push(value as u8);
    } else if (-32760..=32767).contains(&value) {
        write_type_descriptor(out, TypeKind::Int16, 1);
        out.extend_from_slice(&(value as i16).to_le_bytes());
    } else {
        write_type_descriptor(out, TypeKind::Int32, 1);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Read a typed scalar integer (descriptor + one element).
///
/// Scalars never use the overflow count form, which also keeps the
/// overflow-count read in [`read_type_descriptor`] from recursing.
pub fn read_typed_scalar_int(cur: &mut ByteCursor<'_>) -> Result<i32> {
    let byte = cur.read_u8()?;
    let kind = TypeKind::from_id(byte & 0x0F)?;
    let count = byte >> 4;
    if count != 1 {
        return Err(HtsCodecError::malformed_header(format!(
            "typed scalar carries {count} elements"
        )));
    }
    read_int_element(cur, kind)
}

fn read_int_element(cur: &mut ByteCursor<'_>, kind: TypeKind) -> Result<i32> {
    match kind {
        TypeKind::Int8 => Ok(i32::from(cur.read_u8()? as i8)),
        TypeKind::Int16 => Ok(i32::from(cur.read_u16_le()? as i16)),
        TypeKind::Int32 => cur.read_i32_le(),
        other => Err(HtsCodecError::malformed_header(format!(
            "expected an integer type, found {other:?}"
        ))),
    }
}

/// Read one complete typed value.
pub fn read_typed_value(cur: &mut ByteCursor<'_>) -> Result<TypedValue> {
    let (kind, count) = read_type_descriptor(cur)?;
    match kind {
        TypeKind::Missing => {
            if count != 0 {
                return Err(HtsCodecError::malformed_header(format!(
                    "MISSING type with {count} elements"
                )));
            }
            Ok(TypedValue::Missing)
        }
        TypeKind::Int8 => {
            let bytes = cur.take(count)?;
            Ok(TypedValue::Int8(
                bytes.iter().map(|&b| i32::from(b as i8)).collect(),
            ))
        }
        TypeKind::Int16 => {
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(i32::from(cur.read_u16_le()? as i16));
            }
            Ok(TypedValue::Int16(out))
        }
        TypeKind::Int32 => {
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(cur.read_i32_le()?);
            }
            Ok(TypedValue::Int32(out))
        }
        TypeKind::Float => {
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(cur.read_f32_le()?);
            }
            Ok(TypedValue::Float(out))
        }
        TypeKind::Char => Ok(TypedValue::String(cur.take(count)?.to_vec())),
    }
}

/// Write one complete typed value, choosing integer widths automatically.
pub fn write_typed_value(out: &mut Vec<u8>, value: &TypedValue) {
    match value {
        TypedValue::Missing => write_type_descriptor(out, TypeKind::Missing, 0),
        TypedValue::Int8(v) | TypedValue::Int16(v) | TypedValue::Int32(v) => {
            write_int_vec(out, v);
        }
        TypedValue::Float(v) => {
            write_type_descriptor(out, TypeKind::Float, v.len());
            for f in v {
                out.extend_from_slice(&f.to_bits().to_le_bytes());
            }
        }
        TypedValue::String(v) => {
            write_type_descriptor(out, TypeKind::Char, v.len());
            out.extend_from_slice(v);
        }
    }
}

/// Write an integer vector at the smallest width containing its values.
///
/// The canonical sentinels [`INT32_MISSING`] and [`INT32_EOV`] translate
/// to the chosen width's own sentinel patterns; they do not influence the
/// width choice.
pub fn write_int_vec(out: &mut Vec<u8>, values: &[i32]) {
    let mut lo = 0i32;
    let mut hi = 0i32;
    for &v in values {
        if v == INT32_MISSING || v == INT32_EOV {
            continue;
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }

    if lo >= -120 && hi <= 127 {
        write_type_descriptor(out, TypeKind::Int8, values.len());
        for &v in values {
            out.push(match v {
                INT32_MISSING => INT8_MISSING as u8,
                INT32_EOV => INT8_EOV as u8,
                other => other as u8,
            });
        }
    } else if lo >= -32760 && hi <= 32767 {
        write_type_descriptor(out, TypeKind::Int16, values.len());
        for &v in values {
            let narrow = match v {
                INT32_MISSING => INT16_MISSING as i16,
                INT32_EOV => INT16_EOV as i16,
                other => other as i16,
            };
            out.extend_from_slice(&narrow.to_le_bytes());
        }
    } else {
        write_type_descriptor(out, TypeKind::Int32, values.len());
        for &v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
}

/// Write a typed CHAR string; an empty string becomes ".".
pub fn write_typed_string(out: &mut Vec<u8>, s: &[u8]) {
    if s.is_empty() {
        write_type_descriptor(out, TypeKind::Char, 1);
        out.push(b'.');
    } else {
        write_type_descriptor(out, TypeKind::Char, s.len());
        out.extend_from_slice(s);
    }
}

/// Read a typed CHAR string; "." decodes to empty.
pub fn read_typed_string(cur: &mut ByteCursor<'_>) -> Result<Vec<u8>> {
    match read_typed_value(cur)? {
        TypedValue::String(s) => {
            if s == b"." {
                Ok(Vec::new())
            } else {
                Ok(s)
            }
        }
        TypedValue::Missing => Ok(Vec::new()),
        other => Err(HtsCodecError::malformed_header(format!(
            "expected CHAR, found {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: TypedValue) {
        let mut out = Vec::new();
        write_typed_value(&mut out, &value);
        let mut cur = ByteCursor::new(&out);
        assert_eq!(read_typed_value(&mut cur).unwrap(), value);
        assert!(cur.is_empty());
    }

    #[test]
    fn test_roundtrip_small_counts() {
        roundtrip(TypedValue::Missing);
        roundtrip(TypedValue::Int8(vec![1, -1, 127, -120]));
        roundtrip(TypedValue::Int16(vec![300, -300]));
        roundtrip(TypedValue::Int32(vec![1 << 20, -(1 << 20)]));
        roundtrip(TypedValue::Float(vec![1.5, -0.25]));
        roundtrip(TypedValue::String(b"ACGT".to_vec()));
    }

    #[test]
    fn test_roundtrip_overflow_count() {
        let long: Vec<i32> = (0..100).collect();
        roundtrip(TypedValue::Int8(long));
        let chars: Vec<u8> = (0..300).map(|i| (i % 26) as u8 + b'a').collect();
        roundtrip(TypedValue::String(chars));
    }

    #[test]
    fn test_width_promotion() {
        let mut out = Vec::new();
        write_int_vec(&mut out, &[1, 2, 3]);
        assert_eq!(out[0] & 0x0F, TypeKind::Int8.id());

        out.clear();
        write_int_vec(&mut out, &[1, 200, -3]);
        assert_eq!(out[0] & 0x0F, TypeKind::Int16.id());

        out.clear();
        write_int_vec(&mut out, &[1, 1 << 24]);
        assert_eq!(out[0] & 0x0F, TypeKind::Int32.id());

        // -121 sits in the INT8 sentinel band and must promote.
        out.clear();
        write_int_vec(&mut out, &[-121]);
        assert_eq!(out[0] & 0x0F, TypeKind::Int16.id());
    }

    #[test]
    fn test_sentinel_translation_across_widths() {
        let mut out = Vec::new();
        write_int_vec(&mut out, &[5, INT32_MISSING, INT32_EOV]);
        // Narrow vector: sentinels stored as the INT8 patterns.
        let mut cur = ByteCursor::new(&out);
        let value = read_typed_value(&mut cur).unwrap();
        assert_eq!(value, TypedValue::Int8(vec![5, INT8_MISSING, INT8_EOV]));
        assert!(value.is_missing(1));
        assert!(value.is_end_of_vector(2));
        assert!(!value.is_missing(0));
    }

    #[test]
    fn test_sign_extension_is_not_missing_at_wider_widths() {
        // INT16 -128 sign-extends to -128 but is NOT the INT16 missing
        // sentinel; a raw byte compare would misclassify it.
        let value = TypedValue::Int16(vec![-128]);
        assert!(!value.is_missing(0));

        let mut out = Vec::new();
        write_type_descriptor(&mut out, TypeKind::Int16, 1);
        out.extend_from_slice(&(-128i16).to_le_bytes());
        let mut cur = ByteCursor::new(&out);
        assert_eq!(read_typed_value(&mut cur).unwrap(), value);
    }

    #[test]
    fn test_float_sentinels_bitwise() {
        let missing = f32::from_bits(FLOAT_MISSING_BITS);
        let eov = f32::from_bits(FLOAT_EOV_BITS);
        let value = TypedValue::Float(vec![missing, 1.0, eov, f32::NAN]);
        assert!(value.is_missing(0));
        assert!(!value.is_missing(1));
        assert!(value.is_end_of_vector(2));
        // An ordinary NaN is neither sentinel.
        assert!(!value.is_missing(3));
        assert!(!value.is_end_of_vector(3));
    }

    #[test]
    fn test_typed_string_dot_convention() {
        let mut out = Vec::new();
        write_typed_string(&mut out, b"");
        let mut cur = ByteCursor::new(&out);
        assert!(read_typed_string(&mut cur).unwrap().is_empty());

        out.clear();
        write_typed_string(&mut out, b"rs6054257");
        let mut cur = ByteCursor::new(&out);
        assert_eq!(read_typed_string(&mut cur).unwrap(), b"rs6054257");
    }

    #[test]
    fn test_unknown_type_id() {
        let buf = [0x14u8];
        let mut cur = ByteCursor::new(&buf);
        assert!(read_type_descriptor(&mut cur).is_err());
    }
}
