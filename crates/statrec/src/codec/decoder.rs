// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bytes -> record.
//!
//! Every length read from the wire is checked against the configured limits
//! and against the bytes actually remaining before anything is allocated.

use super::cursor::Cursor;
use super::{CodecError, DecodeLimits};
use crate::record::{Field, FieldValues, Record};
use crate::scalar::ScalarType;
use byteorder::{BigEndian, ByteOrder};

/// Smallest possible field encoding: name length, one name byte, tag,
/// length, one value byte.
const MIN_FIELD_BYTES: usize = 4 + 1 + 4 + 4 + 1;

pub(super) fn decode_record(
    cursor: &mut Cursor<'_>,
    limits: &DecodeLimits,
) -> Result<Record, CodecError> {
    let data_name = read_string(cursor, limits, "data name")?;
    let format_name = read_string(cursor, limits, "format name")?;
    let revision = cursor.read_i32()?;
    let byte_size = cursor.read_i32()?;

    let count_offset = cursor.offset();
    let field_count = cursor.read_i32()?;
    if field_count < 0 {
        return Err(CodecError::malformed(
            count_offset,
            format!("negative field count {}", field_count),
        ));
    }
    let field_count = field_count as usize;
    if field_count > limits.max_fields {
        return Err(CodecError::malformed(
            count_offset,
            format!("field count {} exceeds limit {}", field_count, limits.max_fields),
        ));
    }

    let capacity = field_count.min(cursor.remaining() / MIN_FIELD_BYTES);
    let mut record = Record::with_capacity(format_name, data_name, revision, capacity);
    for _ in 0..field_count {
        let field_offset = cursor.offset();
        let field = decode_field(cursor, limits)?;
        record.insert_field(field).map_err(|e| {
            CodecError::malformed(field_offset, format!("invalid field: {}", e))
        })?;
    }
    record.set_byte_size(byte_size);
    Ok(record)
}

fn decode_field(cursor: &mut Cursor<'_>, limits: &DecodeLimits) -> Result<Field, CodecError> {
    let name_offset = cursor.offset();
    let name = read_string(cursor, limits, "field name")?;
    if name.is_empty() {
        return Err(CodecError::malformed(name_offset, "empty field name"));
    }

    let tag_offset = cursor.offset();
    let tag = cursor.read_i32()?;
    let ty = ScalarType::from_tag(tag).ok_or(CodecError::UnknownScalarType {
        tag,
        offset: tag_offset,
    })?;

    let length_offset = cursor.offset();
    let length = cursor.read_i32()?;
    if length < 0 {
        return Err(CodecError::malformed(
            length_offset,
            format!("field {} has negative length {}", name, length),
        ));
    }
    let length = length as u32;
    if length as usize > limits.max_array_len {
        return Err(CodecError::malformed(
            length_offset,
            format!(
                "field {} length {} exceeds limit {}",
                name, length, limits.max_array_len
            ),
        ));
    }

    let count = (length as usize).max(1);
    let byte_len = count.checked_mul(ty.width()).ok_or_else(|| {
        CodecError::malformed(length_offset, format!("field {} too large", name))
    })?;
    let bytes = cursor.read_bytes(byte_len)?;
    Ok(Field::new(name, length, decode_values(ty, count, bytes)))
}

/// `bytes.len()` is exactly `count * ty.width()`.
fn decode_values(ty: ScalarType, count: usize, bytes: &[u8]) -> FieldValues {
    match ty {
        ScalarType::Int8 => FieldValues::I8(bytes.iter().map(|&b| b as i8).collect()),
        ScalarType::UInt8 => FieldValues::U8(bytes.into()),
        ScalarType::Int16 => {
            let mut v = vec![0i16; count];
            BigEndian::read_i16_into(bytes, &mut v);
            FieldValues::I16(v.into_boxed_slice())
        }
        ScalarType::UInt16 => {
            let mut v = vec![0u16; count];
            BigEndian::read_u16_into(bytes, &mut v);
            FieldValues::U16(v.into_boxed_slice())
        }
        ScalarType::Int32 => {
            let mut v = vec![0i32; count];
            BigEndian::read_i32_into(bytes, &mut v);
            FieldValues::I32(v.into_boxed_slice())
        }
        ScalarType::UInt32 => {
            let mut v = vec![0u32; count];
            BigEndian::read_u32_into(bytes, &mut v);
            FieldValues::U32(v.into_boxed_slice())
        }
        ScalarType::Int64 => {
            let mut v = vec![0i64; count];
            BigEndian::read_i64_into(bytes, &mut v);
            FieldValues::I64(v.into_boxed_slice())
        }
        ScalarType::UInt64 => {
            let mut v = vec![0u64; count];
            BigEndian::read_u64_into(bytes, &mut v);
            FieldValues::U64(v.into_boxed_slice())
        }
        ScalarType::Float32 => {
            let mut v = vec![0f32; count];
            BigEndian::read_f32_into(bytes, &mut v);
            FieldValues::F32(v.into_boxed_slice())
        }
        ScalarType::Float64 => {
            let mut v = vec![0f64; count];
            BigEndian::read_f64_into(bytes, &mut v);
            FieldValues::F64(v.into_boxed_slice())
        }
    }
}

fn read_string(
    cursor: &mut Cursor<'_>,
    limits: &DecodeLimits,
    what: &str,
) -> Result<String, CodecError> {
    let offset = cursor.offset();
    let len = cursor.read_u32()? as usize;
    if len > limits.max_string_len {
        return Err(CodecError::malformed(
            offset,
            format!("{} length {} exceeds limit {}", what, len, limits.max_string_len),
        ));
    }
    let bytes = cursor.read_bytes(len)?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| CodecError::malformed(offset + 4, format!("{} is not UTF-8: {}", what, e)))
}
