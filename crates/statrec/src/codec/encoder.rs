// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record -> bytes.

use super::cursor::Writer;
use super::{CodecError, DecodeLimits};
use crate::record::{Field, FieldValues, Record};
use byteorder::{BigEndian, ByteOrder};

/// Size of the encoding of `record`, in bytes.
pub fn encoded_len(record: &Record) -> usize {
    let header = 4 + record.data_name().len() + 4 + record.format_name().len() + 12;
    let fields: usize = record
        .fields()
        .map(|f| 4 + f.name().len() + 8 + f.values().byte_len())
        .sum();
    header + fields
}

pub(super) fn encode_record(
    record: &Record,
    limits: &DecodeLimits,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    if record.len() > limits.max_fields {
        return Err(CodecError::malformed(
            0,
            format!("{} fields exceed limit {}", record.len(), limits.max_fields),
        ));
    }

    let start = out.len();
    out.reserve(encoded_len(record));
    let mut w = Writer::new(out);

    write_string(&mut w, start, record.data_name(), "data name", limits)?;
    write_string(&mut w, start, record.format_name(), "format name", limits)?;
    w.write_i32(record.revision());
    w.write_i32(record.byte_size());
    w.write_i32(to_i32(record.len(), w.len() - start, "field count")?);

    for field in record.fields() {
        write_field(&mut w, start, field, limits)?;
    }
    Ok(())
}

fn write_field(
    w: &mut Writer<'_>,
    start: usize,
    field: &Field,
    limits: &DecodeLimits,
) -> Result<(), CodecError> {
    let offset = w.len() - start;
    if field.name().is_empty() {
        return Err(CodecError::malformed(offset, "empty field name"));
    }
    write_string(w, start, field.name(), "field name", limits)?;
    w.write_i32(field.scalar_type().tag());

    let length = field.length() as usize;
    if length > limits.max_array_len {
        return Err(CodecError::malformed(
            offset,
            format!(
                "field {} length {} exceeds limit {}",
                field.name(),
                length,
                limits.max_array_len
            ),
        ));
    }
    if field.values().len() != length.max(1) {
        return Err(CodecError::malformed(
            offset,
            format!(
                "field {} holds {} elements for length {}",
                field.name(),
                field.values().len(),
                length
            ),
        ));
    }
    w.write_i32(to_i32(length, offset, "field length")?);
    write_values(w, field.values());
    Ok(())
}

fn write_values(w: &mut Writer<'_>, values: &FieldValues) {
    let len = values.byte_len();
    match values {
        FieldValues::I8(v) => {
            for (dst, &src) in w.reserve_tail(len).iter_mut().zip(v.iter()) {
                *dst = src as u8;
            }
        }
        FieldValues::U8(v) => w.write_bytes(v),
        FieldValues::I16(v) => BigEndian::write_i16_into(v, w.reserve_tail(len)),
        FieldValues::U16(v) => BigEndian::write_u16_into(v, w.reserve_tail(len)),
        FieldValues::I32(v) => BigEndian::write_i32_into(v, w.reserve_tail(len)),
        FieldValues::U32(v) => BigEndian::write_u32_into(v, w.reserve_tail(len)),
        FieldValues::I64(v) => BigEndian::write_i64_into(v, w.reserve_tail(len)),
        FieldValues::U64(v) => BigEndian::write_u64_into(v, w.reserve_tail(len)),
        FieldValues::F32(v) => BigEndian::write_f32_into(v, w.reserve_tail(len)),
        FieldValues::F64(v) => BigEndian::write_f64_into(v, w.reserve_tail(len)),
    }
}

fn write_string(
    w: &mut Writer<'_>,
    start: usize,
    s: &str,
    what: &str,
    limits: &DecodeLimits,
) -> Result<(), CodecError> {
    let offset = w.len() - start;
    if s.len() > limits.max_string_len {
        return Err(CodecError::malformed(
            offset,
            format!("{} length {} exceeds limit {}", what, s.len(), limits.max_string_len),
        ));
    }
    let len = u32::try_from(s.len())
        .map_err(|_| CodecError::malformed(offset, format!("{} too long", what)))?;
    w.write_u32(len);
    w.write_bytes(s.as_bytes());
    Ok(())
}

fn to_i32(value: usize, offset: usize, what: &str) -> Result<i32, CodecError> {
    i32::try_from(value)
        .map_err(|_| CodecError::malformed(offset, format!("{} {} out of range", what, value)))
}
