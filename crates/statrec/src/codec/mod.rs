// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record Codec.
//!
//! # Wire layout
//!
//! Big-endian throughout. A string is a `u32` byte length followed by UTF-8
//! bytes, without terminator.
//!
//! ```text
//! string   data name
//! string   format name
//! i32      revision
//! i32      byte size (advisory)
//! i32      field count
//! per field:
//!     string  field name
//!     i32     type tag
//!     i32     length          (0/1 = scalar, N = array of N)
//!     max(length, 1) values of the tag's width
//! ```
//!
//! Encoding is deterministic: equal records produce identical bytes.
//! Decoding is atomic: on error no record is returned.

mod cursor;
mod decoder;
mod encoder;

pub use encoder::encoded_len;

use crate::record::{Record, MAX_FIELD_LENGTH};
use cursor::Cursor;
use thiserror::Error;

/// Codec failures. Every variant carries the byte offset where the problem
/// was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed record at byte {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },

    #[error("unknown scalar type tag {tag} at byte {offset}")]
    UnknownScalarType { tag: i32, offset: usize },

    #[error("truncated record at byte {offset}: need {needed} bytes, {available} available")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        available: usize,
    },
}

impl CodecError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        CodecError::MalformedRecord {
            offset,
            reason: reason.into(),
        }
    }

    /// Byte offset at which the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            CodecError::MalformedRecord { offset, .. }
            | CodecError::UnknownScalarType { offset, .. }
            | CodecError::TruncatedRecord { offset, .. } => *offset,
        }
    }
}

/// Decoder resource limits.
///
/// Lengths read from untrusted input are checked against these before any
/// allocation. The encoder applies the same limits so that whatever it
/// produces decodes under the same configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Longest accepted string (names), in bytes.
    pub max_string_len: usize,
    /// Most fields in one record.
    pub max_fields: usize,
    /// Largest declared array length.
    pub max_array_len: usize,
    /// Largest encoded record, in bytes.
    pub max_record_bytes: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_string_len: 4096,
            max_fields: 65_536,
            max_array_len: MAX_FIELD_LENGTH,
            max_record_bytes: 16 * 1024 * 1024,
        }
    }
}

impl DecodeLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }

    pub fn max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }

    pub fn max_record_bytes(mut self, bytes: usize) -> Self {
        self.max_record_bytes = bytes;
        self
    }
}

/// Encode a record under the default limits.
pub fn encode(record: &Record) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(encoded_len(record));
    encode_into(record, &mut out)?;
    Ok(out)
}

/// Append the encoding of `record` to `out`. On error `out` is left as it
/// was.
pub fn encode_into(record: &Record, out: &mut Vec<u8>) -> Result<(), CodecError> {
    encode_with_limits(record, &DecodeLimits::default(), out)
}

/// Append the encoding of `record` to `out`, enforcing `limits`.
pub fn encode_with_limits(
    record: &Record,
    limits: &DecodeLimits,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let start = out.len();
    let result = encoder::encode_record(record, limits, out).and_then(|()| {
        let len = out.len() - start;
        if len > limits.max_record_bytes {
            Err(CodecError::malformed(
                0,
                format!("record is {} bytes, limit {}", len, limits.max_record_bytes),
            ))
        } else {
            Ok(())
        }
    });
    if result.is_err() {
        out.truncate(start);
    }
    result
}

/// Decode exactly one record under the default limits.
pub fn decode(bytes: &[u8]) -> Result<Record, CodecError> {
    decode_with_limits(bytes, &DecodeLimits::default())
}

/// Decode exactly one record; trailing bytes are an error.
pub fn decode_with_limits(bytes: &[u8], limits: &DecodeLimits) -> Result<Record, CodecError> {
    if bytes.len() > limits.max_record_bytes {
        return Err(CodecError::malformed(
            0,
            format!("record is {} bytes, limit {}", bytes.len(), limits.max_record_bytes),
        ));
    }
    let (record, consumed) = decode_prefix(bytes, limits)?;
    if consumed != bytes.len() {
        return Err(CodecError::malformed(
            consumed,
            format!("{} trailing bytes", bytes.len() - consumed),
        ));
    }
    Ok(record)
}

/// Decode one record from the front of `bytes`, returning it with the number
/// of bytes consumed.
pub fn decode_prefix(bytes: &[u8], limits: &DecodeLimits) -> Result<(Record, usize), CodecError> {
    let mut cursor = Cursor::new(bytes);
    match decoder::decode_record(&mut cursor, limits) {
        Ok(record) => {
            tracing::trace!(
                format = record.format_name(),
                data = record.data_name(),
                revision = record.revision(),
                fields = record.len(),
                "decoded record"
            );
            Ok((record, cursor.offset()))
        }
        Err(e) => {
            tracing::debug!(error = %e, "record decode failed");
            Err(e)
        }
    }
}
