// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounded big-endian read cursor and growable writer for the record wire
//! format.

use super::CodecError;
use byteorder::{BigEndian, ByteOrder};

/// Generate big-endian read methods.
///
/// Each generated method checks that `$size` bytes remain (returning
/// `CodecError::TruncatedRecord` otherwise), decodes them and advances.
macro_rules! impl_read_be {
    ($name:ident, $type:ty, $size:expr, $read:ident) => {
        pub fn $name(&mut self) -> Result<$type, CodecError> {
            let bytes = self.read_bytes($size)?;
            Ok(BigEndian::$read(bytes))
        }
    };
}

/// Generate big-endian write methods. Writing into a `Vec` cannot fail.
macro_rules! impl_write_be {
    ($name:ident, $type:ty, $size:expr, $write:ident) => {
        pub fn $name(&mut self, value: $type) {
            let mut bytes = [0u8; $size];
            BigEndian::$write(&mut bytes, value);
            self.buffer.extend_from_slice(&bytes);
        }
    };
}

/// Read-only cursor over an input buffer.
pub(crate) struct Cursor<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    /// Borrow the next `len` bytes, or fail without advancing.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let available = self.remaining();
        if len > available {
            return Err(CodecError::TruncatedRecord {
                offset: self.offset,
                needed: len,
                available,
            });
        }
        let bytes = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    impl_read_be!(read_i32, i32, 4, read_i32);
    impl_read_be!(read_u32, u32, 4, read_u32);
}

/// Append-only writer.
pub(crate) struct Writer<'a> {
    buffer: &'a mut Vec<u8>,
}

impl<'a> Writer<'a> {
    pub fn new(buffer: &'a mut Vec<u8>) -> Self {
        Self { buffer }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Grow by `len` zero bytes and hand back the new tail for in-place
    /// slice writes.
    pub fn reserve_tail(&mut self, len: usize) -> &mut [u8] {
        let start = self.buffer.len();
        self.buffer.resize(start + len, 0);
        &mut self.buffer[start..]
    }

    impl_write_be!(write_i32, i32, 4, write_i32);
    impl_write_be!(write_u32, u32, 4, write_u32);
}
