// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field buffers.

use crate::scalar::{Scalar, ScalarType, ScalarValue};

/// Fixed-size element buffer, stored in the field's native type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValues {
    I8(Box<[i8]>),
    I16(Box<[i16]>),
    I32(Box<[i32]>),
    I64(Box<[i64]>),
    U8(Box<[u8]>),
    U16(Box<[u16]>),
    U32(Box<[u32]>),
    U64(Box<[u64]>),
    F32(Box<[f32]>),
    F64(Box<[f64]>),
}

/// Run `$body` with `$v` bound to the typed slice, whatever the variant.
macro_rules! each_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            FieldValues::I8($v) => $body,
            FieldValues::I16($v) => $body,
            FieldValues::I32($v) => $body,
            FieldValues::I64($v) => $body,
            FieldValues::U8($v) => $body,
            FieldValues::U16($v) => $body,
            FieldValues::U32($v) => $body,
            FieldValues::U64($v) => $body,
            FieldValues::F32($v) => $body,
            FieldValues::F64($v) => $body,
        }
    };
}

fn filled<T: Copy>(value: T, count: usize) -> Box<[T]> {
    vec![value; count].into_boxed_slice()
}

fn store<T: Scalar>(slot: &mut T, value: ScalarValue) -> bool {
    match T::from_value(value) {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

impl FieldValues {
    /// Zero-filled buffer of `count` elements.
    pub fn zeroed(ty: ScalarType, count: usize) -> Self {
        Self::filled(ScalarValue::zero(ty), count)
    }

    /// Buffer of `count` copies of `value`, typed as `value.scalar_type()`.
    pub fn filled(value: ScalarValue, count: usize) -> Self {
        match value {
            ScalarValue::I8(v) => FieldValues::I8(filled(v, count)),
            ScalarValue::I16(v) => FieldValues::I16(filled(v, count)),
            ScalarValue::I32(v) => FieldValues::I32(filled(v, count)),
            ScalarValue::I64(v) => FieldValues::I64(filled(v, count)),
            ScalarValue::U8(v) => FieldValues::U8(filled(v, count)),
            ScalarValue::U16(v) => FieldValues::U16(filled(v, count)),
            ScalarValue::U32(v) => FieldValues::U32(filled(v, count)),
            ScalarValue::U64(v) => FieldValues::U64(filled(v, count)),
            ScalarValue::F32(v) => FieldValues::F32(filled(v, count)),
            ScalarValue::F64(v) => FieldValues::F64(filled(v, count)),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            FieldValues::I8(_) => ScalarType::Int8,
            FieldValues::I16(_) => ScalarType::Int16,
            FieldValues::I32(_) => ScalarType::Int32,
            FieldValues::I64(_) => ScalarType::Int64,
            FieldValues::U8(_) => ScalarType::UInt8,
            FieldValues::U16(_) => ScalarType::UInt16,
            FieldValues::U32(_) => ScalarType::UInt32,
            FieldValues::U64(_) => ScalarType::UInt64,
            FieldValues::F32(_) => ScalarType::Float32,
            FieldValues::F64(_) => ScalarType::Float64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        each_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload size on the wire.
    pub fn byte_len(&self) -> usize {
        self.len() * self.scalar_type().width()
    }

    pub fn get(&self, index: usize) -> Option<ScalarValue> {
        each_values!(self, v => v.get(index).copied().map(ScalarValue::from))
    }

    /// Store `value` at `index`, converted to this buffer's type.
    ///
    /// Returns `false` (buffer untouched) if the index is out of range or the
    /// value is not exactly representable.
    pub(crate) fn set(&mut self, index: usize, value: ScalarValue) -> bool {
        each_values!(self, v => match v.get_mut(index) {
            Some(slot) => store(slot, value),
            None => false,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = ScalarValue> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// Type and declared length of a field, as seen by a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldInfo {
    pub scalar_type: ScalarType,
    /// Declared length: `0` or `1` for a scalar, `N > 1` for an array.
    pub length: u32,
}

impl FieldInfo {
    pub fn is_array(&self) -> bool {
        self.length > 1
    }

    /// Element count, `max(length, 1)`.
    pub fn element_count(&self) -> usize {
        (self.length as usize).max(1)
    }
}

/// One named, typed slot of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    length: u32,
    values: FieldValues,
}

impl Field {
    /// Callers guarantee `values.len() == max(length, 1)`.
    pub(crate) fn new(name: String, length: u32, values: FieldValues) -> Self {
        debug_assert_eq!(values.len(), (length as usize).max(1));
        Self {
            name,
            length,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.values.scalar_type()
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn info(&self) -> FieldInfo {
        FieldInfo {
            scalar_type: self.scalar_type(),
            length: self.length,
        }
    }

    pub fn is_array(&self) -> bool {
        self.length > 1
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut FieldValues {
        &mut self.values
    }

    pub(crate) fn replace(&mut self, length: u32, values: FieldValues) {
        self.length = length;
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_has_requested_type_and_len() {
        for ty in ScalarType::ALL {
            let values = FieldValues::zeroed(ty, 3);
            assert_eq!(values.scalar_type(), ty);
            assert_eq!(values.len(), 3);
            assert_eq!(values.byte_len(), 3 * ty.width());
            assert_eq!(values.get(2), Some(ScalarValue::zero(ty)));
            assert_eq!(values.get(3), None);
        }
    }

    #[test]
    fn test_set_converts_and_rejects() {
        let mut values = FieldValues::zeroed(ScalarType::UInt8, 2);
        assert!(values.set(1, ScalarValue::I64(200)));
        assert_eq!(values.get(1), Some(ScalarValue::U8(200)));

        assert!(!values.set(0, ScalarValue::I32(-1)));
        assert!(!values.set(2, ScalarValue::U8(1)));
        assert_eq!(values.get(0), Some(ScalarValue::U8(0)));
    }

    #[test]
    fn test_iter_yields_every_element() {
        let values = FieldValues::filled(ScalarValue::F32(1.5), 4);
        let collected: Vec<f64> = values.iter().map(|v| v.as_f64()).collect();
        assert_eq!(collected, vec![1.5; 4]);
    }
}
