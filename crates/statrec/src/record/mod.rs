// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed Value Store.
//!
//! A [`Record`] is an ordered set of named, typed, fixed-length fields plus a
//! small header (format name, data name, revision, advisory byte size).
//! Producers declare fields once and update values in place; consumers get a
//! fresh record from the codec and read fields by name.
//!
//! # Example
//!
//! ```
//! use statrec::{Record, ScalarType};
//!
//! let mut status = Record::new("storage_status", "store01", 3);
//! status.declare("runno", ScalarType::Int32, 0)?;
//! status.declare("rate", ScalarType::Float32, 4)?;
//! status.set("runno", 0, 12345i32)?;
//! status.set("rate", 2, 1.5f32)?;
//!
//! assert_eq!(status.get::<i64>("runno", 0)?, 12345);
//! assert_eq!(status.get::<f64>("rate", 2)?, 1.5);
//! # Ok::<(), statrec::StoreError>(())
//! ```

mod field;


pub use field::{Field, FieldInfo, FieldValues};

use crate::scalar::{Scalar, ScalarType, ScalarValue};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by the value store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("field already declared: {0}")]
    DuplicateField(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("index out of range for field {name}: {index} >= {len}")]
    IndexOutOfRange {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("field name must not be empty")]
    InvalidName,

    #[error("invalid length {length} for field {name}")]
    InvalidLength { name: String, length: usize },

    #[error("value {value} of field {name} is not representable as {target}")]
    LossyConversion {
        name: String,
        value: ScalarValue,
        target: ScalarType,
    },

    #[error("field {name} is {actual}, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: ScalarType,
    },

    #[error("field {name} holds {expected} elements, got {actual}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Largest declarable length. Equal to the default `DecodeLimits::max_array_len`
/// so every declarable field can be encoded with default limits.
pub const MAX_FIELD_LENGTH: usize = 1 << 20;

/// Self-describing status record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    format_name: String,
    data_name: String,
    revision: i32,
    byte_size: i32,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl Record {
    /// Create an empty record.
    pub fn new(format_name: impl Into<String>, data_name: impl Into<String>, revision: i32) -> Self {
        Self {
            format_name: format_name.into(),
            data_name: data_name.into(),
            revision,
            byte_size: 0,
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub(crate) fn with_capacity(
        format_name: String,
        data_name: String,
        revision: i32,
        capacity: usize,
    ) -> Self {
        Self {
            format_name,
            data_name,
            revision,
            byte_size: 0,
            fields: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Deep copy carrying a different revision.
    pub fn clone_with_revision(&self, revision: i32) -> Self {
        let mut copy = self.clone();
        copy.revision = revision;
        copy
    }

    // ------------------------------------------------------------------
    // Header
    // ------------------------------------------------------------------

    pub fn format_name(&self) -> &str {
        &self.format_name
    }

    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    pub fn revision(&self) -> i32 {
        self.revision
    }

    /// Advisory byte size from the header.
    ///
    /// Producer side this tracks [`Record::payload_size`]; on a decoded record
    /// it is whatever the producer wrote.
    pub fn byte_size(&self) -> i32 {
        self.byte_size
    }

    /// Sum of every field's payload bytes.
    pub fn payload_size(&self) -> usize {
        self.fields.iter().map(|f| f.values().byte_len()).sum()
    }

    pub(crate) fn set_byte_size(&mut self, byte_size: i32) {
        self.byte_size = byte_size;
    }

    fn refresh_byte_size(&mut self) {
        self.byte_size = i32::try_from(self.payload_size()).unwrap_or(i32::MAX);
    }

    // ------------------------------------------------------------------
    // Declaration
    // ------------------------------------------------------------------

    /// Declare a zero-filled field of `max(length, 1)` elements.
    pub fn declare(&mut self, name: &str, ty: ScalarType, length: usize) -> Result<(), StoreError> {
        self.add_values(name, ScalarValue::zero(ty), length)
    }

    /// Declare a field of type `T` with every element set to `fill`.
    pub fn add<T: Scalar>(&mut self, name: &str, fill: T, length: usize) -> Result<(), StoreError> {
        self.add_values(name, fill.into_value(), length)
    }

    /// Declare or redeclare a zero-filled field.
    ///
    /// An existing field keeps its position but takes the new type and
    /// length; its previous values are dropped.
    pub fn put(&mut self, name: &str, ty: ScalarType, length: usize) -> Result<(), StoreError> {
        let length = check_decl(name, length)?;
        let values = FieldValues::zeroed(ty, (length as usize).max(1));
        match self.index.get(name) {
            Some(&pos) => self.fields[pos].replace(length, values),
            None => self.push(Field::new(name.to_string(), length, values)),
        }
        self.refresh_byte_size();
        Ok(())
    }

    fn add_values(&mut self, name: &str, fill: ScalarValue, length: usize) -> Result<(), StoreError> {
        let length = check_decl(name, length)?;
        if self.index.contains_key(name) {
            return Err(StoreError::DuplicateField(name.to_string()));
        }
        let values = FieldValues::filled(fill, (length as usize).max(1));
        self.push(Field::new(name.to_string(), length, values));
        self.refresh_byte_size();
        Ok(())
    }

    /// Strict insert of a fully built field, used by the decoder.
    pub(crate) fn insert_field(&mut self, field: Field) -> Result<(), StoreError> {
        if field.name().is_empty() {
            return Err(StoreError::InvalidName);
        }
        if self.index.contains_key(field.name()) {
            return Err(StoreError::DuplicateField(field.name().to_string()));
        }
        self.push(field);
        Ok(())
    }

    fn push(&mut self, field: Field) {
        self.index.insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
    }

    // ------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------

    /// Read one element as `T`.
    pub fn get<T: Scalar>(&self, name: &str, index: usize) -> Result<T, StoreError> {
        let value = self.value(name, index)?;
        T::from_value(value).ok_or_else(|| StoreError::LossyConversion {
            name: name.to_string(),
            value,
            target: T::TYPE,
        })
    }

    /// Raw stored element.
    pub fn value(&self, name: &str, index: usize) -> Result<ScalarValue, StoreError> {
        let values = self.field(name)?.values();
        values.get(index).ok_or_else(|| StoreError::IndexOutOfRange {
            name: name.to_string(),
            index,
            len: values.len(),
        })
    }

    /// Widened view of one element, for display.
    pub fn get_f64(&self, name: &str, index: usize) -> Result<f64, StoreError> {
        self.value(name, index).map(|v| v.as_f64())
    }

    /// Overwrite one element. The field's type and length never change.
    pub fn set(&mut self, name: &str, index: usize, value: impl Into<ScalarValue>) -> Result<(), StoreError> {
        let value = value.into();
        let values = self.field_mut(name)?.values_mut();
        let len = values.len();
        if index >= len {
            return Err(StoreError::IndexOutOfRange {
                name: name.to_string(),
                index,
                len,
            });
        }
        if values.set(index, value) {
            Ok(())
        } else {
            Err(StoreError::LossyConversion {
                name: name.to_string(),
                value,
                target: values.scalar_type(),
            })
        }
    }

    // ------------------------------------------------------------------
    // Whole-field access
    // ------------------------------------------------------------------

    pub fn values(&self, name: &str) -> Result<&FieldValues, StoreError> {
        self.field(name).map(Field::values)
    }

    /// Overwrite every element of a field; `src` must match its element
    /// count. Nothing is written unless every element converts.
    pub fn set_all<T: Scalar>(&mut self, name: &str, src: &[T]) -> Result<(), StoreError> {
        let field = self.field_mut(name)?;
        let ty = field.scalar_type();
        let expected = field.values().len();
        if src.len() != expected {
            return Err(StoreError::LengthMismatch {
                name: name.to_string(),
                expected,
                actual: src.len(),
            });
        }

        let mut staged = FieldValues::zeroed(ty, expected);
        for (i, item) in src.iter().enumerate() {
            let value = item.into_value();
            if !staged.set(i, value) {
                return Err(StoreError::LossyConversion {
                    name: name.to_string(),
                    value,
                    target: ty,
                });
            }
        }
        *field.values_mut() = staged;
        Ok(())
    }

    /// Read a character field as text, up to the first NUL.
    pub fn text(&self, name: &str) -> Result<String, StoreError> {
        let bytes: Vec<u8> = match self.field(name)?.values() {
            FieldValues::I8(v) => v.iter().map(|&c| c as u8).collect(),
            FieldValues::U8(v) => v.to_vec(),
            other => {
                return Err(StoreError::TypeMismatch {
                    name: name.to_string(),
                    expected: "int8 or uint8",
                    actual: other.scalar_type(),
                })
            }
        };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Write text into a character field, NUL-padding the remainder.
    pub fn set_text(&mut self, name: &str, text: &str) -> Result<(), StoreError> {
        let values = self.field_mut(name)?.values_mut();
        let capacity = values.len();
        if text.len() > capacity {
            return Err(StoreError::LengthMismatch {
                name: name.to_string(),
                expected: capacity,
                actual: text.len(),
            });
        }
        let bytes = text.as_bytes();
        match values {
            FieldValues::I8(v) => {
                for (i, slot) in v.iter_mut().enumerate() {
                    *slot = bytes.get(i).map_or(0, |&b| b as i8);
                }
            }
            FieldValues::U8(v) => {
                for (i, slot) in v.iter_mut().enumerate() {
                    *slot = bytes.get(i).copied().unwrap_or(0);
                }
            }
            other => {
                return Err(StoreError::TypeMismatch {
                    name: name.to_string(),
                    expected: "int8 or uint8",
                    actual: other.scalar_type(),
                })
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(Field::name)
    }

    pub fn field_info(&self, name: &str) -> Result<FieldInfo, StoreError> {
        self.field(name).map(Field::info)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn field(&self, name: &str) -> Result<&Field, StoreError> {
        self.index
            .get(name)
            .map(|&pos| &self.fields[pos])
            .ok_or_else(|| StoreError::UnknownField(name.to_string()))
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut Field, StoreError> {
        match self.index.get(name) {
            Some(&pos) => Ok(&mut self.fields[pos]),
            None => Err(StoreError::UnknownField(name.to_string())),
        }
    }
}

fn check_decl(name: &str, length: usize) -> Result<u32, StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidName);
    }
    if length > MAX_FIELD_LENGTH {
        return Err(StoreError::InvalidLength {
            name: name.to_string(),
            length,
        });
    }
    Ok(length as u32)
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
