// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire-level scalar taxonomy.
//!
//! `ScalarType` is the closed set of primitive kinds a record field can hold.
//! Each kind has a fixed wire width and a stable numeric tag; tags are part of
//! the wire format and are never reassigned.
//!
//! # Conversion policy
//!
//! Every typed accessor and mutator goes through [`Scalar::from_value`], which
//! succeeds only when the exact value is representable in the target type:
//!
//! | Source -> target            | Result                                    |
//! |-----------------------------|-------------------------------------------|
//! | widening (`i16` -> `i64`)   | always succeeds                           |
//! | narrowing / sign change     | succeeds iff the value fits               |
//! | float -> integer            | succeeds iff finite, integral and in range|
//! | integer -> float            | succeeds iff the float holds it exactly   |
//! | `f64` -> `f32`              | succeeds iff the value survives (NaN ok)  |
//!
//! [`ScalarValue::as_f64`] is the only lossy view and is meant for display.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Primitive kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScalarType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl ScalarType {
    /// Every scalar type, in tag order.
    pub const ALL: [ScalarType; 10] = [
        ScalarType::Int8,
        ScalarType::Int16,
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::UInt8,
        ScalarType::UInt16,
        ScalarType::UInt32,
        ScalarType::UInt64,
        ScalarType::Float32,
        ScalarType::Float64,
    ];

    /// Wire tag.
    pub const fn tag(self) -> i32 {
        match self {
            ScalarType::Int8 => 1,
            ScalarType::Int16 => 2,
            ScalarType::Int32 => 4,
            ScalarType::Int64 => 8,
            ScalarType::UInt8 => 101,
            ScalarType::UInt16 => 102,
            ScalarType::UInt32 => 104,
            ScalarType::UInt64 => 108,
            ScalarType::Float32 => 204,
            ScalarType::Float64 => 208,
        }
    }

    /// Look up a type by wire tag.
    pub const fn from_tag(tag: i32) -> Option<ScalarType> {
        match tag {
            1 => Some(ScalarType::Int8),
            2 => Some(ScalarType::Int16),
            4 => Some(ScalarType::Int32),
            8 => Some(ScalarType::Int64),
            101 => Some(ScalarType::UInt8),
            102 => Some(ScalarType::UInt16),
            104 => Some(ScalarType::UInt32),
            108 => Some(ScalarType::UInt64),
            204 => Some(ScalarType::Float32),
            208 => Some(ScalarType::Float64),
            _ => None,
        }
    }

    /// Width of one element on the wire, in bytes.
    pub const fn width(self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => 8,
        }
    }

    /// Lower-case display name (`int32`, `float64`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            ScalarType::Int8 => "int8",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt8 => "uint8",
            ScalarType::UInt16 => "uint16",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }

    pub const fn is_integer(self) -> bool {
        !self.is_float()
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            ScalarType::Int8
                | ScalarType::Int16
                | ScalarType::Int32
                | ScalarType::Int64
                | ScalarType::Float32
                | ScalarType::Float64
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown scalar type name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scalar type: {0}")]
pub struct ParseScalarTypeError(pub String);

impl FromStr for ScalarType {
    type Err = ParseScalarTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int8" | "i8" | "char" => Ok(ScalarType::Int8),
            "int16" | "i16" | "short" => Ok(ScalarType::Int16),
            "int32" | "i32" | "int" => Ok(ScalarType::Int32),
            "int64" | "i64" | "long" => Ok(ScalarType::Int64),
            "uint8" | "u8" | "byte" => Ok(ScalarType::UInt8),
            "uint16" | "u16" => Ok(ScalarType::UInt16),
            "uint32" | "u32" => Ok(ScalarType::UInt32),
            "uint64" | "u64" => Ok(ScalarType::UInt64),
            "float32" | "f32" | "float" => Ok(ScalarType::Float32),
            "float64" | "f64" | "double" => Ok(ScalarType::Float64),
            _ => Err(ParseScalarTypeError(s.to_string())),
        }
    }
}

/// One element, in its type's native representation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ScalarValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl ScalarValue {
    /// Zero of the given type.
    pub const fn zero(ty: ScalarType) -> ScalarValue {
        match ty {
            ScalarType::Int8 => ScalarValue::I8(0),
            ScalarType::Int16 => ScalarValue::I16(0),
            ScalarType::Int32 => ScalarValue::I32(0),
            ScalarType::Int64 => ScalarValue::I64(0),
            ScalarType::UInt8 => ScalarValue::U8(0),
            ScalarType::UInt16 => ScalarValue::U16(0),
            ScalarType::UInt32 => ScalarValue::U32(0),
            ScalarType::UInt64 => ScalarValue::U64(0),
            ScalarType::Float32 => ScalarValue::F32(0.0),
            ScalarType::Float64 => ScalarValue::F64(0.0),
        }
    }

    pub const fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarValue::I8(_) => ScalarType::Int8,
            ScalarValue::I16(_) => ScalarType::Int16,
            ScalarValue::I32(_) => ScalarType::Int32,
            ScalarValue::I64(_) => ScalarType::Int64,
            ScalarValue::U8(_) => ScalarType::UInt8,
            ScalarValue::U16(_) => ScalarType::UInt16,
            ScalarValue::U32(_) => ScalarType::UInt32,
            ScalarValue::U64(_) => ScalarType::UInt64,
            ScalarValue::F32(_) => ScalarType::Float32,
            ScalarValue::F64(_) => ScalarType::Float64,
        }
    }

    /// Widened view for display and plotting. Lossy for 64-bit integers
    /// beyond 2^53.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ScalarValue::I8(v) => v as f64,
            ScalarValue::I16(v) => v as f64,
            ScalarValue::I32(v) => v as f64,
            ScalarValue::I64(v) => v as f64,
            ScalarValue::U8(v) => v as f64,
            ScalarValue::U16(v) => v as f64,
            ScalarValue::U32(v) => v as f64,
            ScalarValue::U64(v) => v as f64,
            ScalarValue::F32(v) => v as f64,
            ScalarValue::F64(v) => v,
        }
    }

    /// Convert into another scalar type under the exact-value policy.
    pub fn convert(self, target: ScalarType) -> Option<ScalarValue> {
        match target {
            ScalarType::Int8 => i8::from_value(self).map(ScalarValue::I8),
            ScalarType::Int16 => i16::from_value(self).map(ScalarValue::I16),
            ScalarType::Int32 => i32::from_value(self).map(ScalarValue::I32),
            ScalarType::Int64 => i64::from_value(self).map(ScalarValue::I64),
            ScalarType::UInt8 => u8::from_value(self).map(ScalarValue::U8),
            ScalarType::UInt16 => u16::from_value(self).map(ScalarValue::U16),
            ScalarType::UInt32 => u32::from_value(self).map(ScalarValue::U32),
            ScalarType::UInt64 => u64::from_value(self).map(ScalarValue::U64),
            ScalarType::Float32 => f32::from_value(self).map(ScalarValue::F32),
            ScalarType::Float64 => f64::from_value(self).map(ScalarValue::F64),
        }
    }

    fn exact(self) -> Exact {
        match self {
            ScalarValue::I8(v) => Exact::Int(v.into()),
            ScalarValue::I16(v) => Exact::Int(v.into()),
            ScalarValue::I32(v) => Exact::Int(v.into()),
            ScalarValue::I64(v) => Exact::Int(v.into()),
            ScalarValue::U8(v) => Exact::Int(v.into()),
            ScalarValue::U16(v) => Exact::Int(v.into()),
            ScalarValue::U32(v) => Exact::Int(v.into()),
            ScalarValue::U64(v) => Exact::Int(v.into()),
            ScalarValue::F32(v) => Exact::Float(v.into()),
            ScalarValue::F64(v) => Exact::Float(v),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::I8(v) => write!(f, "{}", v),
            ScalarValue::I16(v) => write!(f, "{}", v),
            ScalarValue::I32(v) => write!(f, "{}", v),
            ScalarValue::I64(v) => write!(f, "{}", v),
            ScalarValue::U8(v) => write!(f, "{}", v),
            ScalarValue::U16(v) => write!(f, "{}", v),
            ScalarValue::U32(v) => write!(f, "{}", v),
            ScalarValue::U64(v) => write!(f, "{}", v),
            ScalarValue::F32(v) => write!(f, "{}", v),
            ScalarValue::F64(v) => write!(f, "{}", v),
        }
    }
}

/// Exact numeric value: every integer type fits in `i128`, every float in `f64`.
#[derive(Clone, Copy)]
enum Exact {
    Int(i128),
    Float(f64),
}

/// Integral value of a finite float, if it has one.
fn integral(f: f64) -> Option<i128> {
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    // `as` saturates; the round trip rejects anything that saturated.
    let i = f as i128;
    if i as f64 == f {
        Some(i)
    } else {
        None
    }
}

/// Native Rust types that map one-to-one onto a [`ScalarType`].
pub trait Scalar: Copy + Sized {
    /// Wire type this Rust type stores as.
    const TYPE: ScalarType;

    fn into_value(self) -> ScalarValue;

    /// Exact conversion from any scalar value; `None` if the value is not
    /// representable in `Self`.
    fn from_value(value: ScalarValue) -> Option<Self>;
}

macro_rules! impl_scalar_int {
    ($ty:ty, $variant:ident, $st:ident) => {
        impl Scalar for $ty {
            const TYPE: ScalarType = ScalarType::$st;

            fn into_value(self) -> ScalarValue {
                ScalarValue::$variant(self)
            }

            fn from_value(value: ScalarValue) -> Option<Self> {
                match value.exact() {
                    Exact::Int(v) => <$ty>::try_from(v).ok(),
                    Exact::Float(f) => integral(f).and_then(|v| <$ty>::try_from(v).ok()),
                }
            }
        }

        impl From<$ty> for ScalarValue {
            fn from(v: $ty) -> Self {
                ScalarValue::$variant(v)
            }
        }
    };
}

impl_scalar_int!(i8, I8, Int8);
impl_scalar_int!(i16, I16, Int16);
impl_scalar_int!(i32, I32, Int32);
impl_scalar_int!(i64, I64, Int64);
impl_scalar_int!(u8, U8, UInt8);
impl_scalar_int!(u16, U16, UInt16);
impl_scalar_int!(u32, U32, UInt32);
impl_scalar_int!(u64, U64, UInt64);

impl Scalar for f32 {
    const TYPE: ScalarType = ScalarType::Float32;

    fn into_value(self) -> ScalarValue {
        ScalarValue::F32(self)
    }

    fn from_value(value: ScalarValue) -> Option<Self> {
        if let ScalarValue::F32(v) = value {
            return Some(v);
        }
        match value.exact() {
            Exact::Int(v) => {
                let f = v as f32;
                (f.is_finite() && f as i128 == v).then_some(f)
            }
            Exact::Float(f) => {
                if f.is_nan() {
                    return Some(f32::NAN);
                }
                let narrowed = f as f32;
                (narrowed as f64 == f).then_some(narrowed)
            }
        }
    }
}

impl Scalar for f64 {
    const TYPE: ScalarType = ScalarType::Float64;

    fn into_value(self) -> ScalarValue {
        ScalarValue::F64(self)
    }

    fn from_value(value: ScalarValue) -> Option<Self> {
        match value.exact() {
            Exact::Int(v) => {
                let f = v as f64;
                (f as i128 == v).then_some(f)
            }
            Exact::Float(f) => Some(f),
        }
    }
}

impl From<f32> for ScalarValue {
    fn from(v: f32) -> Self {
        ScalarValue::F32(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::F64(v)
    }
}
