//! GGUF metadata value types.
//!
//! Modeled as a single tagged union with one dispatch function, per the
//! format's own encoding: a value is read by looking at its type tag once
//! and branching, never through virtual dispatch.

use super::error::GgufError;

/// The eleven value-type tags a GGUF metadata value or array element can
/// carry, plus the array wrapper itself (tag 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    Bool,
    String,
    Array,
    U64,
    I64,
    F64,
}

impl TryFrom<u32> for ValueType {
    type Error = GgufError;

    fn try_from(tag: u32) -> Result<Self, Self::Error> {
        Ok(match tag {
            0 => ValueType::U8,
            1 => ValueType::I8,
            2 => ValueType::U16,
            3 => ValueType::I16,
            4 => ValueType::U32,
            5 => ValueType::I32,
            6 => ValueType::F32,
            7 => ValueType::Bool,
            8 => ValueType::String,
            9 => ValueType::Array,
            10 => ValueType::U64,
            11 => ValueType::I64,
            12 => ValueType::F64,
            other => return Err(GgufError::UnknownValueType(other)),
        })
    }
}

/// A decoded metadata value. Arrays carry no per-element type tag; every
/// element shares the array's declared element type.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    Bool(bool),
    String(String),
    Array(Vec<MetadataValue>),
    U64(u64),
    I64(i64),
    F64(f64),
}

impl MetadataValue {
    /// Coerce any unsigned-integer variant to `u64`. Used by derived
    /// accessors that read architecture-specific attributes whose width
    /// varies by model (`u32` context length vs. `u64` block count, etc).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            MetadataValue::U8(v) => Some(*v as u64),
            MetadataValue::U16(v) => Some(*v as u64),
            MetadataValue::U32(v) => Some(*v as u64),
            MetadataValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}
