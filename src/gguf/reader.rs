//! Little-endian byte reader with the safety bounds from the GGUF format.

use std::io::Read;

use super::error::GgufError;
use super::value::{MetadataValue, ValueType};

/// String payloads longer than this are rejected outright, never truncated.
pub const MAX_STRING_LEN: u64 = 10 * 1024 * 1024;
/// Array element counts above this are rejected outright.
pub const MAX_ARRAY_COUNT: u64 = 10_000_000;
/// Tensor dimension counts above this are rejected outright.
pub const MAX_DIMENSIONS: u64 = 16;
/// Pre-allocation for a `Vec` driven by an untrusted count is capped here;
/// the vector still grows to the full declared size as elements are read.
const PREALLOC_CAP: usize = 65_536;

pub struct GgufReader<R> {
    inner: R,
}

impl<R: Read> GgufReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn read_exact_buf(&mut self, buf: &mut [u8]) -> Result<(), GgufError> {
        self.inner.read_exact(buf)?;
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, GgufError> {
        let mut buf = [0u8; 1];
        self.read_exact_buf(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, GgufError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool, GgufError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16, GgufError> {
        let mut buf = [0u8; 2];
        self.read_exact_buf(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    pub fn read_i16(&mut self) -> Result<i16, GgufError> {
        let mut buf = [0u8; 2];
        self.read_exact_buf(&mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    pub fn read_u32(&mut self) -> Result<u32, GgufError> {
        let mut buf = [0u8; 4];
        self.read_exact_buf(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn read_i32(&mut self) -> Result<i32, GgufError> {
        let mut buf = [0u8; 4];
        self.read_exact_buf(&mut buf)?;
        Ok(i32::from_le_bytes(buf))
    }

    pub fn read_f32(&mut self) -> Result<f32, GgufError> {
        let mut buf = [0u8; 4];
        self.read_exact_buf(&mut buf)?;
        Ok(f32::from_le_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64, GgufError> {
        let mut buf = [0u8; 8];
        self.read_exact_buf(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_i64(&mut self) -> Result<i64, GgufError> {
        let mut buf = [0u8; 8];
        self.read_exact_buf(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    pub fn read_f64(&mut self) -> Result<f64, GgufError> {
        let mut buf = [0u8; 8];
        self.read_exact_buf(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    /// `u64` length prefix followed by that many UTF-8 bytes.
    pub fn read_string(&mut self) -> Result<String, GgufError> {
        let len = self.read_u64()?;
        if len > MAX_STRING_LEN {
            return Err(GgufError::SizeLimitExceeded {
                field: "string length",
                actual: len,
                limit: MAX_STRING_LEN,
            });
        }
        let mut buf = vec![0u8; len as usize];
        self.read_exact_buf(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// `u64` count followed by that many `u64` dimensions, bounded by
    /// [`MAX_DIMENSIONS`].
    pub fn read_dimensions(&mut self) -> Result<Vec<u64>, GgufError> {
        let count = self.read_u32()? as u64;
        if count > MAX_DIMENSIONS {
            return Err(GgufError::SizeLimitExceeded {
                field: "tensor dimension count",
                actual: count,
                limit: MAX_DIMENSIONS,
            });
        }
        let mut dims = Vec::with_capacity((count as usize).min(PREALLOC_CAP));
        for _ in 0..count {
            dims.push(self.read_u64()?);
        }
        Ok(dims)
    }

    /// Read one value of the given declared type.
    pub fn read_value_of(&mut self, ty: ValueType) -> Result<MetadataValue, GgufError> {
        Ok(match ty {
            ValueType::U8 => MetadataValue::U8(self.read_u8()?),
            ValueType::I8 => MetadataValue::I8(self.read_i8()?),
            ValueType::U16 => MetadataValue::U16(self.read_u16()?),
            ValueType::I16 => MetadataValue::I16(self.read_i16()?),
            ValueType::U32 => MetadataValue::U32(self.read_u32()?),
            ValueType::I32 => MetadataValue::I32(self.read_i32()?),
            ValueType::F32 => MetadataValue::F32(self.read_f32()?),
            ValueType::Bool => MetadataValue::Bool(self.read_bool()?),
            ValueType::String => MetadataValue::String(self.read_string()?),
            ValueType::U64 => MetadataValue::U64(self.read_u64()?),
            ValueType::I64 => MetadataValue::I64(self.read_i64()?),
            ValueType::F64 => MetadataValue::F64(self.read_f64()?),
            ValueType::Array => MetadataValue::Array(self.read_array()?),
        })
    }

    /// A value tagged as a top-level metadata entry: `u32` type tag then
    /// the value of that type.
    pub fn read_tagged_value(&mut self) -> Result<MetadataValue, GgufError> {
        let tag = self.read_u32()?;
        let ty = ValueType::try_from(tag)?;
        self.read_value_of(ty)
    }

    /// Array element type tag, element count, then that many untagged
    /// values of the declared element type.
    fn read_array(&mut self) -> Result<Vec<MetadataValue>, GgufError> {
        let elem_tag = self.read_u32()?;
        let elem_ty = ValueType::try_from(elem_tag)?;
        let count = self.read_u64()?;
        if count > MAX_ARRAY_COUNT {
            return Err(GgufError::SizeLimitExceeded {
                field: "array element count",
                actual: count,
                limit: MAX_ARRAY_COUNT,
            });
        }
        let mut values = Vec::with_capacity((count as usize).min(PREALLOC_CAP));
        for _ in 0..count {
            values.push(self.read_value_of(elem_ty)?);
        }
        Ok(values)
    }
}
