//! Tensor descriptor decoding.
//!
//! Only the descriptor is read here — name, shape, quantization class, and
//! the byte offset of the tensor's data — never the tensor data itself.

use std::io::Read;

use super::error::GgufError;
use super::reader::GgufReader;

/// One tensor's descriptor from the GGUF tensor-info section.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorInfo {
    pub name: String,
    pub dimensions: Vec<u64>,
    /// GGML type id (quantization/precision class of this tensor).
    pub ggml_type: u32,
    /// Byte offset of the tensor's data within the data section.
    pub offset: u64,
}

impl TensorInfo {
    pub(super) fn read<R: Read>(reader: &mut GgufReader<R>) -> Result<Self, GgufError> {
        let name = reader.read_string()?;
        let dimensions = reader.read_dimensions()?;
        let ggml_type = reader.read_u32()?;
        let offset = reader.read_u64()?;
        Ok(Self {
            name,
            dimensions,
            ggml_type,
            offset,
        })
    }
}
