//! Fixed GGUF header: magic, version, tensor count, metadata-kv count.

use std::io::Read;

use super::error::GgufError;
use super::reader::GgufReader;

pub const GGUF_MAGIC: u32 = 0x4655_4747;
pub const SUPPORTED_VERSIONS: &[u32] = &[2, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u32,
    pub tensor_count: u64,
    pub metadata_kv_count: u64,
}

impl Header {
    pub(super) fn read<R: Read>(reader: &mut GgufReader<R>) -> Result<Self, GgufError> {
        let magic = reader.read_u32()?;
        if magic != GGUF_MAGIC {
            return Err(GgufError::InvalidMagic(magic));
        }
        let version = reader.read_u32()?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(GgufError::UnsupportedVersion(version));
        }
        let tensor_count = reader.read_u64()?;
        let metadata_kv_count = reader.read_u64()?;
        Ok(Self {
            version,
            tensor_count,
            metadata_kv_count,
        })
    }
}
