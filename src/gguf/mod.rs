//! GGUF header, metadata, and tensor-descriptor parser.
//!
//! Reads only the fixed header, the metadata key/value section, and the
//! tensor descriptors of a GGUF artifact — never tensor data. Dynamic
//! dispatch over value kinds collapses to the tagged union in
//! [`value::MetadataValue`] plus a single read function; there is no
//! per-kind trait object anywhere in this module.

mod error;
mod header;
mod quantization;
mod reader;
mod tensor;
mod value;

pub use error::GgufError;
pub use header::Header;
pub use tensor::TensorInfo;
pub use value::{MetadataValue, ValueType};

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use reader::GgufReader;

/// Decoded GGUF artifact: header, flat metadata key/value map, and one
/// descriptor per tensor. No tensor data is held or loaded.
#[derive(Debug, Clone)]
pub struct GgufFile {
    pub header: Header,
    pub metadata: HashMap<String, MetadataValue>,
    pub tensors: Vec<TensorInfo>,
}

impl GgufFile {
    /// Parse a GGUF artifact from any `Read` source (a file, a network
    /// body buffered in memory, or a test fixture).
    pub fn parse<R: Read>(source: R) -> Result<Self, GgufError> {
        let mut reader = GgufReader::new(source);
        let header = Header::read(&mut reader)?;

        let mut metadata = HashMap::with_capacity((header.metadata_kv_count as usize).min(4096));
        for _ in 0..header.metadata_kv_count {
            let key = reader.read_string()?;
            let value = reader.read_tagged_value()?;
            metadata.insert(key, value);
        }

        let mut tensors = Vec::with_capacity((header.tensor_count as usize).min(65_536));
        for _ in 0..header.tensor_count {
            tensors.push(TensorInfo::read(&mut reader)?);
        }

        Ok(Self {
            header,
            metadata,
            tensors,
        })
    }

    /// Parse a GGUF artifact by memory-mapping the file at `path` and
    /// reading the header region out of the mapping. Tensor data is never
    /// touched; the mapping is dropped once parsing completes.
    pub fn parse_path(path: &Path) -> Result<Self, GgufError> {
        let file = File::open(path)?;
        // SAFETY: read-only mapping of a file this process does not
        // concurrently write to; only header bytes are ever dereferenced.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::parse(Cursor::new(&mmap[..]))
    }

    fn string_meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(MetadataValue::as_str)
    }

    fn arch_attr_u64(&self, attr: &str) -> Option<u64> {
        let arch = self.architecture()?;
        self.metadata
            .get(&format!("{arch}.{attr}"))
            .and_then(MetadataValue::as_u64)
    }

    pub fn architecture(&self) -> Option<&str> {
        self.string_meta("general.architecture")
    }

    pub fn name(&self) -> Option<&str> {
        self.string_meta("general.name")
    }

    pub fn license(&self) -> Option<&str> {
        self.string_meta("general.license")
    }

    /// `general.file_type` mapped through the fixed quantization table;
    /// `"Unknown"` when the key is absent or the code is unrecognized.
    pub fn quantization(&self) -> &'static str {
        match self.metadata.get("general.file_type").and_then(MetadataValue::as_u64) {
            Some(ft) => quantization::file_type_name(ft as u32),
            None => "Unknown",
        }
    }

    pub fn context_length(&self) -> Option<u64> {
        self.arch_attr_u64("context_length")
    }

    pub fn embedding_length(&self) -> Option<u64> {
        self.arch_attr_u64("embedding_length")
    }

    pub fn block_count(&self) -> Option<u64> {
        self.arch_attr_u64("block_count")
    }

    pub fn head_count(&self) -> Option<u64> {
        self.arch_attr_u64("attention.head_count")
    }

    pub fn tensor_count(&self) -> u64 {
        self.header.tensor_count
    }
}

#[cfg(test)]
pub mod test_builder;

#[cfg(test)]
mod tests {
    use super::test_builder::{GgufBuilder, TestTensor};
    use super::*;

    #[test]
    fn round_trip_metadata_and_tensors() {
        let bytes = GgufBuilder::new()
            .architecture("llama")
            .name("tinyllama-1.1b")
            .file_type(15)
            .context_length(2048)
            .embedding_length(2048)
            .block_count(22)
            .head_count(32)
            .tensor(TestTensor {
                name: "token_embd.weight".into(),
                dimensions: vec![2048, 32000],
                ggml_type: 2,
                offset: 0,
            })
            .tensor(TestTensor {
                name: "output_norm.weight".into(),
                dimensions: vec![2048],
                ggml_type: 0,
                offset: 4096,
            })
            .build();

        let parsed = GgufFile::parse(Cursor::new(bytes)).unwrap();
        assert_eq!(parsed.architecture(), Some("llama"));
        assert_eq!(parsed.name(), Some("tinyllama-1.1b"));
        assert_eq!(parsed.quantization(), "Q4_K_M");
        assert_eq!(parsed.context_length(), Some(2048));
        assert_eq!(parsed.embedding_length(), Some(2048));
        assert_eq!(parsed.block_count(), Some(22));
        assert_eq!(parsed.head_count(), Some(32));
        assert_eq!(parsed.tensor_count(), 2);
        assert_eq!(parsed.tensors[0].offset, 0);
        assert_eq!(parsed.tensors[1].offset, 4096);
        assert_eq!(parsed.tensors[1].dimensions, vec![2048]);
    }

    #[test]
    fn invalid_magic_is_rejected() {
        let bytes = vec![0u8; 16];
        let err = GgufFile::parse(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, GgufError::InvalidMagic(_)));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let bytes = GgufBuilder::new().with_version(99).build();
        let err = GgufFile::parse(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, GgufError::UnsupportedVersion(99)));
    }

    #[test]
    fn truncated_header_is_io_error_never_panics() {
        for len in [0usize, 2, 15] {
            let bytes = vec![0x47u8; len];
            let result = GgufFile::parse(Cursor::new(bytes));
            assert!(matches!(result, Err(GgufError::Io(_)) | Err(GgufError::InvalidMagic(_))));
        }
    }

    #[test]
    fn unknown_file_type_is_unknown_quantization() {
        let bytes = GgufBuilder::new().file_type(9999).build();
        let parsed = GgufFile::parse(Cursor::new(bytes)).unwrap();
        assert_eq!(parsed.quantization(), "Unknown");
    }

    #[test]
    fn string_at_exactly_the_limit_parses() {
        let s = "a".repeat(reader::MAX_STRING_LEN as usize);
        let bytes = GgufBuilder::new().extra_string("general.license", &s).build();
        let parsed = GgufFile::parse(Cursor::new(bytes)).unwrap();
        assert_eq!(parsed.license().unwrap().len(), s.len());
    }

    #[test]
    fn string_one_byte_over_limit_fails() {
        let s = "a".repeat(reader::MAX_STRING_LEN as usize + 1);
        let bytes = GgufBuilder::new().extra_string("general.license", &s).build();
        let err = GgufFile::parse(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, GgufError::SizeLimitExceeded { .. }));
    }

    #[test]
    fn dimension_count_exactly_16_parses_17_fails() {
        let ok = GgufBuilder::new()
            .tensor(TestTensor {
                name: "t".into(),
                dimensions: vec![1; 16],
                ggml_type: 0,
                offset: 0,
            })
            .build();
        assert!(GgufFile::parse(Cursor::new(ok)).is_ok());

        let bad = GgufBuilder::new()
            .tensor(TestTensor {
                name: "t".into(),
                dimensions: vec![1; 17],
                ggml_type: 0,
                offset: 0,
            })
            .build();
        let err = GgufFile::parse(Cursor::new(bad)).unwrap_err();
        assert!(matches!(err, GgufError::SizeLimitExceeded { .. }));
    }

    #[test]
    fn array_count_exactly_at_limit_parses_one_more_fails() {
        let ok = GgufBuilder::new()
            .extra_u32_array("test.arr", vec![0u32; reader::MAX_ARRAY_COUNT as usize])
            .build();
        assert!(GgufFile::parse(Cursor::new(ok)).is_ok());

        let bad = GgufBuilder::new()
            .extra_u32_array_raw_count("test.arr", reader::MAX_ARRAY_COUNT + 1, &[])
            .build();
        let err = GgufFile::parse(Cursor::new(bad)).unwrap_err();
        assert!(matches!(err, GgufError::SizeLimitExceeded { .. }));
    }
}
