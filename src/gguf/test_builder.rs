//! In-memory GGUF byte stream builder, used only by this module's own
//! round-trip and boundary tests.

pub struct TestTensor {
    pub name: String,
    pub dimensions: Vec<u64>,
    pub ggml_type: u32,
    pub offset: u64,
}

pub struct GgufBuilder {
    version: u32,
    metadata: Vec<(String, Vec<u8>)>,
    tensors: Vec<TestTensor>,
}

fn encode_string(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + s.len());
    out.extend_from_slice(&(s.len() as u64).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    out
}

fn encode_tagged_string(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&8u32.to_le_bytes()); // ValueType::String = 8
    out.extend_from_slice(&encode_string(s));
    out
}

fn encode_tagged_u32(v: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&4u32.to_le_bytes()); // ValueType::U32 = 4
    out.extend_from_slice(&v.to_le_bytes());
    out
}

fn encode_tagged_u64(v: u64) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&10u32.to_le_bytes()); // ValueType::U64 = 10
    out.extend_from_slice(&v.to_le_bytes());
    out
}

impl Default for GgufBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GgufBuilder {
    pub fn new() -> Self {
        Self {
            version: 3,
            metadata: Vec::new(),
            tensors: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn architecture(mut self, arch: &str) -> Self {
        self.metadata.push(("general.architecture".into(), encode_tagged_string(arch)));
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.metadata.push(("general.name".into(), encode_tagged_string(name)));
        self
    }

    pub fn file_type(mut self, ft: u32) -> Self {
        self.metadata.push(("general.file_type".into(), encode_tagged_u32(ft)));
        self
    }

    pub fn context_length(mut self, v: u64) -> Self {
        self.metadata.push(("llama.context_length".into(), encode_tagged_u64(v)));
        self
    }

    pub fn embedding_length(mut self, v: u64) -> Self {
        self.metadata.push(("llama.embedding_length".into(), encode_tagged_u64(v)));
        self
    }

    pub fn block_count(mut self, v: u64) -> Self {
        self.metadata.push(("llama.block_count".into(), encode_tagged_u64(v)));
        self
    }

    pub fn head_count(mut self, v: u64) -> Self {
        self.metadata
            .push(("llama.attention.head_count".into(), encode_tagged_u64(v)));
        self
    }

    pub fn extra_string(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.into(), encode_tagged_string(value)));
        self
    }

    /// Array of `u32` values, element-type tag 4, with the real count.
    pub fn extra_u32_array(mut self, key: &str, values: Vec<u32>) -> Self {
        let mut encoded = Vec::new();
        encoded.extend_from_slice(&9u32.to_le_bytes()); // ValueType::Array = 9
        encoded.extend_from_slice(&4u32.to_le_bytes()); // element type = U32
        encoded.extend_from_slice(&(values.len() as u64).to_le_bytes());
        for v in values {
            encoded.extend_from_slice(&v.to_le_bytes());
        }
        self.metadata.push((key.into(), encoded));
        self
    }

    /// Array whose declared count does not match the number of elements
    /// actually written — used to exercise the over-limit rejection path
    /// without materializing the oversized element payload.
    pub fn extra_u32_array_raw_count(mut self, key: &str, declared_count: u64, elems: &[u32]) -> Self {
        let mut encoded = Vec::new();
        encoded.extend_from_slice(&9u32.to_le_bytes());
        encoded.extend_from_slice(&4u32.to_le_bytes());
        encoded.extend_from_slice(&declared_count.to_le_bytes());
        for v in elems {
            encoded.extend_from_slice(&v.to_le_bytes());
        }
        self.metadata.push((key.into(), encoded));
        self
    }

    pub fn tensor(mut self, t: TestTensor) -> Self {
        self.tensors.push(t);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&super::header::GGUF_MAGIC.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&(self.tensors.len() as u64).to_le_bytes());
        out.extend_from_slice(&(self.metadata.len() as u64).to_le_bytes());

        for (key, value_bytes) in &self.metadata {
            out.extend_from_slice(&encode_string(key));
            out.extend_from_slice(value_bytes);
        }

        for t in &self.tensors {
            out.extend_from_slice(&encode_string(&t.name));
            out.extend_from_slice(&(t.dimensions.len() as u32).to_le_bytes());
            for d in &t.dimensions {
                out.extend_from_slice(&d.to_le_bytes());
            }
            out.extend_from_slice(&t.ggml_type.to_le_bytes());
            out.extend_from_slice(&t.offset.to_le_bytes());
        }

        out
    }
}
