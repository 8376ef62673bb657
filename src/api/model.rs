//! The `Model` custom resource: what artifact to fetch and how it should run.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    #[default]
    Gguf,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Accelerator {
    #[default]
    Cpu,
    Metal,
    Cuda,
    Rocm,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ShardingStrategy {
    Layer,
    Tensor,
    Pipeline,
}

/// Multi-GPU sharding hints. Present in the data model, deliberately ignored
/// by the workload builder — see DESIGN.md.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShardingSpec {
    pub strategy: ShardingStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_split: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GpuSpec {
    #[serde(default)]
    pub enabled: bool,
    /// Number of GPUs, 0..=8.
    #[serde(default)]
    pub count: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<GpuVendor>,
    /// Layers to offload; -1 means "auto" (engine decides).
    #[serde(default = "default_layers")]
    pub layers: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharding: Option<ShardingSpec>,
}

fn default_layers() -> i64 {
    -1
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareSpec {
    #[serde(default)]
    pub accelerator: Accelerator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<GpuSpec>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequests {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

#[derive(Clone, CustomResource, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "llmkube.io",
    version = "v1alpha1",
    kind = "Model",
    plural = "models",
    status = "ModelStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ModelSpec {
    /// HTTP(S) URL, `file://` URL, or absolute host path. Must end in the
    /// artifact extension implied by `format`.
    pub source: String,
    #[serde(default)]
    pub format: ModelFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<String>,
    #[serde(default)]
    pub hardware: HardwareSpec,
    #[serde(default)]
    pub resources: ResourceRequests,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ModelPhase {
    #[default]
    Unknown,
    Downloading,
    Copying,
    Ready,
    Cached,
    Failed,
}

/// Parsed GGUF metadata, surfaced best-effort (a parse failure never fails
/// the Model; it is simply absent here).
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GgufMetadataStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tensor_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_version: Option<u32>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    #[serde(default)]
    pub phase: ModelPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Human-formatted byte size (e.g. "4.2 GiB").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accelerator_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GgufMetadataStatus>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Model {
    /// Whether this Model is usable as an InferenceService's dependency.
    pub fn is_ready(&self) -> bool {
        matches!(
            self.status.as_ref().map(|s| s.phase),
            Some(ModelPhase::Ready) | Some(ModelPhase::Cached)
        )
    }
}
