//! Custom resource definitions for the control plane: `Model` and
//! `InferenceService`, plus shared condition-building helpers.

pub mod condition;
pub mod inference_service;
pub mod model;

pub use inference_service::{
    EndpointSpec, InferenceService, InferenceServicePhase, InferenceServiceSpec,
    InferenceServiceStatus, IsvcResources, ServiceType,
};
pub use model::{
    Accelerator, GgufMetadataStatus, GpuSpec, GpuVendor, HardwareSpec, Model, ModelFormat,
    ModelPhase, ModelSpec, ModelStatus, ResourceRequests, ShardingSpec, ShardingStrategy,
};
