//! Translate `(Model, InferenceService)` into container workload specs.
//!
//! The heart of the system: builds a Service (always) and, on the
//! containerized path, a Deployment with correctly constructed GPU args,
//! merged tolerations, and an init-stage downloader. Deliberately omits
//! workload construction entirely when the Model's accelerator is `metal`
//! — that path belongs to the host agent.

pub mod args;
mod builder;
mod error;
mod tolerations;

pub use builder::{build, WorkloadSpec, CACHE_MOUNT_PATH, CPU_IMAGE, CUDA_IMAGE, OWNER_LABEL, PATH_ANNOTATION};
pub use error::WorkloadError;
