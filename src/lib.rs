//! llmkube — a cluster-level Kubernetes control plane that turns declarative
//! `Model` and `InferenceService` objects into GPU-aware inference workloads.
//!
//! # Architecture
//!
//! - [`api`]: the `Model` and `InferenceService` custom resources.
//! - [`gguf`]: header/metadata parser for the GGUF artifact format.
//! - [`dns`]: DNS-1035 name sanitization shared by all derived object names.
//! - [`capability`]: host accelerator detection (Metal/CUDA/ROCm).
//! - [`cache`]: content-addressed on-disk artifact cache, one PVC per namespace.
//! - [`fetch`]: artifact acquisition (local copy or HTTP download).
//! - [`workload`]: pure translation from `(Model, InferenceService)` to k8s objects.
//! - [`reconcile`]: the two controllers and their shared context.
//! - [`agent`]: the host agent that supervises `llama-server` on Metal nodes.
//! - [`config`], [`health`], [`shutdown`], [`telemetry`]: ambient runtime concerns.

pub mod agent;
pub mod api;
pub mod cache;
pub mod capability;
pub mod config;
pub mod dns;
pub mod fetch;
pub mod gguf;
pub mod health;
pub mod reconcile;
pub mod shutdown;
pub mod telemetry;
pub mod workload;
