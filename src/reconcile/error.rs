use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("cache error: {0}")]
    Cache(#[from] crate::cache::CacheError),

    #[error(transparent)]
    Fetch(#[from] crate::fetch::FetchError),

    #[error(transparent)]
    Workload(#[from] crate::workload::WorkloadError),

    #[error("referenced Model {0:?} not found")]
    ModelNotFound(String),

    #[error("object has no namespace")]
    NoNamespace,
}
