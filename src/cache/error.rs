use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error on cache path {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Kubernetes API error ensuring namespace PVC: {0}")]
    Kube(#[from] kube::Error),
}
