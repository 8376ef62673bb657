use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Metal is not available on this host")]
    MetalUnavailable,

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("artifact fetch error: {0}")]
    Fetch(#[from] crate::fetch::FetchError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
