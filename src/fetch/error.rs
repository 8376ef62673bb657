use thiserror::Error;

/// Errors surfaced while acquiring a model artifact into the cache.
///
/// The reconciler maps [`FetchError::Copy`] to the `CopyFailed` reason and
/// [`FetchError::Download`] to `DownloadFailed`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("local copy failed: {0}")]
    Copy(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
