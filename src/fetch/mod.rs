//! Artifact fetcher: bring a declared source to a cache destination path.
//!
//! Dispatch is origin-aware: `file://` or an absolute path is a local copy;
//! anything else is an HTTP(S) GET. No retry ladder and no progress
//! reporting live here — that is the reconciler's requeue policy.

mod error;

pub use error::FetchError;

use std::path::Path;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::cache::partial_path;

/// Acquire `source` into `dest`, streaming through a `.partial` staging
/// file so a crash mid-fetch never leaves a file at `dest` that looks
/// complete. Returns the number of bytes written.
pub async fn fetch(source: &str, dest: &Path) -> Result<u64, FetchError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let result = if is_local(source) {
        copy_local(source, dest).await
    } else {
        download_http(source, dest).await
    };

    if result.is_err() {
        let _ = tokio::fs::remove_file(partial_path(dest)).await;
    }
    result
}

/// Whether `source` is a local path (`file://` URL or absolute path) rather
/// than something fetched over HTTP(S).
pub fn is_local(source: &str) -> bool {
    source.starts_with("file://") || source.starts_with('/')
}

fn local_path(source: &str) -> &str {
    source.strip_prefix("file://").unwrap_or(source)
}

async fn copy_local(source: &str, dest: &std::path::Path) -> Result<u64, FetchError> {
    let src_path = local_path(source);
    let expected = tokio::fs::metadata(src_path)
        .await
        .map_err(|e| FetchError::Copy(format!("stat {src_path}: {e}")))?
        .len();

    let staging = partial_path(dest);
    let written = tokio::fs::copy(src_path, &staging)
        .await
        .map_err(|e| FetchError::Copy(format!("copy {src_path}: {e}")))?;

    if written != expected {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(FetchError::Copy(format!(
            "short copy: wrote {written} bytes, expected {expected}"
        )));
    }

    tokio::fs::rename(&staging, dest)
        .await
        .map_err(|e| FetchError::Copy(format!("rename into place: {e}")))?;
    Ok(written)
}

async fn download_http(source: &str, dest: &std::path::Path) -> Result<u64, FetchError> {
    let response = reqwest::get(source)
        .await
        .map_err(|e| FetchError::Download(e.to_string()))?;

    if response.status().as_u16() != 200 {
        return Err(FetchError::Download(format!(
            "unexpected status {}",
            response.status()
        )));
    }

    let staging = partial_path(dest);
    let mut file = tokio::fs::File::create(&staging).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::Download(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&staging, dest)
        .await
        .map_err(|e| FetchError::Download(format!("rename into place: {e}")))?;
    Ok(written)
}
