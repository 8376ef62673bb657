//! Content-addressed on-disk cache, one root per namespace.
//!
//! The cache key is a pure function of the declared source string; models
//! that share a source share a cache entry. Never holds a lock across a
//! download — the on-disk contract itself (write-to-`.partial`-then-rename)
//! is what serializes concurrent writers (see [`staged_write`]).

mod error;

pub use error::CacheError;

use std::path::{Path, PathBuf};

use k8s_openapi::api::core::v1::{PersistentVolumeClaim, PersistentVolumeClaimSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const PVC_NAME: &str = "llmkube-model-cache";
const DEFAULT_CAPACITY: &str = "50Gi";

/// First 16 hex characters of SHA-256 of `source`. Pure function of its
/// input — no process-global state is consulted.
pub fn cache_key(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    hex::encode(&digest[..8])
}

/// Manages the on-disk tree under one root directory per namespace.
#[derive(Debug, Clone)]
pub struct CacheManager {
    root: PathBuf,
}

impl CacheManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn namespace_root(&self, namespace: &str) -> PathBuf {
        self.root.join(namespace)
    }

    fn entry_dir(&self, namespace: &str, key: &str) -> PathBuf {
        self.namespace_root(namespace).join(key)
    }

    /// Compute the target path for `source` in `namespace` and report
    /// whether a complete file already exists there. Existence is
    /// (file exists) && (size > 0); a byte-size match against a prior
    /// record, if one exists, is advisory only.
    pub fn resolve(&self, namespace: &str, source: &str, ext: &str) -> (PathBuf, bool) {
        let key = cache_key(source);
        let path = self.entry_dir(namespace, &key).join(format!("model.{ext}"));
        let exists = std::fs::metadata(&path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false);
        (path, exists)
    }

    /// Idempotently create the cache directory for an entry (not the PVC —
    /// see [`Self::ensure_namespace_pvc`]).
    pub fn ensure_entry_dir(&self, namespace: &str, key: &str) -> Result<(), CacheError> {
        let dir = self.entry_dir(namespace, key);
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::Io { path: dir, source })
    }

    /// Idempotently create the namespace's cache PVC.
    pub async fn ensure_namespace_pvc(&self, client: Client, namespace: &str) -> Result<(), CacheError> {
        let pvcs: Api<PersistentVolumeClaim> = Api::namespaced(client, namespace);

        let mut requests = BTreeMap::new();
        requests.insert("storage".to_string(), Quantity(DEFAULT_CAPACITY.to_string()));

        let pvc = PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some(PVC_NAME.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec!["ReadWriteMany".to_string()]),
                resources: Some(k8s_openapi::api::core::v1::VolumeResourceRequirements {
                    requests: Some(requests),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        pvcs.patch(
            PVC_NAME,
            &PatchParams::apply("llmkube-operator"),
            &Patch::Apply(&pvc),
        )
        .await?;
        Ok(())
    }

    /// Remove one cache entry, or every entry in the namespace when `key`
    /// is `None`. Safe under concurrent readers: deletion happens via a
    /// rename to a staging name before unlink, so readers observe either
    /// the whole entry or nothing.
    pub fn clear(&self, namespace: &str, key: Option<&str>) -> Result<(), CacheError> {
        match key {
            Some(key) => {
                let dir = self.entry_dir(namespace, key);
                remove_dir_staged(&dir)
            }
            None => {
                let dir = self.namespace_root(namespace);
                remove_dir_staged(&dir)
            }
        }
    }
}

fn remove_dir_staged(dir: &Path) -> Result<(), CacheError> {
    if !dir.exists() {
        return Ok(());
    }
    let staging = dir.with_extension("removing");
    std::fs::rename(dir, &staging).map_err(|source| CacheError::Io { path: dir.to_path_buf(), source })?;
    std::fs::remove_dir_all(&staging).map_err(|source| CacheError::Io { path: staging, source })
}

/// Write `bytes` to `target` via a `.partial` staging file, renaming into
/// place only on success. On any I/O error the partial file is unlinked.
/// Satisfies the "completed file is atomic evidence" contract shared with
/// concurrent writers for the same cache key.
pub fn staged_write(target: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CacheError::Io { path: parent.to_path_buf(), source })?;
    }
    let partial = partial_path(target);
    let result = std::fs::write(&partial, bytes)
        .map_err(|source| CacheError::Io { path: partial.clone(), source })
        .and_then(|_| std::fs::rename(&partial, target).map_err(|source| CacheError::Io { path: target.to_path_buf(), source }));

    if result.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    result
}

pub fn partial_path(target: &Path) -> PathBuf {
    let mut os = target.as_os_str().to_owned();
    os.push(".partial");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_16_lowercase_hex_chars() {
        let key = cache_key("https://example.invalid/tinyllama.gguf");
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn cache_key_depends_only_on_source() {
        assert_eq!(cache_key("a"), cache_key("a"));
        assert_ne!(cache_key("a"), cache_key("b"));
    }

    #[test]
    fn resolve_reports_absent_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CacheManager::new(tmp.path());
        let (path, exists) = mgr.resolve("default", "https://example.invalid/m.gguf", "gguf");
        assert!(!exists);
        assert!(path.starts_with(tmp.path()));
    }

    #[test]
    fn staged_write_then_resolve_reports_present() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CacheManager::new(tmp.path());
        let (path, _) = mgr.resolve("default", "https://example.invalid/m.gguf", "gguf");
        staged_write(&path, b"hello").unwrap();
        assert!(!partial_path(&path).exists());
        let (_, exists) = mgr.resolve("default", "https://example.invalid/m.gguf", "gguf");
        assert!(exists);
    }

    #[test]
    fn clear_removes_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CacheManager::new(tmp.path());
        let (path, _) = mgr.resolve("default", "src", "gguf");
        staged_write(&path, b"hi").unwrap();
        let key = cache_key("src");
        mgr.clear("default", Some(&key)).unwrap();
        let (_, exists) = mgr.resolve("default", "src", "gguf");
        assert!(!exists);
    }
}
