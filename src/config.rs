//! Runtime configuration loading from environment variables.
//!
//! All configuration values are loaded from `LLMKUBE_*` environment
//! variables with sensible defaults. Invalid values fall back to defaults
//! without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `LLMKUBE_NAMESPACE` | (all namespaces) | Namespace to watch; empty watches cluster-wide |
//! | `LLMKUBE_CACHE_ROOT` | `/var/lib/llmkube/cache` | On-disk cache root |
//! | `LLMKUBE_METRICS_PORT` | 9090 | Port serving `/metrics` and `/healthz` |
//! | `LLMKUBE_SHUTDOWN_TIMEOUT` | 30 | Graceful shutdown timeout (secs) |
//! | `LLMKUBE_RECONCILE_CONCURRENCY` | 4 | Max concurrent reconciles per controller |
//! | `LLMKUBE_LOG_LEVEL` | info | `tracing_subscriber::EnvFilter` directive |
//! | `LLMKUBE_LOG_FORMAT` | json | `json` or `pretty` |

use std::path::PathBuf;
use std::time::Duration;

use crate::telemetry::LogFormat;

/// Effective runtime configuration summary.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub namespace: Option<String>,
    pub cache_root: PathBuf,
    pub metrics_port: u16,
    pub shutdown_timeout_secs: u64,
    pub reconcile_concurrency: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub namespace: Option<String>,
    pub cache_root: PathBuf,
    pub metrics_port: u16,
    pub shutdown_timeout: Duration,
    pub reconcile_concurrency: usize,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u32` env var, returning `default` on missing or invalid.
#[allow(dead_code)]
fn parse_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u32>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_log_format(key: &str, default: LogFormat) -> LogFormat {
    match std::env::var(key).as_deref() {
        Ok("json") => LogFormat::Json,
        Ok("pretty") => LogFormat::Pretty,
        _ => default,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let namespace = std::env::var("LLMKUBE_NAMESPACE").ok().filter(|s| !s.is_empty());
    let cache_root = std::env::var("LLMKUBE_CACHE_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/llmkube/cache"));

    let metrics_port = parse_usize("LLMKUBE_METRICS_PORT", 9090).clamp(1, 65535) as u16;
    let shutdown_secs = parse_u64("LLMKUBE_SHUTDOWN_TIMEOUT", 30).max(1);
    let reconcile_concurrency = parse_usize("LLMKUBE_RECONCILE_CONCURRENCY", 4).max(1);
    let log_level = std::env::var("LLMKUBE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = parse_log_format("LLMKUBE_LOG_FORMAT", LogFormat::Json);

    EnvConfig {
        namespace,
        cache_root,
        metrics_port,
        shutdown_timeout: Duration::from_secs(shutdown_secs),
        reconcile_concurrency,
        log_level,
        log_format,
    }
}

impl EnvConfig {
    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            namespace: self.namespace.clone(),
            cache_root: self.cache_root.clone(),
            metrics_port: self.metrics_port,
            shutdown_timeout_secs: self.shutdown_timeout.as_secs(),
            reconcile_concurrency: self.reconcile_concurrency,
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "LLMKUBE_NAMESPACE",
        "LLMKUBE_CACHE_ROOT",
        "LLMKUBE_METRICS_PORT",
        "LLMKUBE_SHUTDOWN_TIMEOUT",
        "LLMKUBE_RECONCILE_CONCURRENCY",
        "LLMKUBE_LOG_LEVEL",
        "LLMKUBE_LOG_FORMAT",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn defaults_are_sensible() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        assert_eq!(cfg.namespace, None);
        assert_eq!(cfg.cache_root, PathBuf::from("/var/lib/llmkube/cache"));
        assert_eq!(cfg.metrics_port, 9090);
        assert_eq!(cfg.shutdown_timeout.as_secs(), 30);
        assert_eq!(cfg.reconcile_concurrency, 4);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("LLMKUBE_NAMESPACE", "llmkube-system");
        std::env::set_var("LLMKUBE_METRICS_PORT", "9999");
        std::env::set_var("LLMKUBE_SHUTDOWN_TIMEOUT", "60");
        std::env::set_var("LLMKUBE_LOG_FORMAT", "pretty");
        let cfg = load();
        assert_eq!(cfg.namespace.as_deref(), Some("llmkube-system"));
        assert_eq!(cfg.metrics_port, 9999);
        assert_eq!(cfg.shutdown_timeout.as_secs(), 60);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        clear_env_vars();
    }

    #[test]
    fn invalid_env_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("LLMKUBE_METRICS_PORT", "not_a_number");
        std::env::set_var("LLMKUBE_SHUTDOWN_TIMEOUT", "abc");
        let cfg = load();
        assert_eq!(cfg.metrics_port, 9090);
        assert_eq!(cfg.shutdown_timeout.as_secs(), 30);
        clear_env_vars();
    }

    #[test]
    fn empty_namespace_means_cluster_wide() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("LLMKUBE_NAMESPACE", "");
        let cfg = load();
        assert_eq!(cfg.namespace, None);
        clear_env_vars();
    }

    #[test]
    fn effective_config_contains_all_fields() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        let eff = cfg.effective_config();
        assert!(eff.metrics_port > 0);
        assert!(eff.shutdown_timeout_secs > 0);
        assert!(eff.reconcile_concurrency > 0);
        assert!(!eff.log_level.is_empty());
    }
}
