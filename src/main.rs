//! llmkube-operator entry point: the cluster-level controller manager.
//!
//! Bootstraps logging, connects to the Kubernetes API, ensures the metrics
//! server is listening, and runs the `Model`/`InferenceService` controllers
//! until a shutdown signal arrives.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use llmkube_operator::cache::CacheManager;
use llmkube_operator::config;
use llmkube_operator::telemetry::{init_logging, LogConfig, Metrics};

/// Cluster control plane for llmkube `Model` and `InferenceService` objects.
#[derive(Debug, Parser)]
#[command(name = "llmkube-operator", version)]
struct Cli {
    /// Path to a kubeconfig file. Defaults to in-cluster config, falling
    /// back to `~/.kube/config`.
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<String>,

    /// Namespace to watch. Unset watches every namespace.
    #[arg(long, env = "LLMKUBE_NAMESPACE")]
    namespace: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let env_config = config::load();

    let log_config = LogConfig {
        format: env_config.log_format,
        level: env_config.log_level.clone(),
        output_path: None,
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    info!(cache_root = %env_config.cache_root.display(), "llmkube-operator starting");

    let client = match build_client(cli.kubeconfig.as_deref()).await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to build Kubernetes client");
            std::process::exit(1);
        }
    };

    let cache = Arc::new(CacheManager::new(env_config.cache_root.clone()));
    let metrics = Arc::new(Metrics::new());

    serve_metrics(env_config.metrics_port, metrics.clone());

    let namespace = cli.namespace.or(env_config.namespace);
    match namespace {
        Some(ns) => info!(namespace = %ns, "namespace scoping requested; controllers still watch cluster-wide pending per-namespace watcher support"),
        None => info!("watching all namespaces"),
    }

    llmkube_operator::reconcile::run(client, cache, metrics).await;
    info!("llmkube-operator stopped");
}

async fn build_client(kubeconfig: Option<&str>) -> Result<kube::Client, kube::Error> {
    if let Some(path) = kubeconfig {
        std::env::set_var("KUBECONFIG", path);
    }
    kube::Client::try_default().await
}

/// Serve `/metrics` on a background task. Kept deliberately minimal: a raw
/// TCP text responder, not a web framework, since this is the only HTTP
/// surface the controller manager exposes.
fn serve_metrics(port: u16, metrics: Arc<Metrics>) {
    tokio::spawn(async move {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = match TcpListener::bind(("0.0.0.0", port)).await {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, port, "failed to bind metrics listener");
                return;
            }
        };

        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => continue,
            };
            let metrics = metrics.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let body = metrics.encode_text();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });
}
