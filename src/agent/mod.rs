//! Host agent: runs on a node with an accelerator the cluster cannot
//! schedule (Metal), supervising `llama-server` as a native child process
//! per Metal-accelerated `InferenceService` and publishing its endpoint.

mod error;
mod endpoint;
mod supervisor;

pub use error::AgentError;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::api::{Accelerator, InferenceService, Model};
use crate::capability::Capabilities;
use crate::dns::sanitize;

const POLL_INTERVAL: Duration = Duration::from_secs(10);
const INFERENCE_BINARY: &str = "llama-server";

pub struct AgentConfig {
    pub namespace: String,
    pub model_store: PathBuf,
    pub host_ip: Option<String>,
}

struct RunningWorker {
    stop: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

/// Entry point for the `llmkube-agent` binary: probe, then loop until the
/// shutdown signal fires, converging supervised workers against the set
/// of Metal-targeted `InferenceService` declarations.
pub async fn run(client: Client, config: AgentConfig) -> Result<(), AgentError> {
    let capabilities = Capabilities::detect();
    if !capabilities.supports(Accelerator::Metal) {
        return Err(AgentError::MetalUnavailable);
    }
    std::fs::create_dir_all(&config.model_store)?;

    let host_ip = config.host_ip.clone().unwrap_or_else(endpoint::detect_host_ip);
    info!(host_ip, model_store = %config.model_store.display(), "host agent starting");

    let mut workers: HashMap<String, RunningWorker> = HashMap::new();
    let mut shutdown = shutdown_signal();

    loop {
        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {
                if let Err(e) = converge(&client, &config, &host_ip, &mut workers).await {
                    error!(error = %e, "reconcile pass failed, retaining prior workers");
                }
            }
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping supervised workers");
                break;
            }
        }
    }

    for (name, worker) in workers {
        let _ = worker.stop.send(true);
        if worker.handle.await.is_err() {
            warn!(isvc = %name, "supervised worker task panicked during shutdown");
        }
    }
    Ok(())
}

fn shutdown_signal() -> tokio::sync::oneshot::Receiver<()> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = tx.send(());
    });
    rx
}

async fn converge(
    client: &Client,
    config: &AgentConfig,
    host_ip: &str,
    workers: &mut HashMap<String, RunningWorker>,
) -> Result<(), AgentError> {
    let isvcs: Api<InferenceService> = Api::namespaced(client.clone(), &config.namespace);
    let models: Api<Model> = Api::namespaced(client.clone(), &config.namespace);

    let list = isvcs.list(&ListParams::default()).await?;
    let mut desired = HashMap::new();

    for isvc in list.items {
        let name = isvc.name_any();
        let model = match models.get_opt(&isvc.spec.model_ref).await? {
            Some(m) => m,
            None => continue,
        };
        if model.spec.hardware.accelerator != Accelerator::Metal || !model.is_ready() {
            continue;
        }
        desired.insert(name, (isvc, model));
    }

    for name in workers.keys().cloned().collect::<Vec<_>>() {
        if !desired.contains_key(&name) {
            if let Some(worker) = workers.remove(&name) {
                info!(isvc = %name, "stopping worker no longer declared for this host");
                let _ = worker.stop.send(true);
                let _ = worker.handle.await;
                let service_name = sanitize(&name);
                let _ = endpoint::retract(client.clone(), &config.namespace, &service_name).await;
            }
        }
    }

    for (name, (isvc, model)) in desired {
        if workers.contains_key(&name) {
            continue;
        }
        info!(isvc = %name, "starting supervised inference process");
        let worker = spawn_worker(client.clone(), config, host_ip, &isvc, &model);
        workers.insert(name, worker);
    }

    Ok(())
}

fn spawn_worker(client: Client, config: &AgentConfig, host_ip: &str, isvc: &InferenceService, model: &Model) -> RunningWorker {
    let (stop_tx, stop_rx) = watch::channel(false);
    let service_name = sanitize(&isvc.name_any());
    let namespace = config.namespace.clone();
    let model_store = config.model_store.clone();
    let source = model.spec.source.clone();
    let port = isvc.spec.endpoint.port;
    let declared_layers = model.spec.hardware.gpu.as_ref().map(|g| g.layers).unwrap_or(-1);
    let host_ip = host_ip.to_string();

    let handle = tokio::spawn(async move {
        let dest = model_store.join(format!("{service_name}.gguf"));
        if let Err(e) = crate::fetch::fetch(&source, &dest).await {
            error!(error = %e, isvc = %service_name, "model fetch failed, worker will not start");
            return;
        }

        let publish_client = client.clone();
        let publish_namespace = namespace.clone();
        let publish_name = service_name.clone();
        let publish_host_ip = host_ip.clone();
        tokio::spawn(async move {
            if let Err(e) = endpoint::publish(publish_client, &publish_namespace, &publish_name, &publish_host_ip, port).await {
                error!(error = %e, "failed to publish host agent endpoint");
            }
        });

        let sup = supervisor::Supervisor::new(INFERENCE_BINARY);
        sup.run(dest.to_string_lossy().as_ref(), port, declared_layers, stop_rx).await;

        let _ = endpoint::retract(client, &namespace, &service_name).await;
    });

    RunningWorker { stop: stop_tx, handle }
}
