//! Reconciler for the `Model` resource: resolve a declared source to a
//! cached local file, publishing phase and size/metadata along the way.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{info, instrument, warn};

use crate::api::{GgufMetadataStatus, Model, ModelPhase, ModelStatus};
use crate::gguf::GgufFile;
use crate::telemetry::{ReconcileSpan, SpanExt};

use super::context::Context;
use super::error::ReconcileError;

const CONTROLLER: &str = "model";
const REQUEUE_OK: Duration = Duration::from_secs(30);
const REQUEUE_FAILED: Duration = Duration::from_secs(5 * 60);

#[instrument(skip(model, ctx), fields(status = tracing::field::Empty))]
pub async fn reconcile(model: Arc<Model>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let span = ReconcileSpan::new(&format!("{}/{}", model.namespace().unwrap_or_default(), model.name_any()), CONTROLLER);
    let _enter = span.enter();
    let _guard = ctx.track();
    let started = Instant::now();

    let result = run(&model, &ctx).await;
    span.record_result(&result);
    ctx.metrics.record_reconcile(
        CONTROLLER,
        if result.is_ok() { "success" } else { "failure" },
        started.elapsed().as_secs_f64(),
    );
    result
}

async fn run(model: &Model, ctx: &Context) -> Result<Action, ReconcileError> {
    let namespace = model.namespace().ok_or(ReconcileError::NoNamespace)?;
    let name = model.name_any();
    let api: Api<Model> = Api::namespaced(ctx.client.clone(), &namespace);

    ctx.cache.ensure_namespace_pvc(ctx.client.clone(), &namespace).await?;

    let key = crate::cache::cache_key(&model.spec.source);
    let (path, exists) = ctx.cache.resolve(&namespace, &model.spec.source, "gguf");
    ctx.metrics.record_cache_lookup(exists);

    let local = crate::fetch::is_local(&model.spec.source);

    if exists {
        return publish_ready(&api, &name, model, &path, &key, ModelPhase::Cached, "ModelCached").await;
    }

    ctx.cache.ensure_entry_dir(&namespace, &key)?;

    let (progressing_phase, progressing_reason, progressing_message) = if local {
        (ModelPhase::Copying, "CopyStarted", "copying model artifact")
    } else {
        (ModelPhase::Downloading, "DownloadStarted", "downloading model artifact")
    };
    publish_phase(&api, &name, model, progressing_phase, progressing_reason, progressing_message).await?;

    match crate::fetch::fetch(&model.spec.source, &path).await {
        Ok(_) => publish_ready(&api, &name, model, &path, &key, ModelPhase::Ready, "ModelReady").await,
        Err(e) => {
            warn!(error = %e, "model fetch failed");
            let reason = if local { "CopyFailed" } else { "DownloadFailed" };
            publish_failed(&api, &name, model, reason, &e.to_string()).await?;
            Ok(Action::requeue(REQUEUE_FAILED))
        }
    }
}

async fn publish_ready(
    api: &Api<Model>,
    name: &str,
    model: &Model,
    path: &Path,
    key: &str,
    phase: ModelPhase,
    reason: &str,
) -> Result<Action, ReconcileError> {
    let metadata = parse_gguf_best_effort(path);
    let size = std::fs::metadata(path).ok().map(|m| human_size(m.len()));

    let mut status = model.status.clone().unwrap_or_default();
    status.phase = phase;
    status.path = Some(path.display().to_string());
    status.size = size;
    status.cache_key = Some(key.to_string());
    status.accelerator_ready = Some(true);
    status.metadata = metadata;

    let previous = crate::api::condition::find(&status.conditions, "Available").cloned();
    let condition = crate::api::condition::build("Available", true, reason, "model is ready to serve", previous.as_ref());
    crate::api::condition::upsert(&mut status.conditions, condition);

    patch_status(api, name, status).await?;
    info!(phase = ?phase, "model ready");
    Ok(Action::requeue(REQUEUE_OK))
}

async fn publish_phase(
    api: &Api<Model>,
    name: &str,
    model: &Model,
    phase: ModelPhase,
    reason: &str,
    message: &str,
) -> Result<(), ReconcileError> {
    let mut status = model.status.clone().unwrap_or_default();
    status.phase = phase;
    let previous = crate::api::condition::find(&status.conditions, "Available").cloned();
    let condition = crate::api::condition::build("Available", false, reason, message, previous.as_ref());
    crate::api::condition::upsert(&mut status.conditions, condition);
    patch_status(api, name, status).await
}

async fn publish_failed(api: &Api<Model>, name: &str, model: &Model, reason: &str, error: &str) -> Result<(), ReconcileError> {
    let mut status = model.status.clone().unwrap_or_default();
    status.phase = ModelPhase::Failed;
    let previous = crate::api::condition::find(&status.conditions, "Available").cloned();
    let condition = crate::api::condition::build("Available", false, reason, error, previous.as_ref());
    crate::api::condition::upsert(&mut status.conditions, condition);
    patch_status(api, name, status).await
}

async fn patch_status(api: &Api<Model>, name: &str, status: ModelStatus) -> Result<(), ReconcileError> {
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(patch)).await?;
    Ok(())
}

fn parse_gguf_best_effort(path: &Path) -> Option<GgufMetadataStatus> {
    match GgufFile::parse_path(path) {
        Ok(file) => Some(GgufMetadataStatus {
            architecture: file.architecture().map(str::to_string),
            name: file.name().map(str::to_string),
            quantization: Some(file.quantization().to_string()),
            context_length: file.context_length(),
            embedding_length: file.embedding_length(),
            block_count: file.block_count(),
            head_count: file.head_count(),
            tensor_count: Some(file.tensor_count()),
            file_version: Some(file.header.version),
        }),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "gguf metadata parse failed, continuing without it");
            None
        }
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

pub fn error_policy(_model: Arc<Model>, error: &ReconcileError, _ctx: Arc<Context>) -> Action {
    warn!(error = %error, "model reconcile failed");
    Action::requeue(REQUEUE_FAILED)
}
