//! Reconciler for the `InferenceService` resource: resolve the referenced
//! `Model`, then ensure a Service and (containerized path) Deployment.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use tracing::{info, instrument, warn};

use crate::api::{Accelerator, InferenceService, InferenceServicePhase, InferenceServiceStatus, Model};
use crate::telemetry::{ReconcileSpan, SpanExt};
use crate::workload;

use super::context::Context;
use super::error::ReconcileError;

const CONTROLLER: &str = "inference_service";
const REQUEUE_WAITING: Duration = Duration::from_secs(15);
const REQUEUE_OK: Duration = Duration::from_secs(30);
const REQUEUE_FAILED: Duration = Duration::from_secs(5 * 60);

#[instrument(skip(isvc, ctx), fields(status = tracing::field::Empty))]
pub async fn reconcile(isvc: Arc<InferenceService>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let span = ReconcileSpan::new(&format!("{}/{}", isvc.namespace().unwrap_or_default(), isvc.name_any()), CONTROLLER);
    let _enter = span.enter();
    let _guard = ctx.track();
    let started = Instant::now();

    let result = run(&isvc, &ctx).await;
    span.record_result(&result);
    ctx.metrics.record_reconcile(
        CONTROLLER,
        if result.is_ok() { "success" } else { "failure" },
        started.elapsed().as_secs_f64(),
    );
    result
}

async fn run(isvc: &InferenceService, ctx: &Context) -> Result<Action, ReconcileError> {
    let namespace = isvc.namespace().ok_or(ReconcileError::NoNamespace)?;
    let name = isvc.name_any();
    let api: Api<InferenceService> = Api::namespaced(ctx.client.clone(), &namespace);
    let models: Api<Model> = Api::namespaced(ctx.client.clone(), &namespace);

    let model = match models.get_opt(&isvc.spec.model_ref).await? {
        Some(m) => m,
        None => {
            publish_failed(&api, &name, isvc, &format!("Model {:?} not found", isvc.spec.model_ref)).await?;
            return Err(ReconcileError::ModelNotFound(isvc.spec.model_ref.clone()));
        }
    };

    if !model.is_ready() {
        publish_pending(&api, &name, isvc, false).await?;
        return Ok(Action::requeue(REQUEUE_WAITING));
    }

    let owner = isvc.controller_owner_ref(&()).expect("namespaced object always yields an owner ref");
    let model_cached = matches!(model.status.as_ref().map(|s| s.phase), Some(crate::api::ModelPhase::Cached));
    let spec = workload::build(&model, isvc, owner, model_cached)?;

    let services: Api<k8s_openapi::api::core::v1::Service> = Api::namespaced(ctx.client.clone(), &namespace);
    services
        .patch(
            spec.service.metadata.name.as_deref().unwrap_or(&spec.app_label),
            &PatchParams::apply("llmkube-operator"),
            &Patch::Apply(&spec.service),
        )
        .await?;

    if model.spec.hardware.accelerator == Accelerator::Metal {
        let endpoints: Api<k8s_openapi::api::core::v1::Endpoints> = Api::namespaced(ctx.client.clone(), &namespace);
        return reconcile_metal(&api, &endpoints, &name, isvc, &spec.app_label).await;
    }

    let deployment = spec.deployment.expect("containerized path always produces a deployment");
    let deployments: Api<k8s_openapi::api::apps::v1::Deployment> = Api::namespaced(ctx.client.clone(), &namespace);
    deployments
        .patch(
            deployment.metadata.name.as_deref().unwrap_or(&spec.app_label),
            &PatchParams::apply("llmkube-operator"),
            &Patch::Apply(&deployment),
        )
        .await?;

    let ready_replicas = deployments
        .get_opt(deployment.metadata.name.as_deref().unwrap_or(&spec.app_label))
        .await?
        .and_then(|d| d.status)
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0);

    publish_ready(&api, &name, isvc, ready_replicas).await?;
    Ok(Action::requeue(REQUEUE_OK))
}

/// Metal path: the host agent, not this reconciler, owns pod lifecycle. We
/// only report readiness based on whatever `Endpoints` object the agent has
/// already published under the service name, logging the initial deferral
/// exactly once per transition into it.
async fn reconcile_metal(
    api: &Api<InferenceService>,
    endpoints: &Api<k8s_openapi::api::core::v1::Endpoints>,
    name: &str,
    isvc: &InferenceService,
    service_name: &str,
) -> Result<Action, ReconcileError> {
    let previous_phase = isvc.status.as_ref().map(|s| s.phase);

    let live_addresses = endpoints
        .get_opt(service_name)
        .await?
        .and_then(|e| e.subsets)
        .unwrap_or_default()
        .into_iter()
        .flat_map(|s| s.addresses.unwrap_or_default())
        .count();

    let ready = live_addresses > 0;
    let new_phase = if ready { InferenceServicePhase::Ready } else { InferenceServicePhase::Creating };
    if previous_phase != Some(new_phase) {
        info!(phase = ?new_phase, "metal accelerator requested, deferring pod lifecycle to host agent");
    }

    let mut status = isvc.status.clone().unwrap_or_default();
    status.model_ready = true;
    status.desired_replicas = isvc.spec.replicas;
    status.ready_replicas = if ready { isvc.spec.replicas } else { 0 };
    status.phase = new_phase;

    let previous = crate::api::condition::find(&status.conditions, "Ready").cloned();
    let (reason, message) = if ready {
        ("HostAgentEndpointLive", "host agent published a live endpoint")
    } else {
        ("AwaitingHostAgent", "waiting for host agent to register endpoint")
    };
    let condition = crate::api::condition::build("Ready", ready, reason, message, previous.as_ref());
    crate::api::condition::upsert(&mut status.conditions, condition);
    patch_status(api, name, status).await?;
    Ok(Action::requeue(REQUEUE_WAITING))
}

async fn publish_pending(api: &Api<InferenceService>, name: &str, isvc: &InferenceService, model_ready: bool) -> Result<(), ReconcileError> {
    let mut status = isvc.status.clone().unwrap_or_default();
    status.phase = InferenceServicePhase::Pending;
    status.model_ready = model_ready;
    status.desired_replicas = isvc.spec.replicas;
    let previous = crate::api::condition::find(&status.conditions, "Ready").cloned();
    let condition = crate::api::condition::build("Ready", false, "WaitingForModel", "referenced model is not yet ready", previous.as_ref());
    crate::api::condition::upsert(&mut status.conditions, condition);
    patch_status(api, name, status).await
}

async fn publish_ready(api: &Api<InferenceService>, name: &str, isvc: &InferenceService, ready_replicas: i32) -> Result<(), ReconcileError> {
    let mut status = isvc.status.clone().unwrap_or_default();
    status.phase = if ready_replicas >= isvc.spec.replicas && isvc.spec.replicas > 0 {
        InferenceServicePhase::Ready
    } else {
        InferenceServicePhase::Creating
    };
    status.model_ready = true;
    status.ready_replicas = ready_replicas;
    status.desired_replicas = isvc.spec.replicas;
    status.endpoint_url = Some(format!(
        "http://{}.{}.svc.cluster.local:{}{}",
        crate::dns::sanitize(&isvc.name_any()),
        isvc.namespace().unwrap_or_default(),
        isvc.spec.endpoint.port,
        isvc.spec.endpoint.path,
    ));
    let previous = crate::api::condition::find(&status.conditions, "Ready").cloned();
    let ready = status.phase == InferenceServicePhase::Ready;
    let condition = crate::api::condition::build("Ready", ready, if ready { "DeploymentReady" } else { "DeploymentScaling" }, "deployment reconciled", previous.as_ref());
    crate::api::condition::upsert(&mut status.conditions, condition);
    patch_status(api, name, status).await
}

async fn publish_failed(api: &Api<InferenceService>, name: &str, isvc: &InferenceService, error: &str) -> Result<(), ReconcileError> {
    let mut status = isvc.status.clone().unwrap_or_default();
    status.phase = InferenceServicePhase::Failed;
    let previous = crate::api::condition::find(&status.conditions, "Ready").cloned();
    let condition = crate::api::condition::build("Ready", false, "ModelNotFound", error, previous.as_ref());
    crate::api::condition::upsert(&mut status.conditions, condition);
    patch_status(api, name, status).await
}

async fn patch_status(api: &Api<InferenceService>, name: &str, status: InferenceServiceStatus) -> Result<(), ReconcileError> {
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(patch)).await?;
    Ok(())
}

pub fn error_policy(_isvc: Arc<InferenceService>, error: &ReconcileError, _ctx: Arc<Context>) -> Action {
    warn!(error = %error, "inference service reconcile failed");
    Action::requeue(REQUEUE_FAILED)
}
