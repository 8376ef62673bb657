//! Wires the `Model` and `InferenceService` controllers and runs them to
//! completion (or until a shutdown signal arrives).

mod context;
mod error;
pub mod inference_service;
pub mod model;

pub use context::Context;
pub use error::ReconcileError;

use std::sync::Arc;

use futures::StreamExt;
use kube::api::{Api, ListParams};
use kube::runtime::{watcher::Config, Controller};
use kube::Client;
use tracing::{error, info, trace};

use crate::api::{InferenceService, Model};
use crate::cache::CacheManager;
use crate::telemetry::Metrics;

/// Start both controllers and run them until `kube::runtime::Controller`'s
/// own shutdown-on-signal future resolves. Exits the process with code 1
/// if either CRD is not yet installed in the cluster.
pub async fn run(client: Client, cache: Arc<CacheManager>, metrics: Arc<Metrics>) {
    let models: Api<Model> = Api::all(client.clone());
    let isvcs: Api<InferenceService> = Api::all(client.clone());

    if let Err(e) = models.list(&ListParams::default().limit(1)).await {
        error!(kind = "Model", error = %e, "CRD is not queryable; is it installed?");
        std::process::exit(1);
    }
    if let Err(e) = isvcs.list(&ListParams::default().limit(1)).await {
        error!(kind = "InferenceService", error = %e, "CRD is not queryable; is it installed?");
        std::process::exit(1);
    }

    let ctx = Arc::new(Context::new(client, cache, metrics));

    trace!("starting controllers");

    let model_controller = Controller::new(models, Config::default())
        .shutdown_on_signal()
        .run(model::reconcile, model::error_policy, ctx.clone())
        .filter_map(|x| async move { x.ok() })
        .for_each(|_| futures::future::ready(()));

    let isvc_controller = Controller::new(isvcs, Config::default())
        .shutdown_on_signal()
        .run(inference_service::reconcile, inference_service::error_policy, ctx)
        .filter_map(|x| async move { x.ok() })
        .for_each(|_| futures::future::ready(()));

    info!("controllers running");
    tokio::join!(model_controller, isvc_controller);
    info!("controllers stopped");
}
