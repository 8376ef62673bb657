//! Shared state handed to both the `Model` and `InferenceService` controllers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use kube::Client;

use crate::cache::CacheManager;
use crate::telemetry::Metrics;

/// Context threaded through every `reconcile` call by `kube::runtime::Controller`.
#[derive(Clone)]
pub struct Context {
    pub client: Client,
    pub cache: Arc<CacheManager>,
    pub metrics: Arc<Metrics>,
    active_reconciles: Arc<AtomicUsize>,
}

impl Context {
    pub fn new(client: Client, cache: Arc<CacheManager>, metrics: Arc<Metrics>) -> Self {
        Self {
            client,
            cache,
            metrics,
            active_reconciles: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn active_reconciles(&self) -> usize {
        self.active_reconciles.load(Ordering::Relaxed)
    }

    /// RAII guard incrementing the in-flight count for the lifetime of one reconcile.
    pub fn track(&self) -> ActiveGuard {
        self.active_reconciles.fetch_add(1, Ordering::Relaxed);
        ActiveGuard { counter: self.active_reconciles.clone() }
    }
}

pub struct ActiveGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}
