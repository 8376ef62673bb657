//! Health check support for the controller manager and host agent.
//!
//! Provides liveness, readiness, and full health report capabilities for
//! orchestrator integration (Kubernetes probes, systemd).

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::shutdown::ShutdownState;

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Detailed health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub state: HealthState,
    pub ready: bool,
    pub accepting_requests: bool,
    pub active_reconciles: usize,
    pub uptime_secs: u64,
}

/// Health check configuration.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Reconciles in flight at or above this are reported as degraded —
    /// a signal the work queue is backing up, not a hard limit.
    pub max_active_reconciles: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_active_reconciles: 1000,
        }
    }
}

/// Aggregates health information from the runtime's shared state.
pub struct HealthChecker {
    config: HealthConfig,
    start_time: Instant,
}

impl HealthChecker {
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            start_time: Instant::now(),
        }
    }

    /// Check liveness: process is responsive.
    pub fn is_alive(&self) -> bool {
        true
    }

    /// Check readiness: accepting new reconcile work.
    pub fn is_ready(&self, shutdown_state: ShutdownState, active_reconciles: usize) -> bool {
        shutdown_state == ShutdownState::Running && active_reconciles < self.config.max_active_reconciles
    }

    /// Generate a full health report.
    pub fn report(&self, shutdown_state: ShutdownState, active_reconciles: usize) -> HealthReport {
        let accepting = shutdown_state == ShutdownState::Running;
        let ready = self.is_ready(shutdown_state, active_reconciles);
        let state = self.compute_state(shutdown_state, active_reconciles);

        HealthReport {
            state,
            ready,
            accepting_requests: accepting,
            active_reconciles,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    fn compute_state(&self, shutdown_state: ShutdownState, active_reconciles: usize) -> HealthState {
        if shutdown_state != ShutdownState::Running {
            return HealthState::Unhealthy;
        }
        if active_reconciles >= self.config.max_active_reconciles {
            return HealthState::Degraded;
        }
        HealthState::Healthy
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}
