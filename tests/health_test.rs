//! Integration tests for health reporting against the shutdown state machine.

use llmkube_operator::health::{HealthChecker, HealthConfig, HealthState};
use llmkube_operator::shutdown::ShutdownCoordinator;

#[tokio::test]
async fn reports_healthy_and_ready_before_any_shutdown() {
    let checker = HealthChecker::new(HealthConfig::default());
    let coordinator = ShutdownCoordinator::new();

    let report = checker.report(coordinator.state().await, 0);
    assert_eq!(report.state, HealthState::Healthy);
    assert!(report.ready);
    assert!(report.accepting_requests);
    assert!(checker.is_alive());
}

#[tokio::test]
async fn reports_unhealthy_once_coordinator_is_draining() {
    let checker = HealthChecker::new(HealthConfig::default());
    let coordinator = std::sync::Arc::new(ShutdownCoordinator::new());
    let guard = coordinator.track().unwrap();

    let draining = coordinator.clone();
    let handle =
        tokio::spawn(async move { draining.initiate(std::time::Duration::from_millis(200)).await });

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let report = checker.report(coordinator.state().await, 0);
    assert_eq!(report.state, HealthState::Unhealthy);
    assert!(!report.ready);
    assert!(!report.accepting_requests);

    drop(guard);
    handle.await.unwrap();
}

#[tokio::test]
async fn active_reconciles_at_threshold_degrades_but_stays_alive() {
    let checker = HealthChecker::new(HealthConfig { max_active_reconciles: 4 });
    let coordinator = ShutdownCoordinator::new();

    let report = checker.report(coordinator.state().await, 4);
    assert_eq!(report.state, HealthState::Degraded);
    assert!(!report.ready);
    assert!(checker.is_alive());
}
