//! Integration tests for graceful shutdown coordination.

use llmkube_operator::shutdown::{ShutdownCoordinator, ShutdownResult, ShutdownState};
use std::time::Duration;

#[tokio::test]
async fn initial_state_is_running() {
    let coordinator = ShutdownCoordinator::new();
    assert_eq!(coordinator.state().await, ShutdownState::Running);
    assert!(coordinator.is_accepting());
}

#[tokio::test]
async fn track_increments_and_drop_decrements_in_flight() {
    let coordinator = ShutdownCoordinator::new();
    let guard = coordinator.track().unwrap();
    assert_eq!(coordinator.in_flight_count(), 1);
    drop(guard);
    assert_eq!(coordinator.in_flight_count(), 0);
}

#[tokio::test]
async fn initiate_completes_immediately_with_no_in_flight_work() {
    let coordinator = ShutdownCoordinator::new();
    let result = coordinator.initiate(Duration::from_secs(1)).await;
    assert_eq!(result, ShutdownResult::Complete);
    assert_eq!(coordinator.state().await, ShutdownState::Stopped);
}

#[tokio::test]
async fn initiate_times_out_if_work_never_drains() {
    let coordinator = ShutdownCoordinator::new();
    let guard = coordinator.track().unwrap();
    let result = coordinator.initiate(Duration::from_millis(50)).await;
    assert_eq!(result, ShutdownResult::Timeout { remaining: 1 });
    drop(guard);
}

#[tokio::test]
async fn track_refuses_new_work_once_draining_starts() {
    let coordinator = std::sync::Arc::new(ShutdownCoordinator::new());
    let held = coordinator.track().unwrap();

    let draining = coordinator.clone();
    let handle = tokio::spawn(async move { draining.initiate(Duration::from_secs(2)).await });

    // Give the draining transition a chance to land before probing.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(coordinator.track().is_none());

    drop(held);
    let result = handle.await.unwrap();
    assert_eq!(result, ShutdownResult::Complete);
}
