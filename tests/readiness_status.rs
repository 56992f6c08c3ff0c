#[path = "support/mocks.rs"]
mod mocks;

use mocks::{always_ready, online, round, RecordingObserver};
use ssm_ready::control_plane::{
    ControlPlaneScript, InventoryAnswer, ScriptedControlPlane, StatusRoundScript,
};
use ssm_ready::domain::{InstanceId, InstanceStatus};
use ssm_ready::readiness::{
    ReadinessError, ReadinessOrchestrator, ReadinessPhase, ReadinessRequest, StatusPoller,
};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

fn request(ids: &[&str], timeout: u64, interval: u64) -> ReadinessRequest {
    ReadinessRequest::new(ids.iter().copied())
        .expect("valid request")
        .with_timeout(Duration::from_secs(timeout))
        .with_interval(Duration::from_secs(interval))
}

#[tokio::test(start_paused = true)]
async fn all_online_on_first_round_succeeds_without_sleeping() {
    let plane = always_ready(&["i-1", "i-2"]);
    let observer = RecordingObserver::default();
    let start = Instant::now();

    ReadinessOrchestrator::new(&plane, &plane)
        .with_observer(&observer)
        .wait(&request(&["i-1", "i-2"], 300, 10))
        .await
        .expect("instances are ready");

    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(plane.status_rounds(), 1);
    assert_eq!(
        observer.names(),
        vec![
            "wait_started",
            "all_online",
            "inventory_present",
            "inventory_present"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn missing_instance_times_out_without_inventory_checks() {
    let plane =
        ScriptedControlPlane::new(ControlPlaneScript::default().with_round(round(&["i-1"])));
    let observer = RecordingObserver::default();

    let error = ReadinessOrchestrator::new(&plane, &plane)
        .with_observer(&observer)
        .wait(&request(&["i-1", "i-2"], 30, 10))
        .await
        .expect_err("i-2 never reports online");

    match error {
        ReadinessError::StatusTimeout { timeout, rounds } => {
            assert_eq!(timeout, Duration::from_secs(30));
            assert_eq!(rounds, 3, "polls at 0s, 10s and 20s; expired at 30s");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(plane.status_rounds(), 3);
    assert!(plane.inventory_log().is_empty());
    assert_eq!(observer.names(), vec!["wait_started"]);
}

#[tokio::test(start_paused = true)]
async fn online_record_on_second_page_is_found_in_one_round() {
    let script = ControlPlaneScript::default()
        .with_round(StatusRoundScript::pages(vec![
            vec![
                InstanceStatus::online("i-1"),
                InstanceStatus::online("i-unrelated"),
            ],
            online(&["i-2"]),
        ]))
        .with_inventory("i-1", vec![InventoryAnswer::present()])
        .with_inventory("i-2", vec![InventoryAnswer::present()]);
    let plane = ScriptedControlPlane::new(script);

    ReadinessOrchestrator::new(&plane, &plane)
        .wait(&request(&["i-1", "i-2"], 30, 5))
        .await
        .expect("both pages are consumed");

    assert_eq!(plane.status_rounds(), 1);
    assert_eq!(plane.page_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn readiness_is_recomputed_every_round() {
    let requested = vec![InstanceId::from("i-1"), InstanceId::from("i-2")];
    let plane = ScriptedControlPlane::new(
        ControlPlaneScript::default()
            .with_round(round(&["i-1"]))
            .with_round(round(&["i-2"])),
    );
    let observer = RecordingObserver::default();
    let poller = StatusPoller::new(&plane, &observer, CancellationToken::new());

    let first = poller.poll_round(&requested).await.expect("round 1");
    assert!(first.is_online("i-1"));
    assert!(!first.all_online());

    let second = poller.poll_round(&requested).await.expect("round 2");
    assert!(!second.is_online("i-1"), "round 1 result must not carry over");
    assert!(second.is_online("i-2"));
    assert!(!second.all_online());
}

#[tokio::test(start_paused = true)]
async fn flapping_instance_delays_success_until_both_online_together() {
    let mut plane_script = ControlPlaneScript::default()
        .with_round(round(&["i-1"]))
        .with_round(round(&["i-2"]))
        .with_round(round(&["i-1", "i-2"]));
    for id in ["i-1", "i-2"] {
        plane_script = plane_script.with_inventory(id, vec![InventoryAnswer::present()]);
    }
    let plane = ScriptedControlPlane::new(plane_script);

    ReadinessOrchestrator::new(&plane, &plane)
        .wait(&request(&["i-1", "i-2"], 300, 10))
        .await
        .expect("ready on round 3");

    assert_eq!(plane.status_rounds(), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_fails_before_any_poll() {
    let plane = always_ready(&["i-1"]);
    let observer = RecordingObserver::default();

    let error = ReadinessOrchestrator::new(&plane, &plane)
        .with_observer(&observer)
        .wait(&request(&["i-1"], 0, 10))
        .await
        .expect_err("zero budget is already expired");

    assert!(matches!(error, ReadinessError::StatusTimeout { rounds: 0, .. }));
    assert_eq!(plane.page_calls(), 0);
    assert_eq!(observer.names(), vec!["wait_started"]);
}

#[tokio::test(start_paused = true)]
async fn interval_longer_than_timeout_still_polls_once() {
    let plane = ScriptedControlPlane::new(ControlPlaneScript::default().with_round(round(&[])));

    let error = ReadinessOrchestrator::new(&plane, &plane)
        .wait(&request(&["i-1"], 5, 10))
        .await
        .expect_err("never online");

    assert!(matches!(error, ReadinessError::StatusTimeout { rounds: 1, .. }));
    assert_eq!(plane.status_rounds(), 1);
}

#[tokio::test(start_paused = true)]
async fn listing_failure_aborts_without_retry() {
    let plane = ScriptedControlPlane::new(
        ControlPlaneScript::default()
            .with_round(round(&["i-1"]))
            .with_round(StatusRoundScript::failing("ExpiredTokenException")),
    );

    let error = ReadinessOrchestrator::new(&plane, &plane)
        .wait(&request(&["i-1", "i-2"], 300, 10))
        .await
        .expect_err("second round fails");

    assert!(matches!(error, ReadinessError::StatusApi { .. }));
    assert_eq!(error.phase(), ReadinessPhase::Status);
    assert!(error.to_string().contains("ExpiredTokenException"));
    assert_eq!(plane.status_rounds(), 2, "failure is not retried");
    assert!(plane.inventory_log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_status_wait() {
    let plane = ScriptedControlPlane::new(ControlPlaneScript::default().with_round(round(&[])));
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let error = ReadinessOrchestrator::new(&plane, &plane)
        .with_shutdown(shutdown)
        .wait(&request(&["i-1"], 300, 10))
        .await
        .expect_err("cancelled");

    assert!(matches!(
        error,
        ReadinessError::Cancelled {
            phase: ReadinessPhase::Status,
            ..
        }
    ));
    assert!(start.elapsed() < Duration::from_secs(20));
    assert_eq!(plane.status_rounds(), 2);
}
