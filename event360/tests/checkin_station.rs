//! End-to-end tests of the door check-in station through a real store.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use event360::checkin::{CheckinAction, CheckinEnvironment, CheckinReducer, CheckinState};
use event360::error::ScanError;
use event360::scanner::{MockScanner, ScannerCall};
use event360::types::ScannedTicket;
use event360_runtime::Store;
use event360_testing::wait_for_state;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn station(
    scanner: MockScanner,
) -> (
    Store<CheckinState, CheckinAction, CheckinEnvironment, CheckinReducer>,
    Arc<MockScanner>,
) {
    let scanner = Arc::new(scanner);
    let env = CheckinEnvironment::new(scanner.clone());
    let store = Store::new(CheckinState::default(), CheckinReducer::new(), env);
    (store, scanner)
}

#[tokio::test]
async fn a_scanner_is_probed_then_a_ticket_is_captured() {
    let (store, scanner) = station(
        MockScanner::new()
            .with_availability(true)
            .with_capture(Ok(ScannedTicket::new("BK-SEAT-7"))),
    );

    store.send(CheckinAction::Probe).await.unwrap();
    assert!(wait_for_state(&store, |state| state.available, WAIT).await);

    store.send(CheckinAction::BeginCapture).await.unwrap();
    assert!(
        wait_for_state(&store, |state| state.last_scan.is_some(), WAIT).await,
        "the scan should land"
    );

    let state = store.state(Clone::clone).await;
    assert_eq!(state.last_scan, Some(ScannedTicket::new("BK-SEAT-7")));
    assert!(!state.capturing, "a delivered scan ends the capture");
    assert_eq!(state.notice, None);
    assert_eq!(
        scanner.calls(),
        vec![ScannerCall::Availability, ScannerCall::Capture]
    );
}

#[tokio::test]
async fn without_a_scanner_the_capture_button_is_dead() {
    let (store, scanner) = station(MockScanner::new().with_availability(false));

    let probed = store
        .send_and_wait_for(
            CheckinAction::Probe,
            |action| matches!(action, CheckinAction::Probed { .. }),
            WAIT,
        )
        .await
        .unwrap();
    assert_eq!(probed, CheckinAction::Probed { available: false });

    store.send(CheckinAction::BeginCapture).await.unwrap();

    let state = store.state(Clone::clone).await;
    assert!(!state.capturing);
    assert_eq!(
        scanner.calls(),
        vec![ScannerCall::Availability],
        "no capture without a device"
    );
}

#[tokio::test]
async fn a_failed_scan_surfaces_the_device_message() {
    let (store, _scanner) = station(
        MockScanner::new()
            .with_availability(true)
            .with_capture(Err(ScanError::Failed("user dismissed".to_string()))),
    );

    store.send(CheckinAction::Probe).await.unwrap();
    assert!(wait_for_state(&store, |state| state.available, WAIT).await);

    store.send(CheckinAction::BeginCapture).await.unwrap();
    assert!(wait_for_state(&store, |state| state.notice.is_some(), WAIT).await);

    let (notice, capturing) = store
        .state(|state| (state.notice.clone(), state.capturing))
        .await;
    assert_eq!(notice.as_deref(), Some("scan failed: user dismissed"));
    assert!(!capturing);

    store.send(CheckinAction::DismissNotice).await.unwrap();
    let notice = store.state(|state| state.notice.clone()).await;
    assert_eq!(notice, None);
}

#[tokio::test]
async fn mashing_the_scan_button_captures_once() {
    let (store, scanner) = station(
        MockScanner::new()
            .with_latency(Duration::from_millis(100))
            .with_availability(true)
            .with_capture(Ok(ScannedTicket::new("BK-1"))),
    );

    store.send(CheckinAction::Probe).await.unwrap();
    assert!(wait_for_state(&store, |state| state.available, WAIT).await);

    store.send(CheckinAction::BeginCapture).await.unwrap();
    store.send(CheckinAction::BeginCapture).await.unwrap();
    assert!(wait_for_state(&store, |state| state.last_scan.is_some(), WAIT).await);

    let captures = scanner
        .calls()
        .into_iter()
        .filter(|call| *call == ScannerCall::Capture)
        .count();
    assert_eq!(captures, 1);
}
