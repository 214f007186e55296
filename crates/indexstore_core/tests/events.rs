//! Unit event delivery.

use indexstore_core::{IndexStoreError, ListenOptions, UnitEventKind, UnitEventRecord};
use indexstore_testkit::prelude::*;
use indexstore_testkit::sample::UTIL_OUTPUT;
use parking_lot::Mutex;
use std::sync::mpsc::TryRecvError;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn initial_snapshot_is_delivered_before_start_returns() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    store.set_unit_event_handler(move |notification| {
        sink.lock().push(notification.to_batch());
    });
    store
        .start_unit_event_listening(ListenOptions::default().wait_initial_sync(true))
        .unwrap();

    let batches = received.lock().clone();
    assert_eq!(batches.len(), 1);
    assert!(batches[0].is_initial);
    assert_eq!(batches[0].events.len(), 3);
    assert!(batches[0]
        .events
        .iter()
        .all(|event| event.kind == Some(UnitEventKind::Added)));
    store.stop_unit_event_listening();
}

#[test]
fn subscribers_receive_batches_from_the_listener_thread() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let first = store.subscribe_unit_events();
    let second = store.subscribe_unit_events();
    store
        .start_unit_event_listening(ListenOptions::default())
        .unwrap();

    let batch = first.recv_timeout(TIMEOUT).unwrap();
    assert!(batch.is_initial);
    assert_eq!(batch, second.recv_timeout(TIMEOUT).unwrap());
    store.stop_unit_event_listening();
}

#[test]
fn discarding_a_unit_reports_its_removal() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().with_blocks(false).load().unwrap();
    let store = test_store.open(&library).unwrap();

    let events = store.subscribe_unit_events();
    store
        .start_unit_event_listening(ListenOptions::default().wait_initial_sync(true))
        .unwrap();
    assert!(events.recv_timeout(TIMEOUT).unwrap().is_initial);

    let util = unit_name_for_output(UTIL_OUTPUT);
    store.discard_unit(&util).unwrap();
    let batch = events.recv_timeout(TIMEOUT).unwrap();
    assert!(!batch.is_initial);
    assert_eq!(
        batch.events,
        vec![UnitEventRecord {
            kind: Some(UnitEventKind::Removed),
            unit_name: util,
        }]
    );
    store.stop_unit_event_listening();
}

#[test]
fn starting_twice_is_a_store_error() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();
    store.set_unit_event_handler(|_| {});

    let options = ListenOptions::default().wait_initial_sync(true);
    store.start_unit_event_listening(options).unwrap();
    let err = store.start_unit_event_listening(options).unwrap_err();
    let store_error = err.as_store_error().unwrap();
    assert_eq!(store_error.operation, "store_start_unit_event_listening");
    assert!(store_error.description.contains("already listening"));
    store.stop_unit_event_listening();
}

#[test]
fn handler_contexts_are_released() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    {
        let store = test_store.open(&library).unwrap();
        store.set_unit_event_handler(|_| {});
        store.set_unit_event_handler(|_| {});
        assert_eq!(handle_counts(test_store.path()).handlers_finalized, 1);
    }
    let counts = handle_counts(test_store.path());
    assert_eq!(counts.handlers_finalized, 2);
    assert!(counts.balanced());
}

#[test]
fn panicking_handler_does_not_cross_the_boundary() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();
    store.set_unit_event_handler(|_| panic!("handler failure"));
    store
        .start_unit_event_listening(ListenOptions::default().wait_initial_sync(true))
        .unwrap();
    store.stop_unit_event_listening();
}

#[test]
fn replacing_the_handler_disconnects_the_feed() {
    let test_store = TestStore::sample();
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();

    let early = store.subscribe_unit_events();
    store.set_unit_event_handler(|_| {});
    assert_eq!(early.try_recv(), Err(TryRecvError::Disconnected));

    let late = store.subscribe_unit_events();
    store
        .start_unit_event_listening(ListenOptions::default().wait_initial_sync(true))
        .unwrap();
    let batch = late.recv_timeout(TIMEOUT).unwrap();
    assert!(batch.is_initial);
    assert_eq!(batch.events.len(), 3);
    store.stop_unit_event_listening();
}

#[test]
fn listen_failure_without_error_is_a_protocol_violation() {
    let test_store =
        TestStore::new(sample_fixture().listen_fault(ListenFault::FailWithoutError));
    let library = FakeLibrary::new().load().unwrap();
    let store = test_store.open(&library).unwrap();
    store.set_unit_event_handler(|_| {});

    let err = store
        .start_unit_event_listening(ListenOptions::default().wait_initial_sync(true))
        .unwrap_err();
    assert!(matches!(
        err,
        IndexStoreError::ProtocolViolation {
            operation: "store_start_unit_event_listening",
            ..
        }
    ));
}

#[test]
fn error_alongside_success_is_released() {
    let test_store =
        TestStore::new(sample_fixture().listen_fault(ListenFault::SucceedWithError));
    let library = FakeLibrary::new().load().unwrap();
    {
        let store = test_store.open(&library).unwrap();
        let events = store.subscribe_unit_events();
        store
            .start_unit_event_listening(ListenOptions::default().wait_initial_sync(true))
            .unwrap();
        assert!(events.recv_timeout(TIMEOUT).unwrap().is_initial);
        store.stop_unit_event_listening();
    }
    let counts = handle_counts(test_store.path());
    assert_eq!(counts.errors_created, 1);
    assert_eq!(counts.errors_disposed, 1);
    assert!(counts.balanced());
}
