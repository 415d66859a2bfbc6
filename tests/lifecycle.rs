//! Router start/stop ordering and state transitions.

use std::sync::Arc;
use std::time::Duration;

use restroute::lifecycle::LifecycleState;
use restroute::routing::{Router, RoutingError};
use restroute::{Request, Response};

mod common;
use common::{entries, new_log, Recorder};

#[tokio::test]
async fn test_start_routes_then_default_and_stop_in_reverse() {
    let log = new_log();
    let router = Router::new();
    router.attach("/a", Recorder::new("a", &log)).unwrap();
    router.attach("/b", Recorder::new("b", &log)).unwrap();
    router.attach_default(Recorder::new("fallback", &log)).unwrap();

    router.start().await.unwrap();
    assert_eq!(router.state(), LifecycleState::Started);
    assert_eq!(entries(&log), ["start:a", "start:b", "start:fallback"]);

    router.stop().await.unwrap();
    assert_eq!(router.state(), LifecycleState::Stopped);
    assert_eq!(&entries(&log)[3..], &["stop:fallback", "stop:a", "stop:b"]);
}

#[tokio::test]
async fn test_start_is_idempotent_and_restartable() {
    let log = new_log();
    let router = Router::new();
    router.attach("/a", Recorder::new("a", &log)).unwrap();

    router.start().await.unwrap();
    router.start().await.unwrap();
    assert_eq!(entries(&log), ["start:a"]);

    router.stop().await.unwrap();
    router.stop().await.unwrap();
    router.start().await.unwrap();
    assert_eq!(entries(&log), ["start:a", "stop:a", "start:a"]);
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let log = new_log();
    let router = Router::new();
    router.attach("/a", Recorder::new("a", &log)).unwrap();

    router.stop().await.unwrap();
    assert_eq!(router.state(), LifecycleState::Idle);
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn test_nested_router_targets_are_started() {
    let log = new_log();
    let child = Arc::new(Router::new());
    child.attach("/leaf", Recorder::new("leaf", &log)).unwrap();

    let parent = Router::new();
    parent.attach("/api", child.clone()).unwrap();
    parent.attach("/other", Recorder::new("other", &log)).unwrap();

    parent.start().await.unwrap();
    assert_eq!(child.state(), LifecycleState::Started);
    assert_eq!(entries(&log), ["start:leaf", "start:other"]);

    parent.stop().await.unwrap();
    assert_eq!(child.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn test_failing_start_hook() {
    let log = new_log();
    let router = Router::new();
    router.attach("/a", Recorder::new("a", &log)).unwrap();
    router.attach("/b", Recorder::failing("broken", &log)).unwrap();

    let err = router.start().await.unwrap_err();
    match err {
        RoutingError::Lifecycle { target, source } => {
            assert_eq!(target, "broken");
            assert_eq!(source.to_string(), "broken refused to start");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(router.state(), LifecycleState::Idle);
}

#[tokio::test]
async fn test_stop_interrupts_waiting_dispatch() {
    let router = Arc::new(Router::new());
    router.set_max_attempts(10).unwrap();
    router.set_retry_delay(Duration::from_secs(30));
    router.start().await.unwrap();

    let waiting = router.clone();
    let task = tokio::spawn(async move {
        let mut request = Request::get("/missing");
        let mut response = Response::new();
        waiting.handle(&mut request, &mut response).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    router.stop().await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("dispatch should stop waiting")
        .unwrap();
    assert!(matches!(result, Err(RoutingError::Interrupted)));
}
