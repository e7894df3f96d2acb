//! Request handler delivery through the session: channel selection,
//! fallbacks, and attachment racing completion.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cmis::fake_transport::{FakeTransportBuilder, FakeTransportController};
use cmis::{Error, Session, SessionConfig};
use serde_json::json;

fn repositories_body() -> serde_json::Value {
    json!({
        "test": {
            "repositoryId": "test",
            "rootFolderUrl": "http://cmis.test/test/root",
            "repositoryUrl": "http://cmis.test/test",
        }
    })
}

async fn connected_session(config: SessionConfig) -> (Session, FakeTransportController) {
    let (transport, controller) = FakeTransportBuilder::new().build();
    let session = Session::with_transport("http://cmis.test", Arc::new(transport), config);
    controller.script_ok(repositories_body());
    session
        .load_repositories()
        .result()
        .await
        .expect("discovery should succeed");
    controller.take_sent();
    (session, controller)
}

#[tokio::test]
async fn success_fires_only_the_ok_handler() {
    let (session, controller) = connected_session(SessionConfig::new()).await;
    controller.script_ok(json!({"succinctProperties": {"cmis:name": "Docs"}}));

    let ok_fired = Arc::new(AtomicUsize::new(0));
    let not_ok_fired = Arc::new(AtomicUsize::new(0));
    let error_fired = Arc::new(AtomicUsize::new(0));

    let ok_counter = Arc::clone(&ok_fired);
    let not_ok_counter = Arc::clone(&not_ok_fired);
    let error_counter = Arc::clone(&error_fired);
    let outcome = session
        .get_object("obj-1", None)
        .ok(move |response| {
            assert_eq!(response.body["succinctProperties"]["cmis:name"], "Docs");
            ok_counter.fetch_add(1, Ordering::SeqCst);
        })
        .not_ok(move |_| {
            not_ok_counter.fetch_add(1, Ordering::SeqCst);
        })
        .error(move |_| {
            error_counter.fetch_add(1, Ordering::SeqCst);
        })
        .outcome()
        .await;

    assert!(outcome.is_ok());
    assert_eq!(ok_fired.load(Ordering::SeqCst), 1);
    assert_eq!(not_ok_fired.load(Ordering::SeqCst), 0);
    assert_eq!(error_fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_2xx_fires_only_the_not_ok_handler() {
    let (session, controller) = connected_session(SessionConfig::new()).await;
    controller.script_status(409, json!({"exception": "nameConstraintViolation"}));

    let ok_fired = Arc::new(AtomicUsize::new(0));
    let not_ok_fired = Arc::new(AtomicUsize::new(0));

    let ok_counter = Arc::clone(&ok_fired);
    let not_ok_counter = Arc::clone(&not_ok_fired);
    let outcome = session
        .create_folder("root-id", "Docs")
        .ok(move |_| {
            ok_counter.fetch_add(1, Ordering::SeqCst);
        })
        .not_ok(move |response| {
            assert_eq!(response.status, 409);
            assert_eq!(response.body["exception"], "nameConstraintViolation");
            not_ok_counter.fetch_add(1, Ordering::SeqCst);
        })
        .outcome()
        .await;

    assert!(outcome.is_not_ok());
    assert_eq!(ok_fired.load(Ordering::SeqCst), 0);
    assert_eq!(not_ok_fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn transport_failure_fires_only_the_error_handler() {
    let (session, controller) = connected_session(SessionConfig::new()).await;
    controller.script_error("connection refused");

    let ok_fired = Arc::new(AtomicUsize::new(0));
    let error_fired = Arc::new(AtomicUsize::new(0));

    let ok_counter = Arc::clone(&ok_fired);
    let error_counter = Arc::clone(&error_fired);
    let outcome = session
        .get_repository_info(None)
        .ok(move |_| {
            ok_counter.fetch_add(1, Ordering::SeqCst);
        })
        .error(move |error| {
            assert!(error.is_transport());
            error_counter.fetch_add(1, Ordering::SeqCst);
        })
        .outcome()
        .await;

    assert!(outcome.is_failed());
    assert_eq!(ok_fired.load(Ordering::SeqCst), 0);
    assert_eq!(error_fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn session_fallbacks_cover_requests_without_explicit_handlers() {
    let not_ok_fired = Arc::new(AtomicUsize::new(0));
    let error_fired = Arc::new(AtomicUsize::new(0));

    let not_ok_counter = Arc::clone(&not_ok_fired);
    let error_counter = Arc::clone(&error_fired);
    let config = SessionConfig::new()
        .on_not_ok(move |response| {
            assert_eq!(response.status, 500);
            not_ok_counter.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(move |_| {
            error_counter.fetch_add(1, Ordering::SeqCst);
        });

    let (session, controller) = connected_session(config).await;

    controller.script_status(500, json!({"exception": "runtime"}));
    let outcome = session.get_repository_info(None).outcome().await;
    assert!(outcome.is_not_ok());
    assert_eq!(not_ok_fired.load(Ordering::SeqCst), 1);

    controller.script_error("dns failure");
    let outcome = session.get_repository_info(None).outcome().await;
    assert!(outcome.is_failed());
    assert_eq!(error_fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn explicit_handler_shadows_the_session_fallback() {
    let fallback_fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fallback_fired);
    let config = SessionConfig::new().on_not_ok(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let (session, controller) = connected_session(config).await;
    controller.script_status(404, json!({"exception": "objectNotFound"}));

    let handler_fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&handler_fired);
    session
        .get_object("missing", None)
        .not_ok(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .outcome()
        .await;

    assert_eq!(handler_fired.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handlers_attached_after_completion_still_fire_once() {
    let (session, controller) = connected_session(SessionConfig::new()).await;
    controller.script_ok(json!({"late": true}));

    let request = session.get_repository_info(None);
    // Let the spawned transport task resolve before any handler exists.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    drop(request.ok(move |response| {
        assert_eq!(response.body["late"], true);
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn registering_a_handler_twice_keeps_the_last_one() {
    let (session, controller) = connected_session(SessionConfig::new()).await;
    controller.script_ok(json!({}));

    let first_fired = Arc::new(AtomicUsize::new(0));
    let second_fired = Arc::new(AtomicUsize::new(0));

    let first_counter = Arc::clone(&first_fired);
    let second_counter = Arc::clone(&second_fired);
    session
        .get_repository_info(None)
        .ok(move |_| {
            first_counter.fetch_add(1, Ordering::SeqCst);
        })
        .ok(move |_| {
            second_counter.fetch_add(1, Ordering::SeqCst);
        })
        .outcome()
        .await;

    assert_eq!(first_fired.load(Ordering::SeqCst), 0);
    assert_eq!(second_fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn result_adapter_maps_each_channel() {
    let (session, controller) = connected_session(SessionConfig::new()).await;

    controller.script_ok(json!({"fine": true}));
    let response = session.get_repository_info(None).result().await.unwrap();
    assert_eq!(response.body["fine"], true);

    controller.script_status(403, json!({"exception": "permissionDenied"}));
    let error = session.get_repository_info(None).result().await.unwrap_err();
    match error {
        Error::Status { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body["exception"], "permissionDenied");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    controller.script_error("broken pipe");
    let error = session.get_repository_info(None).result().await.unwrap_err();
    assert!(error.is_transport());
}
