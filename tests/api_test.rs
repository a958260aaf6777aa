//! Integration tests for the API

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use livewatch::{
    api::AppState,
    indicator::LinkState,
    monitor::{Endpoint, MonitorRegistry, MonitorSettings, MonitorStatus},
};

fn setup_state(settings: MonitorSettings) -> AppState {
    let monitors = MonitorRegistry::new(settings).unwrap();
    AppState::new(monitors)
}

fn setup_app() -> (axum::Router, AppState) {
    let state = setup_state(MonitorSettings::default());
    (livewatch::create_router(state.clone()), state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["monitors"], 0);
}

#[tokio::test]
async fn test_heartbeat_tracks_published_frames() {
    let (app, state) = setup_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/live/heartbeat")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(body_json(response).await, json!({"seq": 0, "last_epoch_ms": 0}));

    state.frames.publish_at(Bytes::from_static(b"jpeg"), 1_700_000_000_000);
    state.frames.publish_at(Bytes::from_static(b"jpeg"), 1_700_000_000_033);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/live/heartbeat?ts=123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        body_json(response).await,
        json!({"seq": 2, "last_epoch_ms": 1_700_000_000_033i64})
    );
}

#[tokio::test]
async fn test_stream_sends_multipart_frames() {
    let (app, state) = setup_app();
    state.frames.publish(Bytes::from_static(b"\xff\xd8frame\xff\xd9"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stream.mjpg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let mut chunks = response.into_body().into_data_stream();
    let first = chunks.next().await.unwrap().unwrap();
    assert!(first.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 9\r\n\r\n"));
    assert!(first.ends_with(b"\xff\xd8frame\xff\xd9\r\n"));

    state.frames.close();
    assert!(chunks.next().await.is_none());
}

#[tokio::test]
async fn test_monitor_crud() {
    let (app, _) = setup_app();

    // Create
    let payload = json!({"name": "front", "base_url": "http://127.0.0.1:9"});
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/monitors")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["success"], true);
    assert_eq!(created["data"]["name"], "front");
    assert_eq!(created["data"]["endpoint"], "http://127.0.0.1:9/");

    // List
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/monitors")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    // Get
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/monitors/front")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Delete
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/monitors/front")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Gone
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/monitors/front")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_reconnect_monitor() {
    let (app, state) = setup_app();
    state
        .monitors
        .insert("front", Endpoint::parse("http://127.0.0.1:9").unwrap())
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/monitors/front/reconnect")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "front");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/monitors/missing/reconnect")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    state.monitors.clear().await;
}

#[tokio::test]
async fn test_create_monitor_rejects_bad_url() {
    let (app, state) = setup_app();

    for base_url in ["", "ftp://example.com/", "not a url"] {
        let payload = json!({"name": "bad", "base_url": base_url});
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/monitors")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", base_url);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }

    assert!(state.monitors.is_empty().await);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("livewatch_info"));
}

/// Poll the registry until `name` satisfies `pred`, failing after `timeout`.
async fn wait_for_status(
    registry: &MonitorRegistry,
    name: &str,
    timeout: Duration,
    pred: impl Fn(&MonitorStatus) -> bool,
) -> MonitorStatus {
    let wait = async {
        loop {
            if let Some(status) = registry.get(name).await {
                if pred(&status) {
                    return status;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };
    match tokio::time::timeout(timeout, wait).await {
        Ok(status) => status,
        Err(_) => panic!("timed out waiting for {:?}", registry.get(name).await),
    }
}

/// A monitor polling a live server over real HTTP sees it as LIVE, and goes
/// OFFLINE once frames stop arriving.
#[tokio::test]
async fn test_monitor_against_running_server() {
    let producer = setup_state(MonitorSettings::default());
    let frames = producer.frames.clone();
    let app = livewatch::create_router(producer);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let settings = MonitorSettings {
        estimator: livewatch::liveness::EstimatorConfig::new(0.25, 1000).unwrap(),
        poll_interval: Duration::from_millis(50),
        request_timeout: Duration::from_millis(1000),
    };
    let registry = MonitorRegistry::new(settings).unwrap();
    let endpoint = Endpoint::parse(&format!("http://{}", addr)).unwrap();
    let timeout = Duration::from_secs(10);

    frames.publish(Bytes::from_static(b"jpeg"));
    registry.insert("local", endpoint).await.unwrap();

    let status = wait_for_status(&registry, "local", timeout, |s| s.alive).await;
    assert_eq!(status.state, LinkState::Live);
    assert!(status.last_error.is_none());

    // No new frames: the heartbeat ages past the threshold
    let status = wait_for_status(&registry, "local", timeout, |s| {
        !s.alive && s.age_ms.is_some()
    })
    .await;
    assert_eq!(status.state, LinkState::Offline);
    assert!(status.age_ms.unwrap() > 1000);

    // Frames resume: back online with one reconnect
    frames.publish(Bytes::from_static(b"jpeg"));
    let status = wait_for_status(&registry, "local", timeout, |s| s.alive).await;
    assert_eq!(status.state, LinkState::Live);
    assert_eq!(status.reconnects, 1);

    registry.clear().await;
    frames.close();
    server.abort();
}
