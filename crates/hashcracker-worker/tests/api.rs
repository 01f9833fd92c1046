//! Drives the worker's real HTTP surface end to end: create, activate,
//! poll the diagnostic progress route, and delete (§6, §8 P9).

use std::{net::SocketAddr, time::Duration};

use hashcracker_worker::{server, Notifier, TaskStore};
use md5::{Digest, Md5};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

async fn spawn_worker(max_parallel: usize) -> SocketAddr {
    // Points at an address nothing listens on; pushes fail and are logged,
    // which is the documented behaviour (§4.7) and irrelevant to these tests.
    let notifier = Arc::new(Notifier::new(
        "http://127.0.0.1:1/unused".to_string(),
        Duration::from_secs(3600),
    ));
    let task_store = TaskStore::new(Uuid::new_v4(), max_parallel, Duration::from_secs(300), notifier);
    let app = server::router(task_store);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    addr
}

fn md5_hex(word: &str) -> String {
    hex::encode(Md5::digest(word.as_bytes()))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn create_activate_and_observe_ready_with_a_match() {
    let addr = spawn_worker(4).await;
    let client = reqwest::Client::new();
    let task_id = Uuid::new_v4();
    let target = md5_hex("ba");

    let task = json!({
        "task_id": task_id,
        "target_hash": target,
        "alphabet": "ab",
        "max_length": 2,
        "start_index": 0,
        "end_index": 6,
    });
    let resp = client
        .post(format!("http://{addr}/api/v1/tasks/"))
        .json(&task)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let resp = client
        .put(format!("http://{addr}/api/v1/tasks/{task_id}/do"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let mut last = None;
    for _ in 0..200 {
        let resp = client
            .get(format!("http://{addr}/api/v1/tasks/{task_id}/progress"))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = resp.json().await.unwrap();
        if body["status"] == "READY" || body["status"] == "ERROR" {
            last = Some(body);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let status = last.expect("shard did not finish in time");
    assert_eq!(status["status"], "READY");
    assert_eq!(status["result"], json!(["ba"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn duplicate_create_is_rejected_with_conflict() {
    let addr = spawn_worker(4).await;
    let client = reqwest::Client::new();
    let task_id = Uuid::new_v4();
    let task = json!({
        "task_id": task_id,
        "target_hash": "deadbeef",
        "alphabet": "ab",
        "max_length": 2,
        "start_index": 0,
        "end_index": 6,
    });

    let first = client
        .post(format!("http://{addr}/api/v1/tasks/"))
        .json(&task)
        .send()
        .await
        .unwrap();
    assert!(first.status().is_success());

    let second = client
        .post(format!("http://{addr}/api/v1/tasks/"))
        .json(&task)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn do_task_on_unknown_id_is_not_found() {
    let addr = spawn_worker(4).await;
    let client = reqwest::Client::new();
    let resp = client
        .put(format!("http://{addr}/api/v1/tasks/{}/do", Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_removes_the_task_and_progress_then_reports_not_found() {
    let addr = spawn_worker(4).await;
    let client = reqwest::Client::new();
    let task_id = Uuid::new_v4();
    let task = json!({
        "task_id": task_id,
        "target_hash": "deadbeef",
        "alphabet": "ab",
        "max_length": 2,
        "start_index": 0,
        "end_index": 6,
    });
    client
        .post(format!("http://{addr}/api/v1/tasks/"))
        .json(&task)
        .send()
        .await
        .unwrap();

    let resp = client
        .delete(format!("http://{addr}/api/v1/tasks/{task_id}"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let resp = client
        .get(format!("http://{addr}/api/v1/tasks/{task_id}/progress"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn create_task_over_capacity_is_service_unavailable() {
    let addr = spawn_worker(1).await;
    let client = reqwest::Client::new();

    for i in 0..2u8 {
        let task = json!({
            "task_id": Uuid::new_v4(),
            "target_hash": "deadbeef",
            "alphabet": "ab",
            "max_length": 2,
            "start_index": 0,
            "end_index": 6,
        });
        let resp = client
            .post(format!("http://{addr}/api/v1/tasks/"))
            .json(&task)
            .send()
            .await
            .unwrap();
        if i == 0 {
            assert!(resp.status().is_success());
        } else {
            assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
        }
    }
}

#[tokio::test]
async fn health_route_returns_ok() {
    let addr = spawn_worker(1).await;
    let client = reqwest::Client::new();
    let resp = client.get(format!("http://{addr}/health")).send().await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.unwrap(), "OK");
}

/// §8 P10: a panicking handler is contained by the same panic-recovery
/// layer wired into the real routers (§7's PanicRecovery class) rather
/// than bringing the listener down, and the response carries
/// `Connection: close` as §7 specifies — the next request on a fresh
/// connection still succeeds.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panic_in_a_handler_is_contained_and_the_listener_survives() {
    use axum::{routing::get, Router};
    use tower_http::catch_panic::CatchPanicLayer;

    async fn boom() -> &'static str {
        panic!("simulated handler panic");
    }

    let app = Router::new()
        .route("/boom", get(boom))
        .route("/health", get(|| async { "OK" }))
        .layer(CatchPanicLayer::custom(hashcracker_worker::handle_panic));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });

    let client = reqwest::Client::new();
    let resp = client.get(format!("http://{addr}/boom")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.headers().get(reqwest::header::CONNECTION).and_then(|v| v.to_str().ok()),
        Some("close")
    );

    let resp = client.get(format!("http://{addr}/health")).send().await.unwrap();
    assert!(resp.status().is_success());
}
