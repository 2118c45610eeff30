/*!
 * HTTP API tests against a server on an ephemeral port
 */

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use vidnarrate::collaborators::mock::MockTextGenerator;
use vidnarrate::server::{self, ApiState, GenerateResponse};

use crate::common::{self, Harness};

struct RunningServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

async fn start(harness: &Harness) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let state = ApiState::new(Arc::new(harness.generator.clone()));

    let handle = tokio::spawn(server::serve(
        listener,
        state,
        async move {
            let _ = stopped.await;
        },
        Duration::from_secs(5),
    ));

    RunningServer { addr, stop, handle }
}

fn url(server: &RunningServer, path: &str) -> String {
    format!("http://{}{}", server.addr, path)
}

#[tokio::test]
async fn test_health_shouldReportOk() {
    let harness = Harness::builder().build();
    let server = start(&harness).await;

    let response = reqwest::get(url(&server, "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_generate_withValidMessage_shouldReturnVideoPath() {
    let harness = Harness::builder().build();
    let server = start(&harness).await;

    let response = reqwest::Client::new()
        .post(url(&server, "/api/v1/generate"))
        .json(&json!({"message": "Explain gravity"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: GenerateResponse = response.json().await.unwrap();
    assert!(body.video.ends_with(".mp4"));
    assert!(std::path::Path::new(&body.video).starts_with(harness.output_dir()));
    assert_eq!(common::entries_in(&harness.workspace_root()), 0);
}

#[tokio::test]
async fn test_generate_withMalformedBody_shouldReturnInvalidPayload() {
    let harness = Harness::builder().build();
    let server = start(&harness).await;

    let response = reqwest::Client::new()
        .post(url(&server, "/api/v1/generate"))
        .header("content-type", "application/json")
        .body("{\"message\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Invalid request payload"}));
    assert_eq!(harness.text.call_count(), 0);
}

#[tokio::test]
async fn test_generate_withEmptyMessage_shouldRequireMessage() {
    let harness = Harness::builder().build();
    let server = start(&harness).await;
    let client = reqwest::Client::new();

    for payload in [json!({"message": ""}), json!({"message": "   "}), json!({})] {
        let response = client
            .post(url(&server, "/api/v1/generate"))
            .json(&payload)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"error": "Message is a required field"}));
    }
    assert_eq!(harness.text.call_count(), 0);
}

#[tokio::test]
async fn test_generate_withPipelineFailure_shouldHideDetails() {
    let harness = Harness::builder().text(MockTextGenerator::failing()).build();
    let server = start(&harness).await;

    let response = reqwest::Client::new()
        .post(url(&server, "/api/v1/generate"))
        .json(&json!({"message": "Explain gravity"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Failed to generate video"}));
}

#[tokio::test]
async fn test_serve_shouldStopOnShutdownTrigger() {
    let harness = Harness::builder().build();
    let server = start(&harness).await;

    server.stop.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle).await;

    assert!(matches!(result, Ok(Ok(Ok(())))));
}
