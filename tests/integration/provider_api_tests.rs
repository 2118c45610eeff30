/*!
 * HTTP collaborators against local fake services
 */

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vidnarrate::collaborators::{BackgroundFetcher, HttpSpeechSynthesizer, OllamaTextGenerator, SpeechSynthesizer, TextGenerator};
use vidnarrate::errors::{CollaboratorError, ProviderError};
use vidnarrate::generation::{ArtifactDir, SequentialNames};
use vidnarrate::providers::ollama::Ollama;
use vidnarrate::providers::Provider;

use crate::common;

#[derive(Clone)]
struct FakeOllama {
    calls: Arc<AtomicUsize>,
    // @field: Status returned before the first success
    failures: Vec<StatusCode>,
}

async fn fake_generate(State(state): State<FakeOllama>, Json(body): Json<Value>) -> impl IntoResponse {
    let n = state.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.failures.get(n) {
        return (*status, Json(json!({"error": "simulated"})));
    }
    assert_eq!(body["stream"], json!(false));
    let reply = format!("Narration about {}", body["prompt"].as_str().unwrap_or_default());
    (
        StatusCode::OK,
        Json(json!({"model": body["model"], "response": reply, "done": true})),
    )
}

async fn fake_version() -> impl IntoResponse {
    Json(json!({"version": "0.5.7"}))
}

async fn spawn_ollama(failures: Vec<StatusCode>) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let state = FakeOllama {
        calls: calls.clone(),
        failures,
    };
    let router = Router::new()
        .route("/api/generate", post(fake_generate))
        .route("/api/version", get(fake_version))
        .with_state(state);
    let addr = common::spawn_router(router).await;
    (format!("http://{}", addr), calls)
}

fn client(base_url: &str) -> Ollama {
    Ollama::new_with_config(base_url, Duration::from_secs(5), 2, 10)
}

#[tokio::test]
async fn test_ollamaGenerator_shouldReturnResponseField() {
    let (base_url, calls) = spawn_ollama(vec![]).await;
    let generator = OllamaTextGenerator::new(client(&base_url), "orca-mini");

    let text = generator.generate("gravity").await.unwrap();

    assert_eq!(text, "Narration about gravity");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ollama_withServerErrors_shouldRetryWithBackoff() {
    let (base_url, calls) = spawn_ollama(vec![StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY]).await;
    let generator = OllamaTextGenerator::new(client(&base_url), "orca-mini");

    let text = generator.generate("tides").await.unwrap();

    assert_eq!(text, "Narration about tides");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_ollama_withClientError_shouldFailWithoutRetry() {
    let (base_url, calls) = spawn_ollama(vec![StatusCode::NOT_FOUND]).await;
    let generator = OllamaTextGenerator::new(client(&base_url), "missing-model");

    let err = generator.generate("gravity").await.unwrap_err();

    assert!(matches!(
        err,
        CollaboratorError::Provider(ProviderError::ApiError { status_code: 404, .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ollama_withUnreachableServer_shouldReturnConnectionError() {
    let generator = OllamaTextGenerator::new(
        Ollama::new_with_config("http://127.0.0.1:9", Duration::from_secs(2), 0, 1),
        "orca-mini",
    );

    let err = generator.generate("gravity").await.unwrap_err();
    assert!(matches!(err, CollaboratorError::Provider(ProviderError::ConnectionError(_))));
}

#[tokio::test]
async fn test_ollama_testConnection_shouldReadVersion() {
    let (base_url, _) = spawn_ollama(vec![]).await;
    let ollama = client(&base_url);

    assert_eq!(ollama.version().await.unwrap(), "0.5.7");
    assert!(ollama.test_connection().await.is_ok());
}

async fn fake_speech(Json(body): Json<Value>) -> impl IntoResponse {
    match body["text"].as_str() {
        Some("") | None => (StatusCode::BAD_REQUEST, Vec::new()),
        Some(_) => (StatusCode::OK, b"ID3fake-mp3-bytes".to_vec()),
    }
}

#[tokio::test]
async fn test_httpSpeech_shouldWriteResponseBodyToDestination() {
    let addr = common::spawn_router(Router::new().route("/speech", post(fake_speech))).await;
    let temp_dir = common::create_temp_dir().unwrap();
    let dest = temp_dir.path().join("speech.mp3");
    let synthesizer = HttpSpeechSynthesizer::new(format!("http://{}/speech", addr), Duration::from_secs(5));

    synthesizer.synthesize("Gravity pulls.", &dest).await.unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"ID3fake-mp3-bytes");
}

#[tokio::test]
async fn test_httpSpeech_withErrorStatus_shouldFailWithoutFile() {
    let addr = common::spawn_router(Router::new().route("/speech", post(fake_speech))).await;
    let temp_dir = common::create_temp_dir().unwrap();
    let dest = temp_dir.path().join("speech.mp3");
    let synthesizer = HttpSpeechSynthesizer::new(format!("http://{}/speech", addr), Duration::from_secs(5));

    let err = synthesizer.synthesize("", &dest).await.unwrap_err();

    assert!(matches!(
        err,
        CollaboratorError::Provider(ProviderError::ApiError { status_code: 400, .. })
    ));
    assert!(!dest.exists());
}

#[derive(Clone)]
struct FakePixabay {
    base: Arc<std::sync::OnceLock<String>>,
}

async fn fake_search(State(state): State<FakePixabay>, Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    assert_eq!(params.get("orientation").map(String::as_str), Some("vertical"));
    assert_eq!(params.get("key").map(String::as_str), Some("test-key"));
    let base = state.base.get().cloned().unwrap_or_default();

    let hits = match params.get("q").map(String::as_str) {
        Some("ocean") => json!([
            {"id": 1, "videos": {"medium": {"url": format!("{}/files/1.mp4", base)}}},
            {"id": 2, "videos": {"medium": {"url": format!("{}/files/2.mp4", base)}}}
        ]),
        _ => json!([]),
    };
    Json(json!({"total": 2, "hits": hits}))
}

async fn fake_file() -> impl IntoResponse {
    b"fake mp4 payload".to_vec()
}

async fn spawn_pixabay() -> String {
    let base = Arc::new(std::sync::OnceLock::new());
    let router = Router::new()
        .route("/api/videos/", get(fake_search))
        .route("/files/:name", get(fake_file))
        .with_state(FakePixabay { base: base.clone() });
    let addr = common::spawn_router(router).await;
    let url = format!("http://{}", addr);
    let _ = base.set(url.clone());
    url
}

#[tokio::test]
async fn test_backgroundFetcher_shouldDownloadEveryHit() {
    let base = spawn_pixabay().await;
    let temp_dir = common::create_temp_dir().unwrap();
    let dest = ArtifactDir::new(temp_dir.path().join("videos"), Arc::new(SequentialNames::new("bg")));
    let fetcher = BackgroundFetcher::new(format!("{}/api", base), "test-key", 3, Duration::from_secs(5));

    let saved = fetcher.fetch("ocean", &dest).await.unwrap();

    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0], temp_dir.path().join("videos").join("bg-1.mp4"));
    for path in &saved {
        assert_eq!(std::fs::read(path).unwrap(), b"fake mp4 payload");
    }
}

#[tokio::test]
async fn test_backgroundFetcher_withNoHits_shouldFail() {
    let base = spawn_pixabay().await;
    let temp_dir = common::create_temp_dir().unwrap();
    let dest = ArtifactDir::new(temp_dir.path(), Arc::new(SequentialNames::new("bg")));
    let fetcher = BackgroundFetcher::new(format!("{}/api", base), "test-key", 3, Duration::from_secs(5));

    let err = fetcher.fetch("nothing-matches", &dest).await.unwrap_err();

    assert!(matches!(err, CollaboratorError::EmptyOutput(_)));
}
