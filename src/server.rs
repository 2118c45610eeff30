/*!
 * HTTP front end.
 *
 * - `POST /api/v1/generate` with `{"message": "..."}` runs one generation
 * - `GET /health` reports liveness
 */

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::generation::Generator;

/// Body of a generate request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerateRequest {
    /// Prompt describing the video
    #[serde(default)]
    pub message: String,
}

/// Body of a successful generate response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerateResponse {
    /// Path of the exported video
    pub video: String,
}

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    generator: Arc<Generator>,
}

impl ApiState {
    pub fn new(generator: Arc<Generator>) -> Self {
        Self { generator }
    }
}

/// Creates the API router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/generate", post(generate_video))
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn generate_video(
    State(state): State<ApiState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected generate request: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, "Invalid request payload");
        }
    };

    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message is a required field");
    }

    match state.generator.generate(&request.message).await {
        Ok(video) => {
            let response = GenerateResponse {
                video: video.to_string_lossy().to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to generate video for '{}': {}", request.message, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate video")
        }
    }
}

/// Serve the API on `listener` until `shutdown` resolves
///
/// In-flight requests get `grace` to finish after the shutdown trigger;
/// whatever is still running afterwards is dropped.
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F, grace: Duration) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (tx, mut rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown.await;
        let _ = tx.send(true);
    });

    let mut graceful_rx = rx.clone();
    let server = axum::serve(listener, create_router(state)).with_graceful_shutdown(async move {
        let _ = graceful_rx.wait_for(|stop| *stop).await;
        info!("Shutting down, waiting for in-flight requests");
    })
    .into_future();

    tokio::select! {
        result = server => result,
        _ = async {
            let _ = rx.wait_for(|stop| *stop).await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("Shutdown grace period of {}s elapsed, dropping remaining requests", grace.as_secs());
            Ok(())
        }
    }
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
