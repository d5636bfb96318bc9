//! HTTP API server.
//!
//! Exposes question answering, excerpt search and transcripts as JSON
//! endpoints.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::VidqaError;
use crate::service::{AskResult, QaService, SearchResponse};
use crate::transcript::FetchedTranscript;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

const SERVICE_NAME: &str = "vidqa";

/// Shared application state.
pub struct AppState {
    pub service: QaService,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<&str>, port: Option<u16>, settings: &Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve) {
        Output::error(&e.to_string());
        return Err(e.into());
    }
    if preflight::check_tool("yt-dlp").is_err() {
        Output::warning("yt-dlp not found; subtitle downloads will be skipped.");
    }

    let state = Arc::new(AppState {
        service: QaService::new(settings)?,
    });

    let host = host.unwrap_or(&settings.server.host);
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("vidqa API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("Search", "POST /search");
    Output::kv("Transcript", "GET  /transcript/{video_id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .route("/transcript/{video_id}", get(transcript))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    /// YouTube URL or video ID
    video_id: String,
    question: String,
}

#[derive(Deserialize)]
struct SearchRequest {
    video_id: String,
    query: String,
    #[serde(default)]
    k: Option<usize>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A library error on its way to becoming an HTTP response.
struct ApiError(VidqaError);

impl From<VidqaError> for ApiError {
    fn from(e: VidqaError) -> Self {
        Self(e)
    }
}

fn status_for(e: &VidqaError) -> StatusCode {
    match e.root() {
        VidqaError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        VidqaError::TranscriptUnavailable(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "message": "Ask questions about YouTube videos. POST /ask with {video_id, question}.",
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
        "cache": state.service.stats(),
    }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResult>, ApiError> {
    let result = state.service.ask(&req.video_id, &req.question).await?;
    Ok(Json(result))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = state
        .service
        .search(&req.video_id, &req.query, req.k)
        .await?;
    Ok(Json(response))
}

async fn transcript(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<FetchedTranscript>, ApiError> {
    Ok(Json(state.service.transcript(&video_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::testing::EchoModel;
    use crate::service::testing::{service, VIDEO_ID};
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(AppState {
            service: service(Arc::new(EchoModel::new("Bananas are yellow."))),
        }))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["service"], "vidqa");

        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
        assert_eq!(body["cache"]["index_cache"]["entries"], 0);
    }

    #[tokio::test]
    async fn test_ask() {
        let response = app()
            .oneshot(post_json(
                "/ask",
                serde_json::json!({ "video_id": VIDEO_ID, "question": "what colour are bananas?" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["video_id"], VIDEO_ID);
        assert_eq!(body["provider"], "static");
        assert_eq!(body["answer"], "Bananas are yellow.");
        let context = body["context"].as_array().unwrap();
        assert!(!context.is_empty());
        assert!(context[0]["content"].is_string());
        assert!(context[0]["chunk_order"].is_u64());
        assert!(context[0]["score"].is_number());
    }

    #[tokio::test]
    async fn test_ask_error_statuses() {
        let response = app()
            .oneshot(post_json(
                "/ask",
                serde_json::json!({ "video_id": "not a video", "question": "why?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(read_json(response).await["error"].is_string());

        let response = app()
            .oneshot(post_json(
                "/ask",
                serde_json::json!({ "video_id": "aaaaaaaaaaa", "question": "why?" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_search_with_k() {
        let response = app()
            .oneshot(post_json(
                "/search",
                serde_json::json!({ "video_id": VIDEO_ID, "query": "yellow", "k": 1 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transcript() {
        let response = app()
            .oneshot(
                Request::get(format!("/transcript/{}", VIDEO_ID))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert!(body["text"].as_str().unwrap().contains("bananas"));
    }

    #[test]
    fn test_status_mapping_sees_through_shared_errors() {
        let shared = VidqaError::Shared(Arc::new(VidqaError::InvalidInput("x".to_string())));
        assert_eq!(status_for(&shared), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&VidqaError::Embedding("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
