//! HTTP API server.
//!
//! Exposes the analysis and chat pipeline as a small JSON API:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/analyze` | Build a session from resume + JD text and run the gap analysis |
//! | `POST` | `/api/chat` | Chat over a previously analyzed session |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Sessions are scoped per analysis request and addressed by UUID; a new
//! `/analyze` call creates a new session rather than replacing anyone
//! else's. The session map holds `Arc<Session>` values that are inserted
//! whole and never mutated, so chat requests running against an older
//! session are unaffected by concurrent submissions.
//!
//! # Error Contract
//!
//! All error responses use the body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "resume_text must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser
//! clients.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use crate::analysis::{run_gap_analysis, AnalysisReport};
use crate::chat::{chat_turn, push_history, ChatMessage, ChatReply};
use crate::config::Config;
use crate::embedding::create_provider;
use crate::ingest::{build_session, Session};
use crate::llm;
use crate::rerank::{create_reranker, Reranker};

/// One analyzed session plus its chat history.
#[derive(Clone)]
struct SessionEntry {
    session: Arc<Session>,
    history: Arc<Mutex<Vec<ChatMessage>>>,
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    reranker: Arc<dyn Reranker>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

/// Start the HTTP server on the configured bind address.
///
/// Provider configuration is checked up front so that a missing API key or
/// unknown provider fails here, at startup, instead of surfacing mid-request.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    // Fail fast on misconfigured providers.
    create_provider(&config.embedding)?;
    llm::check_config(&config.llm)?;
    let reranker: Arc<dyn Reranker> = create_reranker(&config.rerank)?.into();

    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        reranker,
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/analyze", post(handle_analyze))
        .route("/api/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!(bind = %bind_addr, "API server listening");
    println!("jobfit API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/analyze ============

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    resume_text: String,
    #[serde(default)]
    jd_text: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    session_id: Uuid,
    #[serde(flatten)]
    report: AnalysisReport,
}

async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if req.resume_text.trim().is_empty() && req.jd_text.trim().is_empty() {
        return Err(bad_request("resume_text or jd_text must not be empty"));
    }

    let session = build_session(&state.config, &req.resume_text, &req.jd_text).await;
    let report = run_gap_analysis(&state.config, &session, state.reranker.as_ref()).await;

    let session_id = Uuid::new_v4();
    let entry = SessionEntry {
        session: Arc::new(session),
        history: Arc::new(Mutex::new(Vec::new())),
    };
    state
        .sessions
        .write()
        .expect("session map lock poisoned")
        .insert(session_id, entry);

    info!(%session_id, "analysis session created");
    Ok(Json(AnalyzeResponse { session_id, report }))
}

// ============ POST /api/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    session_id: Uuid,
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    session_id: Uuid,
    #[serde(flatten)]
    reply: ChatReply,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    let entry = {
        let sessions = state.sessions.read().expect("session map lock poisoned");
        sessions
            .get(&req.session_id)
            .cloned()
            .ok_or_else(|| not_found(format!("no session with id {}", req.session_id)))?
    };

    // Snapshot the history for the rewrite prompt; the lock is not held
    // across any await point.
    let history_snapshot = entry
        .history
        .lock()
        .expect("history lock poisoned")
        .clone();

    let reply = chat_turn(
        &state.config,
        &entry.session,
        state.reranker.as_ref(),
        &history_snapshot,
        &req.message,
    )
    .await;

    push_history(
        &mut entry.history.lock().expect("history lock poisoned"),
        &req.message,
        reply.answer.as_deref(),
    );

    Ok(Json(ChatResponse {
        session_id: req.session_id,
        reply,
    }))
}
