//! HTTP front-end.
//!
//! Exposes the same operations as the CLI over a JSON API. Handlers may run
//! concurrently; conflicting writes against the same note serialize at the
//! SQLite layer, and every language-model call is time-bounded, so no
//! handler blocks indefinitely.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/notes?filename=<name>` | Upload a single note (raw text body) |
//! | `GET`  | `/notes` | List notes that have a summary |
//! | `POST` | `/notes/{id}/summarize` | Summarize one note by id |
//! | `POST` | `/summarize` | Summarize all pending notes |
//! | `POST` | `/ask` | Ask a question over stored notes |
//!
//! # Error contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `llm_failure` (502),
//! `internal` (500).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::ask::{answer_question, AskOutcome, UsedNote};
use crate::config::Config;
use crate::db;
use crate::import::dedup_hash;
use crate::llm::{OllamaClient, TextGenerator};
use crate::models::SummarizedNote;
use crate::store;
use crate::summarize::{summarize_one, summarize_pending, SingleOutcome};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    llm: Arc<dyn TextGenerator>,
}

/// Starts the HTTP server on the configured bind address. Runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;
    let llm: Arc<dyn TextGenerator> = Arc::new(OllamaClient::new(&config.llm)?);

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
        llm,
    };

    let app = router(state);

    println!("chestnut server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/notes", post(handle_upload).get(handle_list))
        .route("/notes/{id}/summarize", post(handle_summarize_one))
        .route("/summarize", post(handle_summarize_all))
        .route("/ask", post(handle_ask))
        .layer(cors)
        .with_state(state)
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

fn llm_failure(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "llm_failure".to_string(),
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: err.to_string(),
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

// ============ POST /notes ============

#[derive(Deserialize)]
struct UploadParams {
    filename: String,
}

#[derive(Serialize)]
struct UploadResponse {
    id: String,
    /// True when an identical note was already stored; no new row is created.
    duplicate: bool,
}

async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: String,
) -> Result<Json<UploadResponse>, AppError> {
    if params.filename.trim().is_empty() {
        return Err(bad_request("filename must not be empty"));
    }
    if body.trim().is_empty() {
        return Err(bad_request("note body must not be empty"));
    }

    let hash = dedup_hash(&params.filename, &body);
    if let Some(existing) = store::find_by_hash(&state.pool, &hash)
        .await
        .map_err(internal)?
    {
        return Ok(Json(UploadResponse {
            id: existing,
            duplicate: true,
        }));
    }

    let id = store::add_note(&state.pool, &params.filename, &body, &hash)
        .await
        .map_err(internal)?;

    Ok(Json(UploadResponse {
        id,
        duplicate: false,
    }))
}

// ============ GET /notes ============

#[derive(Serialize)]
struct ListResponse {
    notes: Vec<SummarizedNote>,
}

async fn handle_list(State(state): State<AppState>) -> Result<Json<ListResponse>, AppError> {
    let notes = store::fetch_summarized(&state.pool)
        .await
        .map_err(internal)?;
    Ok(Json(ListResponse { notes }))
}

// ============ POST /notes/{id}/summarize ============

#[derive(Serialize)]
struct SummarizeOneResponse {
    id: String,
    summary: String,
}

async fn handle_summarize_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SummarizeOneResponse>, AppError> {
    let outcome = summarize_one(&state.config, &state.pool, state.llm.as_ref(), &id)
        .await
        .map_err(internal)?;

    match outcome {
        SingleOutcome::Summarized { summary } => Ok(Json(SummarizeOneResponse { id, summary })),
        SingleOutcome::NotFound => Err(not_found(format!("note not found: {}", id))),
        SingleOutcome::Failed { error } => Err(llm_failure(error)),
    }
}

// ============ POST /summarize ============

#[derive(Serialize)]
struct SummarizeAllResponse {
    pending: u64,
    summarized: u64,
    failed: u64,
}

async fn handle_summarize_all(
    State(state): State<AppState>,
) -> Result<Json<SummarizeAllResponse>, AppError> {
    let report = summarize_pending(&state.config, &state.pool, state.llm.as_ref())
        .await
        .map_err(internal)?;

    Ok(Json(SummarizeAllResponse {
        pending: report.pending,
        summarized: report.summarized,
        failed: report.failed,
    }))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    used: Vec<UsedNote>,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    if req.question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    if req.top_k == Some(0) {
        return Err(bad_request("top_k must be >= 1"));
    }

    let outcome = answer_question(
        &state.config,
        &state.pool,
        state.llm.as_ref(),
        &req.question,
        req.top_k,
    )
    .await
    .map_err(internal)?;

    match outcome {
        AskOutcome::Answered { answer, used } => Ok(Json(AskResponse { answer, used })),
        AskOutcome::LlmFailed { error, .. } => Err(llm_failure(error)),
        AskOutcome::NoRelevantNotes => Ok(Json(AskResponse {
            answer: "No relevant notes found.".to_string(),
            used: Vec::new(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedGenerator;
    use crate::store::test_pool;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn app_with(llm: Arc<dyn TextGenerator>) -> (Router, SqlitePool) {
        let pool = test_pool().await;
        let state = AppState {
            config: Arc::new(Config::default()),
            pool: pool.clone(),
            llm,
        };
        (router(state), pool)
    }

    async fn seed_summarized(pool: &SqlitePool, filename: &str, summary: &str) -> String {
        let id = store::add_note(pool, filename, "full note content", filename)
            .await
            .unwrap();
        store::update_summary(pool, &id, summary).await.unwrap();
        id
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_text(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn error_code(body: &serde_json::Value) -> &str {
        body["error"]["code"].as_str().unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;

        let response = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn upload_rejects_empty_filename() {
        let (app, _pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;

        let response = app
            .oneshot(post_text("/notes?filename=", "some content"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(error_code(&body), "bad_request");
    }

    #[tokio::test]
    async fn upload_rejects_empty_body() {
        let (app, _pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;

        let response = app
            .oneshot(post_text("/notes?filename=a.txt", "   "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(error_code(&body), "bad_request");
    }

    #[tokio::test]
    async fn upload_then_duplicate_reuses_note() {
        let (app, pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;

        let response = app
            .clone()
            .oneshot(post_text("/notes?filename=a.txt", "hello world"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let first = json_body(response).await;
        assert_eq!(first["duplicate"], false);

        let response = app
            .oneshot(post_text("/notes?filename=a.txt", "hello world"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let second = json_body(response).await;
        assert_eq!(second["duplicate"], true);
        assert_eq!(second["id"], first["id"]);

        assert_eq!(store::fetch_all(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_returns_summarized_notes() {
        let (app, pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;
        seed_summarized(&pool, "a.txt", "cats are great pets").await;

        let response = app.oneshot(get_req("/notes")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let notes = body["notes"].as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["filename"], "a.txt");
        assert_eq!(notes[0]["summary"], "cats are great pets");
    }

    #[tokio::test]
    async fn summarize_unknown_note_is_not_found() {
        let (app, _pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;

        let response = app
            .oneshot(post_text("/notes/no-such-id/summarize", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = json_body(response).await;
        assert_eq!(error_code(&body), "not_found");
    }

    #[tokio::test]
    async fn summarize_one_maps_model_failure_to_llm_failure() {
        let (app, pool) = app_with(Arc::new(ScriptedGenerator::always_err("boom"))).await;
        let id = store::add_note(&pool, "a.txt", "content", "ha").await.unwrap();

        let response = app
            .oneshot(post_text(&format!("/notes/{}/summarize", id), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = json_body(response).await;
        assert_eq!(error_code(&body), "llm_failure");

        // The failure never touched the stored summary.
        let note = store::fetch_note(&pool, &id).await.unwrap().unwrap();
        assert_eq!(note.summary, None);
    }

    #[tokio::test]
    async fn summarize_one_commits_summary() {
        let (app, pool) = app_with(Arc::new(ScriptedGenerator::always_ok("a short summary"))).await;
        let id = store::add_note(&pool, "a.txt", "content", "ha").await.unwrap();

        let response = app
            .oneshot(post_text(&format!("/notes/{}/summarize", id), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["summary"], "a short summary");

        let note = store::fetch_note(&pool, &id).await.unwrap().unwrap();
        assert_eq!(note.summary.as_deref(), Some("a short summary"));
    }

    #[tokio::test]
    async fn summarize_all_reports_tally() {
        let (app, pool) = app_with(Arc::new(ScriptedGenerator::always_err("down"))).await;
        store::add_note(&pool, "a.txt", "aaa", "ha").await.unwrap();
        store::add_note(&pool, "b.txt", "bbb", "hb").await.unwrap();

        let response = app.oneshot(post_text("/summarize", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["pending"], 2);
        assert_eq!(body["summarized"], 0);
        assert_eq!(body["failed"], 2);
    }

    #[tokio::test]
    async fn ask_rejects_empty_question() {
        let (app, _pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;

        let response = app
            .oneshot(post_json("/ask", serde_json::json!({ "question": "   " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(error_code(&body), "bad_request");
    }

    #[tokio::test]
    async fn ask_rejects_zero_top_k() {
        let (app, _pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;

        let response = app
            .oneshot(post_json(
                "/ask",
                serde_json::json!({ "question": "cats", "top_k": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(error_code(&body), "bad_request");
    }

    #[tokio::test]
    async fn ask_without_relevant_notes_returns_fixed_answer() {
        let (app, _pool) = app_with(Arc::new(ScriptedGenerator::always_ok("unused"))).await;

        let response = app
            .oneshot(post_json("/ask", serde_json::json!({ "question": "cats" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["answer"], "No relevant notes found.");
        assert_eq!(body["used"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn ask_maps_model_failure_to_llm_failure() {
        let (app, pool) = app_with(Arc::new(ScriptedGenerator::always_err("refused"))).await;
        seed_summarized(&pool, "a.txt", "cats are great pets").await;

        let response = app
            .oneshot(post_json("/ask", serde_json::json!({ "question": "cats" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = json_body(response).await;
        assert_eq!(error_code(&body), "llm_failure");
        assert!(body["error"]["message"].as_str().unwrap().contains("refused"));
    }

    #[tokio::test]
    async fn ask_answers_with_provenance() {
        let (app, pool) =
            app_with(Arc::new(ScriptedGenerator::always_ok("Cats are wonderful."))).await;
        seed_summarized(&pool, "a.txt", "cats are great pets").await;
        seed_summarized(&pool, "b.txt", "dogs need daily walks").await;

        let response = app
            .oneshot(post_json("/ask", serde_json::json!({ "question": "cats" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["answer"], "Cats are wonderful.");
        let used = body["used"].as_array().unwrap();
        assert_eq!(used.len(), 1);
        assert_eq!(used[0]["filename"], "a.txt");
    }
}
