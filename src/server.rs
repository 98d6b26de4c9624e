//! HTTP server for roster lookups.
//!
//! Every data endpoint first makes sure the roster snapshot exists (running
//! the configured [`Acquirer`] if it does not), then loads it in full for the
//! duration of the request. Acquisition is serialized: requests that arrive
//! while a crawl is running wait for it and then read its snapshot.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search/professors` | Resolve a batch of names |
//! | `GET`  | `/sample_data` | Snapshot size and the first few records |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Search
//!
//! ```json
//! // request
//! { "professors": ["Jane Smith", "J. Doe"] }
//! // response
//! { "exists": true, "count": 1,
//!   "data": [{ "name": "Jane Smith", "difficulty": 2.9, "rating": 4.2,
//!              "num_ratings": 17, "id": 123456 }] }
//! ```
//!
//! Names that do not resolve are left out of `data`.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "unavailable", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400, request body is not a valid search
//! request), `unavailable` (500, snapshot missing and acquisition failed),
//! `snapshot_read` (500, snapshot unreadable or malformed).
//!
//! # CORS
//!
//! Only the origins in `[server].allowed_origins` may call the API from a
//! browser.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::acquire::{ensure_available, Acquirer, CrawlAcquirer};
use crate::config::Config;
use crate::models::{InstructorRecord, MatchResult};
use crate::resolver::resolve_batch;
use crate::snapshot;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    /// Application configuration (wrapped in `Arc` for cheap cloning across handlers).
    config: Arc<Config>,
    /// Populates the snapshot when a request finds it missing.
    acquirer: Arc<dyn Acquirer>,
    /// Held while a request runs the acquirer, so at most one crawl is in flight.
    acquire_lock: Arc<Mutex<()>>,
}

/// Starts the server with the configured remote source as acquirer.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let acquirer = Arc::new(CrawlAcquirer::from_config(&config.source)?);
    run_server_with_acquirer(config, acquirer).await
}

/// Starts the server with a caller-supplied [`Acquirer`].
pub async fn run_server_with_acquirer(
    config: &Config,
    acquirer: Arc<dyn Acquirer>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(Arc::new(config.clone()), acquirer)?;

    println!("Roster server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router.
///
/// Fails if an entry in `[server].allowed_origins` is not a valid header value.
pub fn router(config: Arc<Config>, acquirer: Arc<dyn Acquirer>) -> anyhow::Result<Router> {
    let origins = config
        .server
        .allowed_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid allowed origin: {}", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let state = AppState {
        config,
        acquirer,
        acquire_lock: Arc::new(Mutex::new(())),
    };

    Ok(Router::new()
        .route("/search/professors", post(handle_search))
        .route("/sample_data", get(handle_sample))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state))
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"unavailable"`, `"snapshot_read"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
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

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for a snapshot that could not be acquired.
fn unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "unavailable".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 error for a snapshot that exists but cannot be read.
fn snapshot_read(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "snapshot_read".to_string(),
        message: message.into(),
    }
}

/// Ensure the snapshot exists, then load all of it.
async fn load_roster(state: &AppState) -> Result<Vec<InstructorRecord>, AppError> {
    let path = &state.config.snapshot.path;

    if !snapshot::exists(path) {
        // ensure_available re-checks under the lock, so waiters skip the crawl
        let _guard = state.acquire_lock.lock().await;
        ensure_available(path, state.acquirer.as_ref())
            .await
            .map_err(|e| {
                tracing::warn!(error = %format!("{:#}", e), "roster unavailable");
                unavailable(format!("Failed to download data: {:#}", e))
            })?;
    }

    snapshot::load(path).map_err(|e| snapshot_read(format!("Failed to read snapshot: {:#}", e)))
}

// ============ POST /search/professors ============

/// Request body for `POST /search/professors`.
#[derive(Deserialize)]
struct SearchRequest {
    /// Free-text names to resolve. Missing means an empty batch.
    #[serde(default)]
    professors: Vec<String>,
}

/// Response body for `POST /search/professors`.
#[derive(Serialize)]
struct SearchResponse {
    /// Always `true`; a missing snapshot is reported as an error instead.
    exists: bool,
    /// Number of entries in `data`.
    count: usize,
    /// One entry per resolved name, in request order.
    data: Vec<MatchResult>,
}

/// Handler for `POST /search/professors`.
///
/// Resolves each requested name against the snapshot. A body that is not
/// JSON, or whose `professors` field is not a list of strings, is rejected
/// with `bad_request`.
async fn handle_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    tracing::info!(names = req.professors.len(), "received search request");

    let roster = load_roster(&state).await?;
    let data = resolve_batch(&roster, &req.professors, &state.config.matching);

    Ok(Json(SearchResponse {
        exists: true,
        count: data.len(),
        data,
    }))
}

// ============ GET /sample_data ============

/// Response body for `GET /sample_data`.
#[derive(Serialize)]
struct SampleResponse {
    exists: bool,
    /// Total number of records in the snapshot.
    count: usize,
    /// The first `[server].sample_size` records.
    sample_data: Vec<InstructorRecord>,
}

/// Handler for `GET /sample_data`.
async fn handle_sample(State(state): State<AppState>) -> Result<Json<SampleResponse>, AppError> {
    let mut roster = load_roster(&state).await?;
    let count = roster.len();
    roster.truncate(state.config.server.sample_size);

    Ok(Json(SampleResponse {
        exists: true,
        count,
        sample_data: roster,
    }))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

/// Handler for `GET /health`.
///
/// Does not touch the snapshot, so it answers even before the first crawl.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
