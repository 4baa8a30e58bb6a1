//! Import session API handlers
//!
//! POST /import/toggle, /import/open, /import/close, /import/files;
//! GET /import/status, /import/events

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::sse::{Event, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::{
    error::{ApiError, ApiResult},
    models::{BatchClassification, BatchOutcome, ImageFile, SessionSnapshot},
    AppState,
};

/// Upload size limit for one submission
const MAX_SUBMISSION_BYTES: usize = 256 * 1024 * 1024;

/// POST /import/files response
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitFilesResponse {
    #[serde(flatten)]
    pub outcome: BatchOutcome,
    pub classification: BatchClassification,
}

impl From<BatchOutcome> for SubmitFilesResponse {
    fn from(outcome: BatchOutcome) -> Self {
        let classification = outcome.classification();
        Self {
            outcome,
            classification,
        }
    }
}

/// POST /import/toggle
pub async fn toggle_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.toggle().await)
}

/// POST /import/open
pub async fn open_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.open().await)
}

/// POST /import/close
pub async fn close_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.close().await)
}

/// GET /import/status
pub async fn session_status(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.snapshot().await)
}

/// POST /import/files
///
/// Multipart body; every part with a file name is one submitted file,
/// declared MIME type taken from the part's content type.
pub async fn submit_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<SubmitFilesResponse>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            tracing::debug!(field = ?field.name(), "Ignoring non-file multipart field");
            continue;
        };
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", name, e)))?;

        files.push(ImageFile::new(name, mime_type, data.to_vec()));
    }

    tracing::info!(files = files.len(), "Files submitted for import");

    let outcome = state.controller.submit_files(files).await?;
    Ok(Json(SubmitFilesResponse::from(outcome)))
}

/// GET /import/events - SSE stream of import events
pub async fn import_event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    wfimport_common::sse::create_event_sse_stream(&state.event_bus, "wfimport")
}

/// Build import session routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/import/toggle", post(toggle_session))
        .route("/import/open", post(open_session))
        .route("/import/close", post(close_session))
        .route("/import/status", get(session_status))
        .route(
            "/import/files",
            post(submit_files).layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES)),
        )
        .route("/import/events", get(import_event_stream))
}
