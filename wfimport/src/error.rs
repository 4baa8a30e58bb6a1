//! Error types for wfimport
//!
//! `ImportError` is the per-file and per-submission taxonomy. Every variant
//! renders as the human-readable reason shown in the status area.
//! `ApiError` is the HTTP-facing error of the command layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Import error taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// No eligible image files in a submission
    #[error("{0}")]
    Validation(String),

    /// Transport failure or non-success HTTP status during extraction
    #[error("{0}")]
    Network(String),

    /// Service ran but found no usable embedded payload
    #[error("{0}")]
    Extraction(String),

    /// Malformed JSON/graph payload
    #[error("{0}")]
    Parse(String),

    /// Host rejected the graph
    #[error("{0}")]
    Load(String),

    /// A batch is already running on this session
    #[error("Import already in progress")]
    Busy,

    /// Files submitted while the session is closed
    #[error("Import dialog is not open")]
    SessionClosed,

    /// Batch task ended without producing an outcome
    #[error("Import failed: {0}")]
    Internal(String),
}

impl ImportError {
    /// Submission contained no `image/*` entries
    pub fn no_valid_images() -> Self {
        ImportError::Validation("No valid image files found".to_string())
    }

    /// Stable machine-readable code for logs and API bodies
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::Validation(_) => "VALIDATION_ERROR",
            ImportError::Network(_) => "NETWORK_ERROR",
            ImportError::Extraction(_) => "EXTRACTION_ERROR",
            ImportError::Parse(_) => "PARSE_ERROR",
            ImportError::Load(_) => "LOAD_ERROR",
            ImportError::Busy => "BUSY",
            ImportError::SessionClosed => "SESSION_CLOSED",
            ImportError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable reason (same as `Display`)
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Import controller rejection
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Import(ref err) => {
                let status = match err {
                    ImportError::Busy | ImportError::SessionClosed => StatusCode::CONFLICT,
                    ImportError::Validation(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code(), err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
