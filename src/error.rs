use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::ledger::models::ContentId;
use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("External error: {0}")]
    ExternalError(String),
}

/// Ledger client errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to list known content ids: {0}")]
    ContentListing(String),

    #[error("Storage relationship lookup failed for {content_id}: {message}")]
    RelationshipLookup { content_id: ContentId, message: String },

    #[error("Chain call {call} failed for {target}: {message}")]
    ChainCall {
        call: &'static str,
        target: String,
        message: String,
    },

    #[error("Failed to resolve address of {content_id}: {message}")]
    AddressResolution { content_id: ContentId, message: String },

    #[error("Ledger transport error: {0}")]
    Transport(String),

    #[error("Malformed ledger response: {0}")]
    Decode(String),
}

/// Storage backend errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Stat failed for {content_id}: {message}")]
    Stat { content_id: ContentId, message: String },

    #[error("Synchronize failed for {content_id}: {message}")]
    Sync { content_id: ContentId, message: String },

    #[error("Content {0} has no physical address on the ledger")]
    Unresolvable(ContentId),
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Not found: {}", what),
                None,
            ),
            AppError::Ledger(LedgerError::ContentListing(message)) => (
                StatusCode::BAD_GATEWAY,
                "LEDGER_UNAVAILABLE",
                "Ledger content listing failed".to_string(),
                Some(serde_json::json!({ "reason": message })),
            ),
            AppError::Ledger(LedgerError::Transport(_)) | AppError::ExternalError(_) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "An upstream service failed".to_string(),
                None,
            ),
            AppError::Storage(err) => (
                StatusCode::BAD_GATEWAY,
                "STORAGE_ERROR",
                err.to_string(),
                None,
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: message,
            error_code: error_code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::ExternalError(format!("HTTP request error: {:?}", error))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
