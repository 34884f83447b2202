//! Error types for sleepscan-predict
//!
//! `AdapterError` is the transport-agnostic failure of one prediction;
//! `ApiError` maps it (and HTTP-level failures) onto JSON responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::engine::EngineError;
use crate::schema::Column;

/// Failure of a single upload → prediction pass
///
/// Every variant is raised where it is detected; nothing is retried or
/// defaulted, and input errors are always raised before the engine runs.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Upload bytes are not UTF-8 text
    #[error("Upload is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Missing header, broken CSV structure, or a row missing required columns
    #[error("Malformed table: {0}")]
    MalformedTable(String),

    /// Fewer data rows than the movement series needs
    #[error("Insufficient rows: found {found} data rows, at least {required} required")]
    InsufficientRows { found: usize, required: usize },

    /// A required field could not be read as a real number
    #[error("{column} in data row {row} is not a number: {value:?}")]
    FieldType {
        /// 0-based data row (header excluded)
        row: usize,
        column: Column,
        value: String,
    },

    /// Inference call failed or returned nothing usable
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl AdapterError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::Encoding(_) => "ENCODING_ERROR",
            AdapterError::MalformedTable(_) => "MALFORMED_TABLE",
            AdapterError::InsufficientRows { .. } => "INSUFFICIENT_ROWS",
            AdapterError::FieldType { .. } => "FIELD_TYPE_ERROR",
            AdapterError::Engine(_) => "ENGINE_ERROR",
        }
    }

    /// Column index the error refers to, if any
    pub fn column(&self) -> Option<usize> {
        match self {
            AdapterError::FieldType { column, .. } => Some(column.index()),
            _ => None,
        }
    }

    /// True when the uploaded file is at fault rather than the model
    pub fn is_input_error(&self) -> bool {
        !matches!(self, AdapterError::Engine(_))
    }
}

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400), e.g. no `file` field in the form
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Upload exceeds the configured size limit (413)
    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    /// Prediction failed; status depends on whether the file or the model is at fault
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, column) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg, None)
            }
            ApiError::Adapter(ref err) => {
                let status = if err.is_input_error() {
                    StatusCode::UNPROCESSABLE_ENTITY
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, err.code(), err.to_string(), err.column())
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let Some(column) = column {
            error["column"] = json!(column);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
