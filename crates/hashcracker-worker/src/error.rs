use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Worker-side error taxonomy. Each variant maps to one class in the
/// shared error taxonomy and to a fixed HTTP status (§7).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("task already exists: {0}")]
    Conflict(String),
    #[error("worker is at capacity")]
    CapacityExceeded,
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn get_label(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<hashcracker_common::Error> for Error {
    fn from(err: hashcracker_common::Error) -> Self {
        Error::InvalidInput(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::CapacityExceeded => StatusCode::SERVICE_UNAVAILABLE,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": self.get_label(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
