//! HTTP error mapping

use crate::query::{ErrorKind, QueryError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the query API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request parameters failed validation before reaching the query service
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    /// A blocking worker died before producing a result
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Query(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Failure => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        let body = match &self {
            Self::Query(QueryError::PageOutOfRange {
                total_items,
                total_pages,
            }) => json!({
                "message": message,
                "total_items": total_items,
                "total_pages": total_pages,
            }),
            Self::Query(_) if status == StatusCode::NOT_FOUND => json!({ "message": message }),
            _ => {
                if status.is_server_error() {
                    tracing::error!(error = %message, "Query API request failed");
                }
                json!({ "error": message })
            }
        };

        (status, Json(body)).into_response()
    }
}
