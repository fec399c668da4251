//! HTTP API handlers for taxonomy-api

pub mod health;
pub mod jobs;
pub mod skills;
pub mod xblocks;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Handler errors mapped to HTTP status codes
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    InvalidParameter(String),
    DatabaseError(String),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("resource not found".to_string()),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {}", what)),
            ApiError::InvalidParameter(msg) => {
                (StatusCode::BAD_REQUEST, format!("Invalid parameter: {}", msg))
            }
            ApiError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
