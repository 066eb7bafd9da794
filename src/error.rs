// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

/// Raised when a batch's quantity values are bad. Converted to a 422 at the
/// request boundary; the batch is left in its prior persisted state.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct QuantityValidationError(String);

impl QuantityValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug)]
pub enum AppError {
    Database(sqlx::Error),
    Unauthorized(String),
    NotFound(String),
    /// Malformed client input (400), e.g. a non-digit UPC.
    Validation(String),
    /// Well-formed input violating a domain invariant (422).
    Unprocessable(String),
    Conflict(String),
    /// Server-side misconfiguration, distinct from client-input errors.
    Config(String),
    Internal(String),
    /// Upstream provider fault, surfaced with the upstream status and body
    /// for diagnosis. `status` is None when the provider was unreachable.
    Gateway {
        provider: &'static str,
        status: Option<u16>,
        body: String,
    },
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        AppError::Unprocessable(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn gateway(provider: &'static str, status: Option<u16>, body: impl Into<String>) -> Self {
        AppError::Gateway { provider, status, body: body.into() }
    }

    pub fn db(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

/// Maps a Postgres unique violation (23505) to a 409 with `message`;
/// anything else passes through.
pub fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AppError::conflict(message)
        }
        other => other.into(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(ref e) => {
                tracing::error!(error=%e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "Database error occurred"}))
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({"error": msg})),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"error": msg})),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, json!({"error": msg})),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({"error": msg})),
            AppError::Config(msg) => {
                tracing::error!(%msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": msg}))
            }
            AppError::Internal(msg) => {
                tracing::error!(%msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "Internal server error"}))
            }
            AppError::Gateway { provider, status, body } => {
                tracing::error!(provider, ?status, "Upstream provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": "Upstream provider error",
                        "provider": provider,
                        "upstream_status": status,
                        "upstream_body": body,
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<QuantityValidationError> for AppError {
    fn from(err: QuantityValidationError) -> Self {
        AppError::Unprocessable(err.to_string())
    }
}
