use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("No token provided.")]
    Unauthenticated,

    #[error("Invalid or expired token.")]
    TokenInvalid,

    #[error("Submitted total {submitted} does not match the computed total {computed}.")]
    PriceMismatch { submitted: i64, computed: i64 },

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::PriceMismatch { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::TokenInvalid => (StatusCode::FORBIDDEN, self.to_string()),
            // Pool-acquire timeouts are the bounded-timeout signal for a store
            // outage; everything else from the store is a generic 500 so no
            // driver detail leaks to clients.
            AppError::DbError(sqlx::Error::PoolTimedOut)
            | AppError::OrmError(sea_orm::DbErr::ConnectionAcquire(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable.".to_string(),
            ),
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred. Please try again.".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = ?self, "request failed");
        }

        let body = ErrorBody { error: message };
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
