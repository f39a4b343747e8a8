//! Error handling for the pricing service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::pricing::responses::PricingErrorResponse;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Pricing region not found: {0}")]
    RegionNotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Stale configuration: {0}")]
    StaleConfiguration(String),

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error kind, used in JSON error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::RegionNotFound(_) => "region_not_found",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::BackendUnavailable(_) => "backend_unavailable",
            AppError::StaleConfiguration(_) => "stale_configuration",
            AppError::NotFound => "not_found",
            AppError::Database(_) => "backend_unavailable",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::RegionNotFound(_) | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::BackendUnavailable(msg) => {
                tracing::error!("Backend unavailable: {}", msg);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::StaleConfiguration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Database details stay in the logs
        let message = match &self {
            AppError::Database(_) => "Price unavailable, try again".to_string(),
            other => other.to_string(),
        };

        let body = PricingErrorResponse {
            error_type: self.kind().to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
