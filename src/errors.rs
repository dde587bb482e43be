use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use thiserror::Error;

/// Failure kinds of a single forecast run.
///
/// Validation and preprocessing errors abort the run. `ModelInvocation` and
/// `DegenerateTrend` are also carried inside otherwise successful results to
/// mark a truncated daily forecast or a flat yearly fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Insufficient data: need at least {required} data points, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("Model invocation failed at step {step}: {reason}")]
    ModelInvocation { step: usize, reason: String },
    #[error("Degenerate trend: {points} forecast point(s), at least 2 are needed")]
    DegenerateTrend { points: usize },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forecast model is not loaded")]
    ModelUnavailable,
    #[error("Forecast failed: {0}")]
    ForecastFailed(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::ModelUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "Forecast model is not loaded").into_response()
            }
            AppError::ForecastFailed(msg) => (StatusCode::BAD_GATEWAY, msg).into_response(),
        }
    }
}

impl From<ForecastError> for AppError {
    fn from(value: ForecastError) -> Self {
        match value {
            ForecastError::ModelInvocation { .. } => AppError::ForecastFailed(value.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
