use axum::{http::StatusCode, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("origin denied")]
    OriginDenied,
    #[error("rate limited")]
    RateLimited,
    #[error("request too large")]
    RequestTooLarge,
    #[error("not found")]
    NotFound,
    #[error("tool error: {0}")]
    ToolError(String),
    #[error("failed to launch validator: {0}")]
    LaunchFailed(String),
    /// Any non-zero exit from the interpreter, including a missing
    /// validator script (the interpreter reports that as exit 2 on
    /// stderr rather than a spawn failure).
    #[error("validator exited with status {code:?}: {stderr}")]
    ValidatorFailed { code: Option<i32>, stderr: String },
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "Unauthorized",
            AppError::OriginDenied => "OriginDenied",
            AppError::RateLimited => "RateLimited",
            AppError::RequestTooLarge => "RequestTooLarge",
            AppError::NotFound => "NotFound",
            AppError::ToolError(_) => "ToolError",
            AppError::LaunchFailed(_) => "LaunchFailed",
            AppError::ValidatorFailed { .. } => "ValidatorFailed",
            AppError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::OriginDenied => StatusCode::FORBIDDEN,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::ToolError(_) => StatusCode::BAD_REQUEST,
            AppError::LaunchFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::ValidatorFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn into_response(err: AppError) -> (StatusCode, Json<ErrorBody>) {
    let code = err.code();
    let message = err.to_string();
    (err.status(), Json(ErrorBody { code, message }))
}
