use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The two not-found variants carry the same 404 status but the
/// endpoint-specific codes the API contract promises (`ANALYSIS_NOT_FOUND`
/// for optimize, `SESSION_NOT_FOUND` for download). Neither reveals whether
/// the case ever existed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resume file is required")]
    FileRequired,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Unable to parse resume: {0}")]
    ParseError(String),

    #[error("AI service unavailable: {0}")]
    AiUnavailable(String),

    #[error("Analysis not found")]
    AnalysisNotFound,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Optimization not found")]
    OptimizationNotFound,

    #[error("Failed to generate document: {0}")]
    Generation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::UnsupportedFileType(msg) => AppError::UnsupportedFileType(msg),
            ExtractError::Parse(msg) => AppError::ParseError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::FileRequired => (
                StatusCode::BAD_REQUEST,
                "FILE_REQUIRED",
                "Resume file is required".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedFileType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FILE_TYPE",
                format!("Unsupported file type: {msg}"),
            ),
            AppError::ParseError(msg) => (
                StatusCode::BAD_REQUEST,
                "PARSE_ERROR",
                format!("Unable to parse resume: {msg}"),
            ),
            AppError::AiUnavailable(msg) => {
                tracing::error!("AI collaborator error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "AI_UNAVAILABLE",
                    "AI service temporarily unavailable. Please try again later.".to_string(),
                )
            }
            AppError::AnalysisNotFound => (
                StatusCode::NOT_FOUND,
                "ANALYSIS_NOT_FOUND",
                "The analysis result could not be found or has expired".to_string(),
            ),
            AppError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                "The session could not be found or has expired".to_string(),
            ),
            AppError::OptimizationNotFound => (
                StatusCode::BAD_REQUEST,
                "OPTIMIZATION_NOT_FOUND",
                "Resume must be optimized before downloading".to_string(),
            ),
            AppError::Generation(msg) => {
                tracing::error!("Document generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_ERROR",
                    "Failed to generate resume".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERVER_ERROR",
                    "An unexpected error occurred while processing your request".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
