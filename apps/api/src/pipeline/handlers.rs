//! Axum route handlers for the analyze / optimize / download API.

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{extract_text, FileKind};
use crate::pipeline::controller::PipelineError;
use crate::pipeline::models::{Assessment, SuggestionSet};
use crate::state::AppState;

const JOB_DESCRIPTION_MIN_CHARS: usize = 10;
const JOB_DESCRIPTION_MAX_CHARS: usize = 10_000;
const FILENAME_MAX_CHARS: usize = 255;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub case_id: Uuid,
    #[serde(flatten)]
    pub assessment: Assessment,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub case_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub case_id: Uuid,
    pub accepted_ids: Vec<String>,
    pub filename: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/analyze (multipart: `resume_file`, `job_description`)
///
/// Extracts text from the upload, scores it against the job description, and
/// returns the new case id with the assessment.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume_file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or(AppError::FileRequired)?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                upload = Some((filename, data));
            }
            Some("job_description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field: {e}")))?;
                job_description = Some(text);
            }
            _ => {}
        }
    }

    let (filename, data) = upload.ok_or(AppError::FileRequired)?;
    let criteria_text = job_description
        .ok_or_else(|| AppError::Validation("Job description is required".to_string()))?;
    validate_job_description(&criteria_text)?;

    tracing::info!("processing analyze request for file: {filename}");

    let kind = FileKind::from_filename(&filename)?;
    let source_text = tokio::task::spawn_blocking(move || extract_text(&data, kind))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    if source_text.trim().is_empty() {
        return Err(AppError::ParseError(
            "extracted resume text is empty".to_string(),
        ));
    }

    let (case_id, assessment) = state
        .pipeline
        .begin_analysis(source_text, criteria_text)
        .await
        .map_err(analyze_error)?;

    Ok(Json(AnalyzeResponse {
        case_id,
        assessment,
    }))
}

/// POST /api/optimize
///
/// Returns optimization suggestions for an analyzed case, or an empty-edits
/// short-circuit when the score already meets the quality bar.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> Result<Json<SuggestionSet>, AppError> {
    tracing::info!("processing optimize request for case: {}", request.case_id);

    let suggestions = state
        .pipeline
        .request_optimization(request.case_id)
        .await
        .map_err(optimize_error)?;

    Ok(Json(suggestions))
}

/// POST /api/download
///
/// Applies the accepted subset of edits and streams the rendered PDF.
pub async fn handle_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response, AppError> {
    tracing::info!("processing download request for case: {}", request.case_id);
    validate_filename(&request.filename)?;

    let final_text = state
        .pipeline
        .finalize_download(request.case_id, &request.accepted_ids)
        .await
        .map_err(download_error)?;

    let renderer = state.renderer.clone();
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&final_text))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Generation(e.to_string()))?;

    let disposition = format!("attachment; filename=\"{}.pdf\"", request.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(bytes),
    )
        .into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Validation and error mapping
// ────────────────────────────────────────────────────────────────────────────

fn validate_job_description(text: &str) -> Result<(), AppError> {
    let len = text.trim().chars().count();
    if len < JOB_DESCRIPTION_MIN_CHARS {
        return Err(AppError::Validation(format!(
            "Job description must be at least {JOB_DESCRIPTION_MIN_CHARS} characters"
        )));
    }
    if len > JOB_DESCRIPTION_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Job description cannot exceed {JOB_DESCRIPTION_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_filename(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name.chars().count() > FILENAME_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "Filename must be between 1 and {FILENAME_MAX_CHARS} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "Filename can only contain letters, numbers, underscores, and hyphens".to_string(),
        ));
    }
    Ok(())
}

fn analyze_error(e: PipelineError) -> AppError {
    match e {
        PipelineError::UpstreamUnavailable(msg) => AppError::AiUnavailable(msg),
        PipelineError::Unexpected(e) => AppError::Internal(e),
        // Analyze never looks up an existing case.
        PipelineError::CaseNotFound | PipelineError::OptimizationMissing => {
            AppError::Internal(anyhow::anyhow!(e))
        }
    }
}

fn optimize_error(e: PipelineError) -> AppError {
    match e {
        PipelineError::CaseNotFound => AppError::AnalysisNotFound,
        PipelineError::OptimizationMissing => AppError::OptimizationNotFound,
        PipelineError::UpstreamUnavailable(msg) => AppError::AiUnavailable(msg),
        PipelineError::Unexpected(e) => AppError::Internal(e),
    }
}

fn download_error(e: PipelineError) -> AppError {
    match e {
        PipelineError::CaseNotFound => AppError::SessionNotFound,
        PipelineError::OptimizationMissing => AppError::OptimizationNotFound,
        PipelineError::UpstreamUnavailable(msg) => AppError::AiUnavailable(msg),
        PipelineError::Unexpected(e) => AppError::Internal(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_accepts_contract_charset() {
        assert!(validate_filename("Jane_Doe_Backend-Engineer_2026").is_ok());
        assert!(validate_filename("a").is_ok());
    }

    #[test]
    fn test_filename_rejects_empty_and_overlong() {
        assert!(validate_filename("").is_err());
        assert!(validate_filename(&"a".repeat(256)).is_err());
        assert!(validate_filename(&"a".repeat(255)).is_ok());
    }

    #[test]
    fn test_filename_rejects_path_and_special_characters() {
        assert!(validate_filename("../etc/passwd").is_err());
        assert!(validate_filename("resume.pdf").is_err());
        assert!(validate_filename("my resume").is_err());
    }

    #[test]
    fn test_job_description_length_bounds() {
        assert!(validate_job_description("too short").is_err());
        assert!(validate_job_description("Senior Python Engineer role").is_ok());
        assert!(validate_job_description(&"x".repeat(10_001)).is_err());
        assert!(validate_job_description(&"x".repeat(10_000)).is_ok());
    }

    #[test]
    fn test_not_found_maps_per_endpoint() {
        assert!(matches!(
            optimize_error(PipelineError::CaseNotFound),
            AppError::AnalysisNotFound
        ));
        assert!(matches!(
            download_error(PipelineError::CaseNotFound),
            AppError::SessionNotFound
        ));
    }

    #[test]
    fn test_analyze_response_flattens_assessment() {
        let response = AnalyzeResponse {
            case_id: Uuid::nil(),
            assessment: Assessment {
                score: 40,
                needs_work: true,
                matched_terms: vec![],
                missing_terms: vec!["Django".to_string()],
                narrative: "n".to_string(),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["score"], 40);
        assert!(json["case_id"].is_string());
    }
}
