//! AI collaborators — scorer, suggester, and filename generator.
//!
//! [`AtsEngine`] is the trait boundary the pipeline controller depends on;
//! [`LlmAtsEngine`] is the Claude-backed implementation. Tests substitute
//! stub engines, so nothing in the pipeline ever needs a network.

pub mod prompts;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::{CallBudget, LlmClient, LlmError};
use crate::pipeline::models::{Assessment, Edit, SuggestionSet};

/// Collaborator failure. The pipeline surfaces this as `AI_UNAVAILABLE`
/// without retrying (the client's transport-level backoff already ran).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("AI collaborator unavailable: {0}")]
    Unavailable(String),
}

impl From<LlmError> for EngineError {
    fn from(e: LlmError) -> Self {
        EngineError::Unavailable(e.to_string())
    }
}

/// External scorer / suggester / namer collaborators behind one seam.
///
/// Carried by the pipeline as `Arc<dyn AtsEngine>`.
#[async_trait]
pub trait AtsEngine: Send + Sync {
    /// Scores a resume against a job description.
    async fn analyze(
        &self,
        source_text: &str,
        criteria_text: &str,
    ) -> Result<Assessment, EngineError>;

    /// Proposes edits for a resume that scored below the quality bar.
    async fn optimize(
        &self,
        source_text: &str,
        criteria_text: &str,
        assessment: &Assessment,
    ) -> Result<SuggestionSet, EngineError>;

    /// Derives a download filename from the resume and job description.
    /// Infallible by contract: implementations fall back to a dated default.
    async fn suggest_filename(&self, source_text: &str, criteria_text: &str) -> String;
}

/// Optimization payload as the model returns it. `baseline_score` is not the
/// model's to invent; the engine fills it from the stored assessment.
#[derive(Debug, Deserialize)]
struct SuggestionDraft {
    projected_score: u32,
    edits: Vec<Edit>,
    general_notes: Vec<String>,
    proposed_name: String,
}

/// Claude-backed [`AtsEngine`].
pub struct LlmAtsEngine {
    llm: LlmClient,
}

impl LlmAtsEngine {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl AtsEngine for LlmAtsEngine {
    async fn analyze(
        &self,
        source_text: &str,
        criteria_text: &str,
    ) -> Result<Assessment, EngineError> {
        let prompt = prompts::ANALYZE_PROMPT_TEMPLATE
            .replace("{criteria_text}", criteria_text)
            .replace("{source_text}", source_text);

        let mut assessment: Assessment = self
            .llm
            .call_json(&prompt, prompts::ANALYZE_SYSTEM, CallBudget::ANALYSIS)
            .await?;

        assessment.score = assessment.score.min(100);
        info!("analysis complete: score={}", assessment.score);
        Ok(assessment)
    }

    async fn optimize(
        &self,
        source_text: &str,
        criteria_text: &str,
        assessment: &Assessment,
    ) -> Result<SuggestionSet, EngineError> {
        let prompt = prompts::OPTIMIZE_PROMPT_TEMPLATE
            .replace("{criteria_text}", criteria_text)
            .replace("{source_text}", source_text)
            .replace("{score}", &assessment.score.to_string())
            .replace("{missing_terms}", &assessment.missing_terms.join(", "));

        let draft: SuggestionDraft = self
            .llm
            .call_json(&prompt, prompts::OPTIMIZE_SYSTEM, CallBudget::OPTIMIZATION)
            .await?;

        info!(
            "optimization complete: {} edit(s), projected score {}",
            draft.edits.len(),
            draft.projected_score
        );

        Ok(SuggestionSet {
            baseline_score: assessment.score,
            projected_score: draft.projected_score.min(100),
            edits: draft.edits,
            general_notes: draft.general_notes,
            proposed_name: sanitize_filename(&draft.proposed_name),
        })
    }

    async fn suggest_filename(&self, source_text: &str, criteria_text: &str) -> String {
        let prompt = prompts::FILENAME_PROMPT_TEMPLATE
            .replace("{source_excerpt}", excerpt(source_text, 1000))
            .replace("{criteria_excerpt}", excerpt(criteria_text, 500));

        match self
            .llm
            .call_text(&prompt, prompts::FILENAME_SYSTEM, CallBudget::FILENAME)
            .await
        {
            Ok(name) => sanitize_filename(&name),
            Err(e) => {
                warn!("filename generation failed, using fallback: {e}");
                fallback_filename()
            }
        }
    }
}

/// First `max` bytes of `text`, cut back to a char boundary.
fn excerpt(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Reduces a proposed filename to `[A-Za-z0-9_-]`, collapsing runs of
/// underscores and capping at 255 chars. Empty results get the fallback.
pub fn sanitize_filename(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_underscore = false;
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return fallback_filename();
    }
    trimmed.chars().take(255).collect()
}

fn fallback_filename() -> String {
    format!("Resume_{}", chrono::Utc::now().format("%Y-%m-%d"))
}
