//! Data model for the analyze → optimize → download pipeline.

use serde::{Deserialize, Serialize};

/// Scored compatibility result produced by the analysis collaborator.
///
/// Computed once per case at analyze time; `request_optimization` reads it
/// but never recomputes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// ATS compatibility score, 0–100.
    pub score: u32,
    /// Whether the resume is worth optimizing for this job description.
    pub needs_work: bool,
    /// Job-description keywords found in the resume.
    pub matched_terms: Vec<String>,
    /// Job-description keywords absent from the resume.
    pub missing_terms: Vec<String>,
    /// Free-text reasoning behind the score.
    pub narrative: String,
}

/// One proposed fragment-level text substitution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edit {
    /// Unique within its [`SuggestionSet`].
    pub id: String,
    /// Resume section the edit targets (e.g. "Experience").
    pub section: String,
    /// Exact fragment of the current resume text to replace.
    pub original: String,
    /// Replacement fragment.
    pub suggested: String,
    pub rationale: String,
}

/// Proposed edits and metadata produced by the optimization collaborator.
///
/// Produced at most once per case; re-running optimize overwrites the stored
/// set (last-writer-wins, matching the upstream behavior).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionSet {
    /// Score the case had before optimization.
    pub baseline_score: u32,
    /// Expected score if every edit is accepted.
    pub projected_score: u32,
    /// Ordered — the change application engine applies these sequentially.
    pub edits: Vec<Edit>,
    pub general_notes: Vec<String>,
    /// Suggested download filename (sanitized, extension-free).
    pub proposed_name: String,
}

impl SuggestionSet {
    /// Synthetic set returned when a case already meets the quality bar:
    /// nothing to change, projected equals baseline.
    pub fn already_optimized(score: u32, proposed_name: String) -> Self {
        Self {
            baseline_score: score,
            projected_score: score,
            edits: vec![],
            general_notes: vec![
                "Your resume is already well-optimized for this job.".to_string()
            ],
            proposed_name,
        }
    }
}
