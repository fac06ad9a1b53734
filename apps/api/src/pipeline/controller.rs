//! Pipeline controller — enforces the legal ordering of
//! analyze → optimize → download against a case.
//!
//! The controller owns no synchronization of its own; the injected
//! [`CaseStore`] is the only shared mutable resource. Collaborator calls run
//! under an explicit deadline so a hung upstream surfaces as
//! `UpstreamUnavailable` instead of stalling a request forever.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::ai::{sanitize_filename, AtsEngine, EngineError};
use crate::pipeline::apply::apply_edits;
use crate::pipeline::models::{Assessment, SuggestionSet};
use crate::session::{Case, CaseStore};

/// Cases scoring at or above this need no optimization pass.
pub const GOOD_ENOUGH_SCORE: u32 = 92;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Unknown id or expired case. Deliberately indistinguishable: callers
    /// learn nothing about whether the id ever existed.
    #[error("case not found or expired")]
    CaseNotFound,

    /// Download attempted before optimize produced a suggestion set.
    #[error("case has not been optimized yet")]
    OptimizationMissing,

    /// Scorer or suggester failed or timed out. The case's prior state is
    /// untouched.
    #[error("upstream collaborator failed: {0}")]
    UpstreamUnavailable(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Orchestrates the three pipeline operations against the case store and the
/// AI collaborators.
pub struct Pipeline {
    store: Arc<dyn CaseStore>,
    engine: Arc<dyn AtsEngine>,
    /// Deadline applied to each collaborator call.
    upstream_deadline: Duration,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn CaseStore>,
        engine: Arc<dyn AtsEngine>,
        upstream_deadline: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            upstream_deadline,
        }
    }

    /// Creates a new case: scores the resume against the job description and
    /// stores the full case under a fresh id.
    ///
    /// On scorer failure nothing is stored — there is no partial case to
    /// clean up, and a retry simply allocates another id.
    pub async fn begin_analysis(
        &self,
        source_text: String,
        criteria_text: String,
    ) -> Result<(Uuid, Assessment), PipelineError> {
        let id = Uuid::new_v4();
        info!("beginning analysis for case {id}");

        let assessment = self
            .deadline(self.engine.analyze(&source_text, &criteria_text), "analysis")
            .await?;

        let case = Case::new(id, source_text, criteria_text, assessment.clone());
        self.store.put(case).await?;

        Ok((id, assessment))
    }

    /// Produces optimization suggestions for an analyzed case.
    ///
    /// Short-circuits without calling the suggester when the stored score
    /// already meets [`GOOD_ENOUGH_SCORE`]; the synthetic result is not
    /// written back, so the case keeps whatever suggestion set it had.
    /// Otherwise the new suggestion set overwrites any previous one
    /// (last-writer-wins, matching the upstream system's behavior).
    pub async fn request_optimization(
        &self,
        case_id: Uuid,
    ) -> Result<SuggestionSet, PipelineError> {
        let mut case = self
            .store
            .get(case_id)
            .await?
            .ok_or(PipelineError::CaseNotFound)?;

        let score = case.assessment.score;
        if score >= GOOD_ENOUGH_SCORE {
            info!("case {case_id} already at {score}, skipping optimization");
            let name = match tokio::time::timeout(
                self.upstream_deadline,
                self.engine
                    .suggest_filename(&case.source_text, &case.criteria_text),
            )
            .await
            {
                Ok(name) => name,
                // Filename generation is best-effort; a hung namer must not
                // fail the request.
                Err(_) => sanitize_filename(""),
            };
            return Ok(SuggestionSet::already_optimized(score, name));
        }

        let suggestions = self
            .deadline(
                self.engine
                    .optimize(&case.source_text, &case.criteria_text, &case.assessment),
                "optimization",
            )
            .await?;

        case.suggestion_set = Some(suggestions.clone());
        self.store.put(case).await?;

        Ok(suggestions)
    }

    /// Applies the accepted subset of suggested edits and returns the final
    /// text. Read-only with respect to the stored case and repeatable until
    /// the case expires. Accepted ids that match no edit are ignored.
    pub async fn finalize_download(
        &self,
        case_id: Uuid,
        accepted_ids: &[String],
    ) -> Result<String, PipelineError> {
        let case = self
            .store
            .get(case_id)
            .await?
            .ok_or(PipelineError::CaseNotFound)?;

        let suggestions = case
            .suggestion_set
            .as_ref()
            .ok_or(PipelineError::OptimizationMissing)?;

        let accepted: HashSet<&str> = accepted_ids.iter().map(String::as_str).collect();
        let selected: Vec<_> = suggestions
            .edits
            .iter()
            .filter(|e| accepted.contains(e.id.as_str()))
            .cloned()
            .collect();

        let outcome = apply_edits(&case.source_text, &selected);
        info!(
            "case {case_id}: applied {} edit(s), skipped {}",
            outcome.applied, outcome.skipped
        );

        Ok(outcome.text)
    }

    async fn deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, EngineError>>,
        what: &str,
    ) -> Result<T, PipelineError> {
        match tokio::time::timeout(self.upstream_deadline, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(PipelineError::UpstreamUnavailable(e.to_string())),
            Err(_) => Err(PipelineError::UpstreamUnavailable(format!(
                "{what} call exceeded {}s deadline",
                self.upstream_deadline.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::Edit;
    use crate::session::memory::InMemoryCaseStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted engine: fixed assessment score, one Django-themed edit,
    /// call counters for short-circuit assertions.
    struct StubEngine {
        score: u32,
        fail_analyze: bool,
        fail_optimize: bool,
        analyze_calls: AtomicUsize,
        optimize_calls: AtomicUsize,
    }

    impl StubEngine {
        fn scoring(score: u32) -> Self {
            Self {
                score,
                fail_analyze: false,
                fail_optimize: false,
                analyze_calls: AtomicUsize::new(0),
                optimize_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl AtsEngine for StubEngine {
        async fn analyze(
            &self,
            _source_text: &str,
            _criteria_text: &str,
        ) -> Result<Assessment, EngineError> {
            self.analyze_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_analyze {
                return Err(EngineError::Unavailable("scorer down".to_string()));
            }
            Ok(Assessment {
                score: self.score,
                needs_work: self.score < GOOD_ENOUGH_SCORE,
                matched_terms: vec!["Python".to_string()],
                missing_terms: vec!["Django".to_string()],
                narrative: "Lacks framework keywords.".to_string(),
            })
        }

        async fn optimize(
            &self,
            _source_text: &str,
            _criteria_text: &str,
            assessment: &Assessment,
        ) -> Result<SuggestionSet, EngineError> {
            self.optimize_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_optimize {
                return Err(EngineError::Unavailable("suggester down".to_string()));
            }
            Ok(SuggestionSet {
                baseline_score: assessment.score,
                projected_score: 85,
                edits: vec![Edit {
                    id: "e1".to_string(),
                    section: "Experience".to_string(),
                    original: "5 yrs Python".to_string(),
                    suggested: "5 years of Python and Django".to_string(),
                    rationale: "Surfaces the missing Django keyword.".to_string(),
                }],
                general_notes: vec![],
                proposed_name: "J_Doe_Senior_Python_Engineer".to_string(),
            })
        }

        async fn suggest_filename(&self, _source_text: &str, _criteria_text: &str) -> String {
            "J_Doe_Senior_Python_Engineer".to_string()
        }
    }

    fn pipeline_over(
        store: Arc<InMemoryCaseStore>,
        engine: StubEngine,
    ) -> (Pipeline, Arc<StubEngine>) {
        let engine = Arc::new(engine);
        let pipeline = Pipeline::new(store, engine.clone(), Duration::from_secs(5));
        (pipeline, engine)
    }

    fn pipeline_with(engine: StubEngine) -> (Pipeline, Arc<StubEngine>) {
        let store = Arc::new(InMemoryCaseStore::new(Duration::from_secs(3600)));
        pipeline_over(store, engine)
    }

    #[tokio::test]
    async fn test_end_to_end_analyze_optimize_download() {
        let (pipeline, _) = pipeline_with(StubEngine::scoring(40));

        let (id, assessment) = pipeline
            .begin_analysis(
                "J. Doe, 5 yrs Python".to_string(),
                "Senior Python Engineer".to_string(),
            )
            .await
            .unwrap();
        assert_eq!(assessment.score, 40);
        assert!(assessment.needs_work);
        assert_eq!(assessment.missing_terms, vec!["Django".to_string()]);

        let suggestions = pipeline.request_optimization(id).await.unwrap();
        assert!(suggestions.edits.iter().any(|e| e.suggested.contains("Django")));

        let accepted = vec![suggestions.edits[0].id.clone()];
        let text = pipeline.finalize_download(id, &accepted).await.unwrap();
        assert!(text.contains("5 years of Python and Django"));
        assert!(!text.contains("5 yrs Python"));
    }

    #[tokio::test]
    async fn test_high_score_short_circuits_without_suggester() {
        let (pipeline, engine) = pipeline_with(StubEngine::scoring(95));

        let (id, _) = pipeline
            .begin_analysis("text".to_string(), "criteria".to_string())
            .await
            .unwrap();

        let suggestions = pipeline.request_optimization(id).await.unwrap();
        assert!(suggestions.edits.is_empty());
        assert_eq!(suggestions.baseline_score, suggestions.projected_score);
        assert_eq!(suggestions.baseline_score, 95);
        assert_eq!(engine.optimize_calls.load(Ordering::SeqCst), 0);

        // The synthetic set is not written back; download still requires a
        // real optimization pass.
        let err = pipeline.finalize_download(id, &[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::OptimizationMissing));
    }

    #[tokio::test]
    async fn test_threshold_boundary_at_92() {
        let (pipeline, engine) = pipeline_with(StubEngine::scoring(92));
        let (id, _) = pipeline
            .begin_analysis("text".to_string(), "criteria".to_string())
            .await
            .unwrap();
        pipeline.request_optimization(id).await.unwrap();
        assert_eq!(engine.optimize_calls.load(Ordering::SeqCst), 0);

        let (pipeline, engine) = pipeline_with(StubEngine::scoring(91));
        let (id, _) = pipeline
            .begin_analysis("text".to_string(), "criteria".to_string())
            .await
            .unwrap();
        pipeline.request_optimization(id).await.unwrap();
        assert_eq!(engine.optimize_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_analysis_failure_stores_no_case() {
        let mut stub = StubEngine::scoring(40);
        stub.fail_analyze = true;
        let (pipeline, _) = pipeline_with(stub);

        let err = pipeline
            .begin_analysis("text".to_string(), "criteria".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamUnavailable(_)));
        // No partial case: any id lookup misses, not just the failed one —
        // the failed call never exposed an id at all.
    }

    #[tokio::test]
    async fn test_optimize_failure_leaves_prior_state_untouched() {
        let store = Arc::new(InMemoryCaseStore::new(Duration::from_secs(3600)));
        let (pipeline, _) = pipeline_over(store.clone(), StubEngine::scoring(40));
        let (id, _) = pipeline
            .begin_analysis("5 yrs Python".to_string(), "criteria".to_string())
            .await
            .unwrap();
        let first = pipeline.request_optimization(id).await.unwrap();

        // Same store, now with a broken suggester.
        let mut broken = StubEngine::scoring(40);
        broken.fail_optimize = true;
        let (failing, _) = pipeline_over(store, broken);
        let err = failing.request_optimization(id).await.unwrap_err();
        assert!(matches!(err, PipelineError::UpstreamUnavailable(_)));

        // The earlier suggestion set survives and download still works.
        let text = pipeline
            .finalize_download(id, &[first.edits[0].id.clone()])
            .await
            .unwrap();
        assert!(text.contains("Django"));
    }

    #[tokio::test]
    async fn test_optimize_unknown_case_is_not_found() {
        let (pipeline, _) = pipeline_with(StubEngine::scoring(40));
        let err = pipeline.request_optimization(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PipelineError::CaseNotFound));
    }

    #[tokio::test]
    async fn test_download_empty_selection_returns_source_unchanged() {
        let (pipeline, _) = pipeline_with(StubEngine::scoring(40));
        let (id, _) = pipeline
            .begin_analysis("J. Doe, 5 yrs Python".to_string(), "criteria".to_string())
            .await
            .unwrap();
        pipeline.request_optimization(id).await.unwrap();

        let text = pipeline.finalize_download(id, &[]).await.unwrap();
        assert_eq!(text, "J. Doe, 5 yrs Python");
    }

    #[tokio::test]
    async fn test_download_ignores_unknown_accepted_ids() {
        let (pipeline, _) = pipeline_with(StubEngine::scoring(40));
        let (id, _) = pipeline
            .begin_analysis("5 yrs Python".to_string(), "criteria".to_string())
            .await
            .unwrap();
        pipeline.request_optimization(id).await.unwrap();

        let accepted = vec!["no-such-edit".to_string(), "e1".to_string()];
        let text = pipeline.finalize_download(id, &accepted).await.unwrap();
        assert!(text.contains("Django"));
    }

    #[tokio::test]
    async fn test_download_is_repeatable() {
        let (pipeline, _) = pipeline_with(StubEngine::scoring(40));
        let (id, _) = pipeline
            .begin_analysis("5 yrs Python".to_string(), "criteria".to_string())
            .await
            .unwrap();
        let suggestions = pipeline.request_optimization(id).await.unwrap();
        let accepted = vec![suggestions.edits[0].id.clone()];

        let first = pipeline.finalize_download(id, &accepted).await.unwrap();
        let second = pipeline.finalize_download(id, &accepted).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_reoptimize_overwrites_suggestion_set() {
        let (pipeline, engine) = pipeline_with(StubEngine::scoring(40));
        let (id, _) = pipeline
            .begin_analysis("5 yrs Python".to_string(), "criteria".to_string())
            .await
            .unwrap();

        pipeline.request_optimization(id).await.unwrap();
        pipeline.request_optimization(id).await.unwrap();
        assert_eq!(engine.optimize_calls.load(Ordering::SeqCst), 2);
    }
}
