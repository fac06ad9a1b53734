//! Change application engine: applies an accepted subset of proposed edits
//! to source text.
//!
//! Edits are applied sequentially, each against the previous edit's output,
//! replacing the first occurrence of the original fragment. This chaining is
//! a load-bearing contract: an edit may legitimately target text introduced
//! by an earlier edit. The flip side is that applying the same list twice is
//! not guaranteed idempotent when one edit's suggested fragment equals
//! another edit's original fragment.

use tracing::warn;

use crate::pipeline::models::Edit;

/// Result of applying an edit list, with skip accounting for observability.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub text: String,
    /// Edits whose original fragment was found and replaced.
    pub applied: usize,
    /// Edits whose original fragment was absent from the working text at
    /// their turn (already altered by a prior edit, or a text mismatch).
    pub skipped: usize,
}

/// Applies `edits` in order to `base_text`.
///
/// Deterministic: the same ordered list against the same base text always
/// yields the same result. A missing fragment is a logged no-op, never an
/// error.
pub fn apply_edits(base_text: &str, edits: &[Edit]) -> ApplyOutcome {
    let mut text = base_text.to_string();
    let mut applied = 0;
    let mut skipped = 0;

    for edit in edits {
        match text.find(&edit.original) {
            Some(at) => {
                text.replace_range(at..at + edit.original.len(), &edit.suggested);
                applied += 1;
            }
            None => {
                warn!(
                    edit_id = %edit.id,
                    section = %edit.section,
                    "edit fragment not found in working text; skipping"
                );
                skipped += 1;
            }
        }
    }

    ApplyOutcome {
        text,
        applied,
        skipped,
    }
}
