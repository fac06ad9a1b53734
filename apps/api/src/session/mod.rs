//! Session storage for in-flight pipeline cases.
//!
//! The [`CaseStore`] trait defines the operations the pipeline controller
//! needs, enabling pluggable backends (in-memory today, an external cache
//! later) without touching pipeline logic. Implementations must be
//! `Send + Sync` and atomic per case id.

pub mod memory;
pub mod sweeper;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::pipeline::models::{Assessment, SuggestionSet};

/// Persisted state for one analyze → optimize → download lifecycle.
///
/// `source_text` and `criteria_text` are immutable once set. A case is only
/// ever constructed with its assessment present, so a stored suggestion set
/// always has an assessment behind it.
#[derive(Debug, Clone)]
pub struct Case {
    pub id: Uuid,
    pub source_text: String,
    pub criteria_text: String,
    pub assessment: Assessment,
    pub suggestion_set: Option<SuggestionSet>,
}

impl Case {
    pub fn new(
        id: Uuid,
        source_text: String,
        criteria_text: String,
        assessment: Assessment,
    ) -> Self {
        Self {
            id,
            source_text,
            criteria_text,
            assessment,
            suggestion_set: None,
        }
    }
}

/// Abstract case store with sliding expiration.
///
/// Contract (all operations atomic with respect to each other for a given
/// id; different ids never block one another):
///
/// | Method | Behavior |
/// |--------|----------|
/// | [`put`](CaseStore::put) | Insert or replace; resets expiry to now + TTL |
/// | [`get`](CaseStore::get) | Returns the case if present and unexpired; refreshes expiry |
/// | [`delete`](CaseStore::delete) | Immediate removal; no-op on missing id |
/// | [`sweep_expired`](CaseStore::sweep_expired) | Evicts everything past expiry |
///
/// A `get` never returns an expired entry, even one the sweeper has not
/// reached yet. Absent and expired are deliberately indistinguishable to
/// callers.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Insert or silently replace the case under its id.
    async fn put(&self, case: Case) -> Result<()>;

    /// Fetch a live case, extending its expiry as a side effect.
    async fn get(&self, id: Uuid) -> Result<Option<Case>>;

    /// Remove the case immediately. Missing ids are a no-op.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Evict all expired entries, returning how many were removed.
    async fn sweep_expired(&self) -> Result<usize>;
}
