//! Background eviction of expired cases.
//!
//! A dedicated periodic task, deliberately decoupled from the request path:
//! writes never pay for cleanup, and the sweep cadence is tunable and
//! testable on a paused clock. An entry read just before a sweep has had its
//! expiry refreshed by that read and is therefore never evicted by the sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::CaseStore;

/// Spawns the sweep loop. Runs until the returned handle is aborted or the
/// runtime shuts down.
pub fn spawn(store: Arc<dyn CaseStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately; skip it so an empty sweep
        // does not race startup.
        interval.tick().await;
        loop {
            interval.tick().await;
            match store.sweep_expired().await {
                Ok(0) => {}
                Ok(evicted) => debug!("sweeper evicted {evicted} expired case(s)"),
                Err(e) => error!("case sweep failed: {e}"),
            }
        }
    })
}

/// Sweep period for a given TTL: a quarter of the TTL, floored at one second.
pub fn period_for_ttl(ttl: Duration) -> Duration {
    (ttl / 4).max(Duration::from_secs(1))
}
