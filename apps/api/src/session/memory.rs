//! In-memory [`CaseStore`] implementation.
//!
//! A fixed set of mutex-guarded shards keyed by case id, so operations on
//! different ids contend only when they hash to the same shard. Expiry uses
//! `tokio::time::Instant`, which tests can pause and advance.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::{Case, CaseStore};

const SHARD_COUNT: usize = 16;

struct Entry {
    case: Case,
    expires_at: Instant,
}

/// Sharded in-memory case store with sliding expiration.
pub struct InMemoryCaseStore {
    shards: Vec<Mutex<HashMap<Uuid, Entry>>>,
    ttl: Duration,
}

impl InMemoryCaseStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
            ttl,
        }
    }

    fn shard(&self, id: Uuid) -> &Mutex<HashMap<Uuid, Entry>> {
        // First byte of the uuid is uniformly distributed for v4 ids.
        &self.shards[id.as_bytes()[0] as usize % SHARD_COUNT]
    }
}

#[async_trait]
impl CaseStore for InMemoryCaseStore {
    async fn put(&self, case: Case) -> Result<()> {
        let id = case.id;
        let entry = Entry {
            case,
            expires_at: Instant::now() + self.ttl,
        };
        // Locks are held only for the map operation, never across an await.
        self.shard(id).lock().unwrap().insert(id, entry);
        debug!("case stored: {id}");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Case>> {
        let mut shard = self.shard(id).lock().unwrap();
        let now = Instant::now();
        match shard.get_mut(&id) {
            Some(entry) if entry.expires_at > now => {
                // Sliding expiration: active cases survive as long as
                // they keep being used.
                entry.expires_at = now + self.ttl;
                Ok(Some(entry.case.clone()))
            }
            Some(_) => {
                // Past expiry but not yet swept: treat as absent.
                shard.remove(&id);
                debug!("case expired on access: {id}");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.shard(id).lock().unwrap().remove(&id);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut evicted = 0;
        for shard in &self.shards {
            let mut map = shard.lock().unwrap();
            let before = map.len();
            map.retain(|_, entry| entry.expires_at > now);
            evicted += before - map.len();
        }
        Ok(evicted)
    }
}
