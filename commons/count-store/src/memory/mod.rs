use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

use crate::error::CounterError;
use crate::ids::CounterKey;
use crate::traits::*;

type MemoryStore = Arc<RwLock<HashMap<String, i64>>>;

/// In-process counter store. Clones share the same map, so several
/// coordinators built from clones behave like processes talking to one
/// shared store.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    store: MemoryStore,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of counters that have been written at least once.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get_count(&self, key: &CounterKey) -> CounterResult<i64> {
        let store = self.store.read().await;
        Ok(store.get(key.as_str()).copied().unwrap_or(0))
    }

    async fn increment_count(
        &self,
        key: &CounterKey,
        delta: i64,
    ) -> CounterResult<i64> {
        if delta == 0 {
            return self.get_count(key).await;
        }
        let mut store = self.store.write().await;
        let current = store.get(key.as_str()).copied().unwrap_or(0);
        let next =
            current
                .checked_add(delta)
                .ok_or_else(|| CounterError::Overflow {
                    key: key.to_string(),
                    delta,
                })?;
        store.insert(key.as_str().to_string(), next);
        trace!(key = %key, delta, value = next, "counter incremented");
        Ok(next)
    }
}
