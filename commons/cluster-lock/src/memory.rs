use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

use crate::traits::*;

type LockTable = Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>;

/// Named locks backed by per-name tokio mutexes. Clones share the same
/// table, so providers cloned into several coordinators exclude each other
/// the way a cluster lock service would.
#[derive(Clone, Default)]
pub struct MemoryLockProvider {
    locks: LockTable,
}

#[derive(Debug)]
pub struct MemoryLockGuard {
    name: String,
    _held: OwnedMutexGuard<()>,
}

impl MemoryLockGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for MemoryLockGuard {
    fn drop(&mut self) {
        trace!(lock = %self.name, "lock released");
    }
}

impl MemoryLockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Whether some guard for `name` is currently alive.
    pub async fn is_held(&self, name: &str) -> bool {
        let locks = self.locks.lock().await;
        match locks.get(name) {
            Some(slot) => slot.try_lock().is_err(),
            None => false,
        }
    }
}

#[async_trait]
impl LockProvider for MemoryLockProvider {
    type Guard = MemoryLockGuard;

    async fn acquire(&self, name: &str) -> LockResult<Self::Guard> {
        let slot = self.slot(name).await;
        let held = slot.lock_owned().await;
        trace!(lock = %name, "lock acquired");
        Ok(MemoryLockGuard {
            name: name.to_string(),
            _held: held,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LockError;
    use std::time::Duration;

    #[tokio::test]
    async fn guard_drop_releases() {
        let locks = MemoryLockProvider::new();
        let guard = locks.acquire("/a").await.unwrap();
        assert_eq!(guard.name(), "/a");
        assert!(locks.is_held("/a").await);
        drop(guard);
        assert!(!locks.is_held("/a").await);
    }

    #[tokio::test]
    async fn distinct_names_do_not_block_each_other() {
        let locks = MemoryLockProvider::new();
        let _a = locks.acquire("/a").await.unwrap();
        let _b = locks
            .acquire_within("/b", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(locks.is_held("/a").await);
        assert!(locks.is_held("/b").await);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_within_times_out_while_held_elsewhere() {
        let locks = MemoryLockProvider::new();
        let _held = locks.acquire("/a").await.unwrap();
        let err = locks
            .acquire_within("/a", Some(Duration::from_secs(5)))
            .await
            .unwrap_err();
        match err {
            LockError::Timeout { name, waited } => {
                assert_eq!(name, "/a");
                assert_eq!(waited, Duration::from_secs(5));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
