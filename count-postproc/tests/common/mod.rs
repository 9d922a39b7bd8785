#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cluster_lock::memory::{MemoryLockGuard, MemoryLockProvider};
use cluster_lock::{LockProvider, LockResult};
use count_postproc::graph::memory::MemoryGraph;
use count_postproc::{CountPostProcessor, PostProcessConfig};
use count_store::memory::MemoryCounterStore;
use count_store::{
    CounterError, CounterKey, CounterResult, CounterStore, GraphId, TypeId,
};

/// Counter store that refuses instance increments for one type.
#[derive(Clone)]
pub struct FlakyCounters {
    pub inner: MemoryCounterStore,
    pub broken: CounterKey,
}

impl FlakyCounters {
    pub fn new(graph: &GraphId, broken: &TypeId) -> Self {
        Self {
            inner: MemoryCounterStore::new(),
            broken: CounterKey::instances(graph, broken),
        }
    }
}

#[async_trait]
impl CounterStore for FlakyCounters {
    async fn get_count(&self, key: &CounterKey) -> CounterResult<i64> {
        self.inner.get_count(key).await
    }

    async fn increment_count(
        &self,
        key: &CounterKey,
        delta: i64,
    ) -> CounterResult<i64> {
        if *key == self.broken {
            return Err(CounterError::connection("counter store unreachable"));
        }
        self.inner.increment_count(key, delta).await
    }
}

/// Lock provider that records how many guards are alive at once.
#[derive(Clone, Default)]
pub struct TrackingLocks {
    pub inner: MemoryLockProvider,
    pub holders: Arc<AtomicUsize>,
    pub max_holders: Arc<AtomicUsize>,
    pub acquisitions: Arc<AtomicUsize>,
}

pub struct TrackingGuard {
    _inner: MemoryLockGuard,
    holders: Arc<AtomicUsize>,
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LockProvider for TrackingLocks {
    type Guard = TrackingGuard;

    async fn acquire(&self, name: &str) -> LockResult<Self::Guard> {
        let inner = self.inner.acquire(name).await?;
        let now = self.holders.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_holders.fetch_max(now, Ordering::SeqCst);
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(TrackingGuard {
            _inner: inner,
            holders: self.holders.clone(),
        })
    }
}

/// Shared backends standing in for the cluster services.
#[derive(Clone, Default)]
pub struct Cluster {
    pub counters: MemoryCounterStore,
    pub locks: TrackingLocks,
    pub graph: MemoryGraph,
}

pub type Engine =
    CountPostProcessor<MemoryCounterStore, TrackingLocks, MemoryGraph>;

impl Cluster {
    /// A processor as one engine process would build it.
    pub fn engine(&self, threshold: u64) -> Engine {
        CountPostProcessor::new(
            &PostProcessConfig::with_threshold(threshold),
            self.counters.clone(),
            self.locks.clone(),
            self.graph.clone(),
        )
        .expect("valid config")
    }

    pub async fn instances(&self, graph: &str, ty: &str) -> i64 {
        self.counters
            .get_count(&CounterKey::instances(&graph.into(), &ty.into()))
            .await
            .unwrap()
    }

    pub async fn shards(&self, graph: &str, ty: &str) -> i64 {
        self.counters
            .get_count(&CounterKey::shards(&graph.into(), &ty.into()))
            .await
            .unwrap()
    }
}
