use crate::error::CounterError;
use crate::ids::CounterKey;
use async_trait::async_trait;

pub type CounterResult<T> = Result<T, CounterError>;

/// Cluster-wide named counters.
///
/// Every process that evaluates sharding talks to the same store, so an
/// implementation must make `increment_count` atomic with respect to all
/// concurrent callers, not only the ones inside this process.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value of the counter, `0` if it was never written.
    async fn get_count(&self, key: &CounterKey) -> CounterResult<i64>;

    /// Atomically adds `delta` and returns the value after the addition.
    /// A zero delta must behave as a read.
    async fn increment_count(
        &self,
        key: &CounterKey,
        delta: i64,
    ) -> CounterResult<i64>;

    /// Lightweight connectivity check to the backing store.
    async fn health(&self) -> CounterResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<T: CounterStore + ?Sized> CounterStore for std::sync::Arc<T> {
    async fn get_count(&self, key: &CounterKey) -> CounterResult<i64> {
        (**self).get_count(key).await
    }

    async fn increment_count(
        &self,
        key: &CounterKey,
        delta: i64,
    ) -> CounterResult<i64> {
        (**self).increment_count(key, delta).await
    }

    async fn health(&self) -> CounterResult<()> {
        (**self).health().await
    }
}
