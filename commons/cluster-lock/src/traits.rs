use std::time::Duration;

use async_trait::async_trait;

use crate::error::LockError;

pub type LockResult<T> = Result<T, LockError>;

/// Cluster-wide named mutual exclusion.
///
/// `acquire` waits until the caller is the only holder of `name`. The lock is
/// released when the returned guard is dropped, on every exit path.
#[async_trait]
pub trait LockProvider: Send + Sync {
    type Guard: Send + 'static;

    async fn acquire(&self, name: &str) -> LockResult<Self::Guard>;

    /// Like [`acquire`](Self::acquire), but gives up after `timeout` when one
    /// is given. `None` waits as long as the provider does.
    async fn acquire_within(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> LockResult<Self::Guard> {
        match timeout {
            None => self.acquire(name).await,
            Some(limit) => {
                match tokio::time::timeout(limit, self.acquire(name)).await {
                    Ok(guard) => guard,
                    Err(_) => Err(LockError::Timeout {
                        name: name.to_string(),
                        waited: limit,
                    }),
                }
            }
        }
    }
}

#[async_trait]
impl<T: LockProvider + ?Sized> LockProvider for std::sync::Arc<T> {
    type Guard = T::Guard;

    async fn acquire(&self, name: &str) -> LockResult<Self::Guard> {
        (**self).acquire(name).await
    }
}
