use async_trait::async_trait;
use count_store::{GraphId, TypeId};

use crate::error::GraphError;

#[cfg(feature = "memory")]
pub mod memory;

pub type GraphResult<T> = Result<T, GraphError>;

/// Opens write transactions on the graph storage engine.
#[async_trait]
pub trait GraphTxFactory: Send + Sync {
    type Tx: ShardTx;

    async fn open_write(&self, graph: &GraphId) -> GraphResult<Self::Tx>;
}

/// A write transaction able to add a physical shard to a type.
///
/// Dropping the transaction closes it and releases its resources, whether or
/// not it was committed.
#[async_trait]
pub trait ShardTx: Send {
    async fn create_shard(&mut self, type_id: &TypeId) -> GraphResult<()>;

    /// Commits without emitting a post-processing log entry, so the commit
    /// does not feed back into instance counting.
    async fn commit_without_logging(self) -> GraphResult<()>;
}

#[async_trait]
impl<T: GraphTxFactory + ?Sized> GraphTxFactory for std::sync::Arc<T> {
    type Tx = T::Tx;

    async fn open_write(&self, graph: &GraphId) -> GraphResult<Self::Tx> {
        (**self).open_write(graph).await
    }
}
