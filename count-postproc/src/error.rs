use cluster_lock::LockError;
use count_store::{CounterError, GraphId, TypeId};

use crate::processor::BatchReport;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("sharding threshold must be positive, got {0}")]
    InvalidThreshold(u64),
    #[error("lock timeout must be positive when set")]
    InvalidLockTimeout,
}

/// Failure reported by the graph-mutation collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("cannot open write transaction on {0}: {1}")]
    Open(GraphId, String),
    #[error("cannot create shard for {0}: {1}")]
    CreateShard(TypeId, String),
    #[error("commit failed: {0}")]
    Commit(String),
}

/// Failure of a single type's shard attempt.
#[derive(Debug, thiserror::Error)]
pub enum ShardError {
    #[error("lock error: {0}")]
    Lock(#[from] LockError),
    #[error("counter error: {0}")]
    Counter(#[from] CounterError),
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

#[derive(Debug)]
pub struct ShardFailure {
    pub type_id: TypeId,
    pub error: ShardError,
}

#[derive(Debug, thiserror::Error)]
pub enum PostProcessError {
    /// Counting stopped at `type_id`. Increments applied before it stay.
    #[error("updating count of {type_id} in {graph} failed: {source}")]
    Counting {
        graph: GraphId,
        type_id: TypeId,
        #[source]
        source: CounterError,
    },
    /// All deltas were counted but some shard attempts failed.
    #[error("sharding failed for {} type(s) in {graph}", .failures.len())]
    Sharding {
        graph: GraphId,
        report: BatchReport,
        failures: Vec<ShardFailure>,
    },
}

impl PostProcessError {
    /// Types whose shard attempt failed, empty for counting failures.
    pub fn failed_types(&self) -> Vec<&TypeId> {
        match self {
            PostProcessError::Counting { .. } => Vec::new(),
            PostProcessError::Sharding { failures, .. } => {
                failures.iter().map(|f| &f.type_id).collect()
            }
        }
    }
}
