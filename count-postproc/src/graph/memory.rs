use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use count_store::{GraphId, TypeId};
use tokio::sync::Mutex;
use tracing::trace;

use super::*;

#[derive(Default)]
struct GraphState {
    shards: HashMap<(GraphId, TypeId), u64>,
    fail_create: HashSet<TypeId>,
    fail_commit: HashSet<TypeId>,
}

/// Graph stand-in that records shards committed per type.
///
/// Clones share state. Failures can be injected per type to exercise the
/// error paths of shard creation.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    state: Arc<Mutex<GraphState>>,
    open_txs: Arc<AtomicUsize>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shards created for `type_id` through committed transactions.
    pub async fn shards_created(
        &self,
        graph: &GraphId,
        type_id: &TypeId,
    ) -> u64 {
        let state = self.state.lock().await;
        state
            .shards
            .get(&(graph.clone(), type_id.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub async fn fail_create_for(&self, type_id: impl Into<TypeId>) {
        self.state.lock().await.fail_create.insert(type_id.into());
    }

    pub async fn fail_commit_for(&self, type_id: impl Into<TypeId>) {
        self.state.lock().await.fail_commit.insert(type_id.into());
    }

    pub async fn clear_failures(&self) {
        let mut state = self.state.lock().await;
        state.fail_create.clear();
        state.fail_commit.clear();
    }

    /// Transactions opened and not yet dropped.
    pub fn open_transactions(&self) -> usize {
        self.open_txs.load(Ordering::SeqCst)
    }
}

pub struct MemoryShardTx {
    graph: GraphId,
    staged: Vec<TypeId>,
    state: Arc<Mutex<GraphState>>,
    open_txs: Arc<AtomicUsize>,
}

impl Drop for MemoryShardTx {
    fn drop(&mut self) {
        self.open_txs.fetch_sub(1, Ordering::SeqCst);
        trace!(graph = %self.graph, "transaction closed");
    }
}

#[async_trait]
impl GraphTxFactory for MemoryGraph {
    type Tx = MemoryShardTx;

    async fn open_write(&self, graph: &GraphId) -> GraphResult<Self::Tx> {
        self.open_txs.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryShardTx {
            graph: graph.clone(),
            staged: Vec::new(),
            state: self.state.clone(),
            open_txs: self.open_txs.clone(),
        })
    }
}

#[async_trait]
impl ShardTx for MemoryShardTx {
    async fn create_shard(&mut self, type_id: &TypeId) -> GraphResult<()> {
        if self.state.lock().await.fail_create.contains(type_id) {
            return Err(GraphError::CreateShard(
                type_id.clone(),
                "injected failure".into(),
            ));
        }
        self.staged.push(type_id.clone());
        Ok(())
    }

    async fn commit_without_logging(mut self) -> GraphResult<()> {
        let staged = std::mem::take(&mut self.staged);
        let mut state = self.state.lock().await;
        let rejected = staged.iter().find(|t| state.fail_commit.contains(*t));
        if let Some(t) = rejected {
            return Err(GraphError::Commit(format!(
                "injected failure committing shard of {t}"
            )));
        }
        for type_id in staged {
            *state
                .shards
                .entry((self.graph.clone(), type_id))
                .or_insert(0) += 1;
        }
        Ok(())
    }
}
