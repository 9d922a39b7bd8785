use std::sync::Arc;
use std::time::Duration;

use cluster_lock::LockProvider;
use count_store::{CounterKey, CounterStore, GraphId, TypeId, escape_segment};
use tracing::{info, instrument, warn};

use crate::decision::ShardingDecision;
use crate::error::ShardError;
use crate::graph::{GraphTxFactory, ShardTx};

const LOCK_PREFIX: &str = "/updating-instance-count-lock";

/// Name of the cluster lock guarding shard creation of one type.
pub fn lock_name(graph: &GraphId, type_id: &TypeId) -> String {
    format!(
        "{}/{}/{}",
        LOCK_PREFIX,
        escape_segment(graph.as_str()),
        escape_segment(type_id.as_str())
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardOutcome {
    /// A shard was committed; `shards` is the shard count afterwards.
    Created { shards: i64 },
    /// The re-check under the lock found the type within capacity.
    AlreadySharded { instances: i64, shards: i64 },
}

/// Creates shards for types flagged during counting, one lock holder per
/// type across the cluster.
pub struct ShardCoordinator<C, L, G> {
    decision: Arc<ShardingDecision<C>>,
    locks: L,
    graphs: G,
    lock_timeout: Option<Duration>,
}

impl<C, L, G> ShardCoordinator<C, L, G>
where
    C: CounterStore,
    L: LockProvider,
    G: GraphTxFactory,
{
    pub fn new(
        decision: Arc<ShardingDecision<C>>,
        locks: L,
        graphs: G,
        lock_timeout: Option<Duration>,
    ) -> Self {
        Self {
            decision,
            locks,
            graphs,
            lock_timeout,
        }
    }

    /// Adds one shard to `type_id` if it still exceeds capacity once the
    /// type's lock is held.
    ///
    /// The shard counter is only bumped after the graph commit succeeded.
    /// On any error the lock is released and nothing is counted, so calling
    /// again later is safe.
    #[instrument(skip(self), fields(graph = %graph, type_id = %type_id))]
    pub async fn shard(
        &self,
        graph: &GraphId,
        type_id: &TypeId,
    ) -> Result<ShardOutcome, ShardError> {
        let name = lock_name(graph, type_id);
        let _guard = self.locks.acquire_within(&name, self.lock_timeout).await?;

        // another process may have sharded while we waited
        let recheck = self.decision.assess(graph, type_id, 0).await?;
        if !recheck.needs_sharding {
            warn!(
                instances = recheck.instances,
                shards = recheck.shards,
                "type no longer exceeds capacity, skipping shard"
            );
            return Ok(ShardOutcome::AlreadySharded {
                instances: recheck.instances,
                shards: recheck.shards,
            });
        }

        let mut tx = self.graphs.open_write(graph).await?;
        tx.create_shard(type_id).await?;
        tx.commit_without_logging().await?;

        // The implicit first shard was never written, so the first real
        // shard has to account for it as well.
        let step = if recheck.recorded_shards == 0 { 2 } else { 1 };
        let shards = self
            .decision
            .counters()
            .increment_count(&CounterKey::shards(graph, type_id), step)
            .await?;
        info!(instances = recheck.instances, shards, "created shard");
        Ok(ShardOutcome::Created { shards })
    }
}
