use std::collections::BTreeSet;
use std::sync::Arc;

use cluster_lock::LockProvider;
use count_store::{CounterStore, GraphId, TypeId};
use tracing::{debug, error, instrument};

use crate::batch::CommitBatch;
use crate::config::PostProcessConfig;
use crate::coordinator::{ShardCoordinator, ShardOutcome};
use crate::decision::ShardingDecision;
use crate::error::{ConfigError, PostProcessError, ShardFailure};
use crate::graph::GraphTxFactory;

/// What a processed batch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub graph: GraphId,
    /// Delta entries applied to instance counters.
    pub counted: usize,
    /// Types that exceeded capacity while counting, deduplicated.
    pub flagged: Vec<TypeId>,
    /// Types that got a new shard, with their shard count afterwards.
    pub sharded: Vec<(TypeId, i64)>,
    /// Flagged types found within capacity once their lock was held.
    pub skipped: Vec<TypeId>,
}

impl BatchReport {
    pub fn new(graph: GraphId) -> Self {
        Self {
            graph,
            counted: 0,
            flagged: Vec::new(),
            sharded: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// Updates instance counts from commit batches and shards the types that
/// outgrow them.
///
/// Counting goes through the shared counter store rather than the graph,
/// because every engine process reads the graph through its own cached
/// snapshot and cannot agree on an exact count.
pub struct CountPostProcessor<C, L, G> {
    decision: Arc<ShardingDecision<C>>,
    coordinator: ShardCoordinator<C, L, G>,
}

impl<C, L, G> CountPostProcessor<C, L, G>
where
    C: CounterStore,
    L: LockProvider,
    G: GraphTxFactory,
{
    pub fn new(
        config: &PostProcessConfig,
        counters: C,
        locks: L,
        graphs: G,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let decision =
            Arc::new(ShardingDecision::new(counters, config.threshold()?));
        let coordinator = ShardCoordinator::new(
            decision.clone(),
            locks,
            graphs,
            config.lock_timeout(),
        );
        Ok(Self {
            decision,
            coordinator,
        })
    }

    pub fn decision(&self) -> &ShardingDecision<C> {
        &self.decision
    }

    pub fn coordinator(&self) -> &ShardCoordinator<C, L, G> {
        &self.coordinator
    }

    /// Applies every delta of `batch`, then shards each type that crossed
    /// its capacity.
    ///
    /// A counter failure stops the batch right away. Shard failures are
    /// collected per type and do not stop the remaining types. Counts
    /// already applied are never rolled back.
    #[instrument(
        skip(self, batch),
        fields(graph = %batch.graph, entries = batch.len())
    )]
    pub async fn process_batch(
        &self,
        batch: &CommitBatch,
    ) -> Result<BatchReport, PostProcessError> {
        let graph = &batch.graph;
        let mut pending = BTreeSet::new();

        for entry in &batch.deltas {
            let needs_sharding = self
                .decision
                .evaluate(graph, &entry.type_id, entry.delta)
                .await
                .map_err(|source| {
                    error!(
                        type_id = %entry.type_id,
                        "could not update instance count: {source}"
                    );
                    PostProcessError::Counting {
                        graph: graph.clone(),
                        type_id: entry.type_id.clone(),
                        source,
                    }
                })?;
            if needs_sharding {
                pending.insert(entry.type_id.clone());
            }
        }

        let mut report = BatchReport {
            counted: batch.len(),
            flagged: pending.iter().cloned().collect(),
            ..BatchReport::new(graph.clone())
        };
        let mut failures = Vec::new();

        for type_id in pending {
            match self.coordinator.shard(graph, &type_id).await {
                Ok(ShardOutcome::Created { shards }) => {
                    report.sharded.push((type_id, shards))
                }
                Ok(ShardOutcome::AlreadySharded { .. }) => {
                    report.skipped.push(type_id)
                }
                Err(error) => {
                    error!(%type_id, "could not shard type: {error}");
                    failures.push(ShardFailure { type_id, error });
                }
            }
        }

        if !failures.is_empty() {
            return Err(PostProcessError::Sharding {
                graph: graph.clone(),
                report,
                failures,
            });
        }
        debug!(
            counted = report.counted,
            sharded = report.sharded.len(),
            "updating instance counts successful"
        );
        Ok(report)
    }
}
