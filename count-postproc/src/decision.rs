use std::num::NonZeroU64;

use count_store::{CounterKey, CounterResult, CounterStore, GraphId, TypeId};
use tracing::debug;

/// Counter values observed by one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardAssessment {
    /// Instance count after the delta was applied.
    pub instances: i64,
    /// Shard counter as stored, `0` when never written.
    pub recorded_shards: i64,
    /// Shards the type is considered to have.
    pub shards: i64,
    pub needs_sharding: bool,
}

/// Applies instance deltas and decides whether a type outgrew its shards.
pub struct ShardingDecision<C> {
    counters: C,
    threshold: NonZeroU64,
}

impl<C: CounterStore> ShardingDecision<C> {
    pub fn new(counters: C, threshold: NonZeroU64) -> Self {
        Self {
            counters,
            threshold,
        }
    }

    pub fn threshold(&self) -> NonZeroU64 {
        self.threshold
    }

    pub fn counters(&self) -> &C {
        &self.counters
    }

    /// Adds `delta` to the instance counter and reports whether the new
    /// count exceeds `threshold × shards`. With `delta == 0` this is a pure
    /// re-check.
    pub async fn evaluate(
        &self,
        graph: &GraphId,
        type_id: &TypeId,
        delta: i64,
    ) -> CounterResult<bool> {
        Ok(self.assess(graph, type_id, delta).await?.needs_sharding)
    }

    pub async fn assess(
        &self,
        graph: &GraphId,
        type_id: &TypeId,
        delta: i64,
    ) -> CounterResult<ShardAssessment> {
        let recorded_shards = self
            .counters
            .get_count(&CounterKey::shards(graph, type_id))
            .await?;
        // A type always owns one implicit shard, whether or not its shard
        // counter has been written yet.
        let shards = if recorded_shards == 0 {
            1
        } else {
            recorded_shards
        };
        let instances = self
            .counters
            .increment_count(&CounterKey::instances(graph, type_id), delta)
            .await?;
        let needs_sharding =
            exceeds_capacity(instances, shards, self.threshold);
        debug!(
            %graph,
            %type_id,
            delta,
            instances,
            shards,
            needs_sharding,
            "evaluated instance count"
        );
        Ok(ShardAssessment {
            instances,
            recorded_shards,
            shards,
            needs_sharding,
        })
    }
}

fn exceeds_capacity(
    instances: i64,
    shards: i64,
    threshold: NonZeroU64,
) -> bool {
    i128::from(instances) > i128::from(threshold.get()) * i128::from(shards)
}
