use std::collections::BTreeMap;
use std::sync::Arc;

use cluster_lock::memory::MemoryLockProvider;
use count_postproc::graph::memory::MemoryGraph;
use count_postproc::{
    CommitBatch, CountPostProcessor, PostProcessConfig, PostProcessError,
};
use count_store::memory::MemoryCounterStore;
use count_store::{CounterKey, CounterStore, GraphId, TypeId};
use futures_util::future::join_all;
use tracing::{info, warn};

/// Parses `TYPE=DELTA`, e.g. `person=150` or `movie=-3`.
pub fn parse_delta(raw: &str) -> Result<(String, i64), String> {
    let (ty, delta) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected TYPE=DELTA, got '{raw}'"))?;
    if ty.is_empty() {
        return Err(format!("missing type in '{raw}'"));
    }
    let delta = delta
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid delta in '{raw}': {e}"))?;
    Ok((ty.to_string(), delta))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSummary {
    pub instances: i64,
    pub shards: i64,
    pub shards_created: u64,
}

#[derive(Debug, Default)]
pub struct SimSummary {
    pub batches: usize,
    pub failed_batches: usize,
    pub types: BTreeMap<TypeId, TypeSummary>,
}

/// Replays `batch` `rounds` times on each of `processes` simulated engine
/// processes that share one counter store, lock service and graph.
pub async fn run_simulation(
    config: &PostProcessConfig,
    batch: &CommitBatch,
    processes: usize,
    rounds: usize,
) -> anyhow::Result<SimSummary> {
    let counters = MemoryCounterStore::new();
    let locks = MemoryLockProvider::new();
    let graph = MemoryGraph::new();

    let engines = (0..processes.max(1))
        .map(|_| {
            CountPostProcessor::new(
                config,
                counters.clone(),
                locks.clone(),
                graph.clone(),
            )
            .map(Arc::new)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = SimSummary::default();
    for round in 0..rounds {
        let runs = engines.iter().map(|engine| {
            let engine = engine.clone();
            let batch = batch.clone();
            tokio::spawn(async move { engine.process_batch(&batch).await })
        });
        for res in join_all(runs).await {
            summary.batches += 1;
            match res? {
                Ok(report) => {
                    if !report.sharded.is_empty() {
                        info!(
                            round,
                            sharded = ?report.sharded,
                            "round sharded"
                        );
                    }
                }
                Err(e @ PostProcessError::Sharding { .. }) => {
                    summary.failed_batches += 1;
                    warn!(round, "batch failed: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    for entry in &batch.deltas {
        if summary.types.contains_key(&entry.type_id) {
            continue;
        }
        let type_summary =
            summarize(&counters, &graph, &batch.graph, &entry.type_id).await?;
        summary.types.insert(entry.type_id.clone(), type_summary);
    }
    Ok(summary)
}

async fn summarize(
    counters: &MemoryCounterStore,
    graph: &MemoryGraph,
    graph_id: &GraphId,
    type_id: &TypeId,
) -> anyhow::Result<TypeSummary> {
    let instances = counters
        .get_count(&CounterKey::instances(graph_id, type_id))
        .await?;
    let shards = counters
        .get_count(&CounterKey::shards(graph_id, type_id))
        .await?;
    Ok(TypeSummary {
        instances,
        shards: shards.max(1),
        shards_created: graph.shards_created(graph_id, type_id).await,
    })
}
