use std::path::PathBuf;

use clap::Parser;
use count_dev::{parse_delta, run_simulation};
use count_postproc::observability::{TracingConfig, setup_tracing};
use count_postproc::{CommitBatch, PostProcessConfig};
use envconfig::Envconfig;
use tracing::debug;

/// Replays commit batches against in-memory counter, lock and graph
/// services and prints the resulting instance and shard counts.
#[derive(Parser, Debug)]
#[command(name = "count-sim")]
struct Args {
    /// Deltas of the batch as TYPE=DELTA
    #[arg(value_parser = parse_delta)]
    deltas: Vec<(String, i64)>,
    /// Read the batch from a JSON file instead
    #[arg(long, conflicts_with = "deltas")]
    batch_file: Option<PathBuf>,
    #[arg(long, default_value = "sim")]
    graph: String,
    /// Overrides COUNT_SHARDING_THRESHOLD
    #[arg(long)]
    threshold: Option<u64>,
    /// Simulated engine processes sharing the services
    #[arg(long, default_value_t = 2)]
    processes: usize,
    #[arg(long, default_value_t = 10)]
    rounds: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing(TracingConfig::from_env("count-sim"))?;
    let args = Args::parse();

    let mut conf = PostProcessConfig::init_from_env()?;
    if let Some(threshold) = args.threshold {
        conf.sharding_threshold = threshold;
    }
    conf.validate()?;
    debug!("use post-process config: {:?}", conf);

    let batch = match &args.batch_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<CommitBatch>(&raw)?
        }
        None => {
            let mut batch = CommitBatch::new(args.graph.as_str());
            batch.extend(args.deltas.iter().cloned());
            batch
        }
    };
    if batch.is_empty() {
        anyhow::bail!("no deltas given, pass TYPE=DELTA or --batch-file");
    }

    let summary =
        run_simulation(&conf, &batch, args.processes, args.rounds).await?;

    println!(
        "{} batches on graph '{}' ({} failed), threshold {}",
        summary.batches,
        batch.graph,
        summary.failed_batches,
        conf.sharding_threshold
    );
    println!(
        "{:<24} {:>12} {:>8} {:>8}",
        "type", "instances", "shards", "created"
    );
    for (type_id, t) in &summary.types {
        println!(
            "{:<24} {:>12} {:>8} {:>8}",
            type_id.as_str(),
            t.instances,
            t.shards,
            t.shards_created
        );
    }
    Ok(())
}
