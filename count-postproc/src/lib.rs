//! Post-commit instance counting and shard triggering.
//!
//! A [`CountPostProcessor`] consumes the per-type instance deltas produced by
//! one committed transaction, folds them into cluster-wide counters, and asks
//! the graph to add a shard for every type whose instance count outgrew
//! `threshold × shards`. Shard creation for a type is serialised across the
//! cluster with a named lock and re-checked once the lock is held.

pub mod batch;
pub mod config;
pub mod coordinator;
pub mod decision;
pub mod error;
pub mod graph;
pub mod observability;
pub mod processor;

pub use batch::{CommitBatch, InstanceDelta};
pub use config::PostProcessConfig;
pub use coordinator::{ShardCoordinator, ShardOutcome, lock_name};
pub use decision::{ShardAssessment, ShardingDecision};
pub use error::*;
pub use graph::{GraphTxFactory, ShardTx};
pub use processor::{BatchReport, CountPostProcessor};

pub use count_store::{CounterKey, CounterKind, CounterStore, GraphId, TypeId};
