#![cfg_attr(docsrs, feature(doc_cfg))]
//! Fixed-batch HTTP load harness.
//!
//! A [`RunController`] draws `N` jobs with random `limit` values, pushes them through a
//! [`WorkerPool`] of `W` workers, each of which fires one request through a
//! [`RequestExecutor`] and hands the [`Outcome`] to a shared [`LatencyAggregator`]. Once the pool
//! has drained the controller turns the aggregator's counters into a [`RunSummary`].
//!
//! Individual request failures are data, not errors: they are tallied by kind and the run always
//! continues. Only configuration problems stop a run, and they are reported before any request
//! is sent.

pub mod aggregator;
pub mod controller;
pub mod executor;
pub mod pool;

pub use aggregator::LatencyAggregator;
pub use controller::{RunController, RunError, RunState};
pub use executor::{Executor, ExecutorError, RequestExecutor};
pub use pool::{DrainReport, PoolError, WorkerPool};

pub use stampede_core::{
    Bucket, BucketCounts, ConfigError, Job, LatencySummary, Outcome, OutcomeCounts, OutcomeKind,
    RunConfig, RunSummary, TargetTemplate,
};

pub mod prelude {
    pub use crate::controller::RunController;
    pub use crate::executor::{Executor, RequestExecutor};
    pub use stampede_core::{Bucket, Outcome, OutcomeKind, RunConfig, RunSummary};
}
