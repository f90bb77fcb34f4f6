//! Run orchestration: generate, dispatch, drain, report.
use crate::aggregator::LatencyAggregator;
use crate::executor::{Executor, ExecutorError, RequestExecutor};
use crate::pool::{PoolError, WorkerPool};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use stampede_core::{ConfigError, Job, Outcome, RunConfig, RunSummary};
use std::fmt;
use std::num::NonZeroUsize;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Executor(#[from] ExecutorError),

    #[error("Dispatch failed: {0}")]
    Pool(#[from] PoolError),

    #[error("A run can only start from Idle; controller is {0}.")]
    NotIdle(RunState),
}

/// Lifecycle of a single run. Strictly sequential; nothing moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Generating,
    Dispatching,
    Draining,
    Reporting,
    Done,
}

impl RunState {
    pub fn next(self) -> Option<Self> {
        match self {
            RunState::Idle => Some(RunState::Generating),
            RunState::Generating => Some(RunState::Dispatching),
            RunState::Dispatching => Some(RunState::Draining),
            RunState::Draining => Some(RunState::Reporting),
            RunState::Reporting => Some(RunState::Done),
            RunState::Done => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Drives one fixed-size batch from job generation to the final [`RunSummary`].
///
/// A controller runs once. Configuration problems are reported before anything is dispatched
/// and leave the controller `Idle`; after that the run always reaches `Done`, however many
/// requests fail. To run again, build a new controller.
///
/// # Example
/// ```no_run
/// use stampede::prelude::*;
///
/// #[tokio::main]
/// async fn main() {
///     let config = RunConfig::new("http://localhost:8080/go-animals")
///         .jobs(1_000)
///         .concurrency(10);
///
///     let summary = RunController::new(config).run().await.unwrap();
///     println!("{summary}");
/// }
/// ```
pub struct RunController {
    config: RunConfig,
    state: RunState,
}

impl RunController {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            state: RunState::Idle,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the batch against the configured target over HTTP.
    pub async fn run(&mut self) -> Result<RunSummary, RunError> {
        self.ensure_idle()?;
        let target = self.config.validate()?;
        let executor = RequestExecutor::new(target, self.config.timeout)?;
        self.run_with(executor).await
    }

    /// Run the batch with a caller-provided executor.
    #[instrument(name = "run", skip_all, fields(target = %self.config.target, jobs = self.config.jobs, concurrency = self.config.concurrency))]
    pub async fn run_with<E: Executor>(&mut self, executor: E) -> Result<RunSummary, RunError> {
        self.ensure_idle()?;
        self.config.validate()?;
        let concurrency =
            NonZeroUsize::new(self.config.concurrency).ok_or(ConfigError::ZeroConcurrency)?;
        let queue_capacity = match self.config.queue_capacity {
            Some(capacity) => {
                Some(NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroQueueCapacity)?)
            }
            None => None,
        };

        self.advance();
        let jobs = generate_jobs(
            self.config.jobs,
            &self.config.limit_range,
            self.config.seed,
        );

        self.advance();
        let start = Instant::now();
        let aggregator = Arc::new(LatencyAggregator::new());
        let executor = Arc::new(executor);
        let mut pool = WorkerPool::new(concurrency, queue_capacity, {
            let aggregator = aggregator.clone();
            move |job: Job| {
                let aggregator = aggregator.clone();
                let executor = executor.clone();
                async move {
                    let outcome = executor.execute(job.limit).await;
                    log_outcome(&job, &outcome);
                    aggregator.record(&outcome);
                }
            }
        });

        for job in jobs {
            pool.submit(job).await?;
        }

        self.advance();
        let report = pool.drain().await;
        let elapsed = start.elapsed();

        self.advance();
        let summary = RunSummary::new(
            report.submitted,
            report.panicked,
            aggregator.snapshot(),
            elapsed,
        );
        if !summary.is_consistent() {
            error!("Run accounting is inconsistent: {summary:?}");
        }
        info!(
            "Run complete: {} jobs in {elapsed:?} ({:.2} rps, {} errors).",
            summary.completed,
            summary.requests_per_second,
            summary.error_count()
        );

        self.advance();
        Ok(summary)
    }

    fn ensure_idle(&self) -> Result<(), RunError> {
        match self.state {
            RunState::Idle => Ok(()),
            state => Err(RunError::NotIdle(state)),
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            info!("{} -> {}", self.state, next);
            self.state = next;
        }
    }
}

/// Draw `count` jobs with uniformly distributed limits. Only the generating phase touches the
/// generator, so no worker ever shares it.
fn generate_jobs(count: usize, limits: &RangeInclusive<u32>, seed: Option<u64>) -> Vec<Job> {
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let limits = Uniform::new_inclusive(*limits.start(), *limits.end());

    (0..count)
        .map(|_| Job::new(limits.sample(&mut rng)))
        .collect()
}

fn log_outcome(job: &Job, outcome: &Outcome) {
    match outcome {
        Outcome::Success {
            item_count,
            latency,
        } => debug!(limit = job.limit, "Response size: {item_count} in {latency:?}"),
        failure => warn!(limit = job.limit, "Request failed: {failure}"),
    }
}
