//! Command-line runtime
//!
//! Parses the run configuration from arguments, performs one run and prints the report.
use crate::error::RuntimeError;
use clap::Parser;
use stampede_core::{DEFAULT_CONCURRENCY, DEFAULT_JOB_COUNT, DEFAULT_LIMIT_RANGE, DEFAULT_TARGET};
use stampede::{RunConfig, RunController, RunSummary};
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Parser, Debug)]
#[command(version, about = "Fire a fixed batch of HTTP requests and report latency buckets.")]
struct StampedeCli {
    /// Target URL. `{limit}` is replaced with each job's limit, otherwise a `limit` query
    /// parameter is added.
    #[arg(short, long, default_value = DEFAULT_TARGET)]
    target: String,

    /// Number of requests in the batch.
    #[arg(short('n'), long, default_value_t = DEFAULT_JOB_COUNT)]
    jobs: usize,

    /// Maximum number of requests in flight.
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    #[arg(long, default_value_t = *DEFAULT_LIMIT_RANGE.start())]
    min_limit: u32,

    #[arg(long, default_value_t = *DEFAULT_LIMIT_RANGE.end())]
    max_limit: u32,

    /// Bound the job queue; unbounded when omitted.
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Per-request timeout, e.g. `5s` or `250ms`.
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Seed for reproducible limit sampling.
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

impl From<StampedeCli> for RunConfig {
    fn from(args: StampedeCli) -> Self {
        RunConfig {
            target: args.target,
            jobs: args.jobs,
            concurrency: args.concurrency,
            limit_range: args.min_limit..=args.max_limit,
            queue_capacity: args.queue_capacity,
            timeout: args.timeout,
            seed: args.seed,
        }
    }
}

/// Runs a single batch and prints its report to stdout.
///
/// # Example
///
/// ```no_run
/// use stampede_runtime::StampedeRuntime;
///
/// #[tokio::main]
/// async fn main() {
///     StampedeRuntime::new()
///         .with_args()
///         .run()
///         .await
///         .unwrap();
/// }
/// ```
pub struct StampedeRuntime {
    config: RunConfig,
    json: bool,
}

impl Default for StampedeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl StampedeRuntime {
    pub fn new() -> Self {
        StampedeRuntime {
            config: RunConfig::default(),
            json: false,
        }
    }

    /// Use the default CLI arguments.
    ///
    /// `-t`, `--target` URL or template (default `http://localhost:8080/go-animals`)
    ///
    /// `-n`, `--jobs` batch size (default `100`)
    ///
    /// `-c`, `--concurrency` worker count (default `10`)
    ///
    /// `--min-limit`, `--max-limit`, `--queue-capacity`, `--timeout`, `--seed`, `--json`
    ///
    /// # Example
    /// ```ignore
    /// $ stampede -t http://localhost:8080/go-animals -n 20000 -c 200
    /// $ stampede -t 'http://localhost:8080/animals?limit={limit}' --timeout 2s --json
    /// ```
    pub fn with_args(self) -> Self {
        self.with_cli(StampedeCli::parse())
    }

    fn with_cli(mut self, args: StampedeCli) -> Self {
        self.json = args.json;
        self.config = args.into();
        self
    }

    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    #[instrument(name = "stampede", skip_all)]
    pub async fn run(self) -> Result<RunSummary, RuntimeError> {
        info!("Starting run with config {:?}", &self.config);
        let summary = RunController::new(self.config).run().await?;
        println!("{}", render(&summary, self.json)?);
        Ok(summary)
    }
}

fn render(summary: &RunSummary, json: bool) -> Result<String, RuntimeError> {
    if json {
        Ok(serde_json::to_string_pretty(summary)?)
    } else {
        Ok(summary.to_string())
    }
}
