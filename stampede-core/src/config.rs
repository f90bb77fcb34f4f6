use crate::{
    TargetTemplate, DEFAULT_CONCURRENCY, DEFAULT_JOB_COUNT, DEFAULT_LIMIT_RANGE, DEFAULT_TARGET,
};
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Problems caught before any job is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Concurrency must be at least 1.")]
    ZeroConcurrency,

    #[error("A bounded queue needs a capacity of at least 1.")]
    ZeroQueueCapacity,

    #[error("Invalid limit range {min}..={max}; expected 1 <= min <= max.")]
    InvalidLimitRange { min: u32, max: u32 },

    #[error("Unable to parse target `{template}`: {source}")]
    InvalidTarget {
        template: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported target scheme `{0}`; expected http or https.")]
    UnsupportedScheme(String),
}

/// Settings for a single run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub target: String,
    pub jobs: usize,
    pub concurrency: usize,
    pub limit_range: RangeInclusive<u32>,
    /// `None` leaves the job queue unbounded.
    pub queue_capacity: Option<usize>,
    /// Per-request timeout handed to the HTTP client.
    pub timeout: Option<Duration>,
    /// Seed for `limit` sampling; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl RunConfig {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            jobs: DEFAULT_JOB_COUNT,
            concurrency: DEFAULT_CONCURRENCY,
            limit_range: DEFAULT_LIMIT_RANGE,
            queue_capacity: None,
            timeout: None,
            seed: None,
        }
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn limit_range(mut self, limit_range: RangeInclusive<u32>) -> Self {
        self.limit_range = limit_range;
        self
    }

    pub fn queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = Some(queue_capacity);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every setting, returning the parsed target on success.
    pub fn validate(&self) -> Result<TargetTemplate, ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        if self.queue_capacity == Some(0) {
            return Err(ConfigError::ZeroQueueCapacity);
        }

        let (min, max) = (*self.limit_range.start(), *self.limit_range.end());
        if min == 0 || min > max {
            return Err(ConfigError::InvalidLimitRange { min, max });
        }

        TargetTemplate::parse(&self.target)
    }
}
