use crate::{Bucket, OutcomeKind};
use serde::{Serialize, Serializer};
use serde_with::{serde_as, DurationMilliSecondsWithFrac, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;

/// Per-kind outcome tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub success: u64,
    pub transport_error: u64,
    pub bad_status: u64,
    pub decode_error: u64,
}

impl OutcomeCounts {
    pub fn increment(&mut self, kind: OutcomeKind) {
        *self.slot(kind) += 1;
    }

    pub fn get(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::Success => self.success,
            OutcomeKind::TransportError => self.transport_error,
            OutcomeKind::BadStatus => self.bad_status,
            OutcomeKind::DecodeError => self.decode_error,
        }
    }

    pub fn total(&self) -> u64 {
        self.success + self.errors()
    }

    pub fn errors(&self) -> u64 {
        self.transport_error + self.bad_status + self.decode_error
    }

    fn slot(&mut self, kind: OutcomeKind) -> &mut u64 {
        match kind {
            OutcomeKind::Success => &mut self.success,
            OutcomeKind::TransportError => &mut self.transport_error,
            OutcomeKind::BadStatus => &mut self.bad_status,
            OutcomeKind::DecodeError => &mut self.decode_error,
        }
    }
}

/// Histogram counters indexed by [`Bucket`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts([u64; Bucket::ALL.len()]);

impl BucketCounts {
    pub fn increment(&mut self, bucket: Bucket) {
        self.0[bucket.index()] += 1;
    }

    pub fn get(&self, bucket: Bucket) -> u64 {
        self.0[bucket.index()]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Bucket counts in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, u64)> + '_ {
        Bucket::ALL.iter().map(|bucket| (*bucket, self.get(*bucket)))
    }
}

impl Serialize for BucketCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(bucket, count)| (bucket.label(), count)))
    }
}

/// Latency distribution of every bucketed sample. All zero when nothing was bucketed.
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub min: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub p50: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub p90: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub p99: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub max: Duration,
}

/// Consistent copy of every counter an aggregator holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub outcomes: OutcomeCounts,
    pub buckets: BucketCounts,
    pub latency: LatencySummary,
}

/// Final report for one run, taken after the pool has drained.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub jobs_submitted: u64,
    pub completed: u64,
    pub panicked: u64,
    pub outcomes: OutcomeCounts,
    pub buckets: BucketCounts,
    pub latency: LatencySummary,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub elapsed: Duration,
    pub requests_per_second: f64,
}

impl RunSummary {
    pub fn new(jobs_submitted: u64, panicked: u64, snapshot: Snapshot, elapsed: Duration) -> Self {
        let completed = snapshot.outcomes.total();
        Self {
            jobs_submitted,
            completed,
            panicked,
            outcomes: snapshot.outcomes,
            buckets: snapshot.buckets,
            latency: snapshot.latency,
            elapsed,
            requests_per_second: requests_per_second(completed, elapsed),
        }
    }

    pub fn error_count(&self) -> u64 {
        self.outcomes.errors()
    }

    /// Checks the accounting invariants: every submitted job ended as exactly one outcome (or
    /// a panic), and every outcome that reached the target sits in exactly one bucket.
    pub fn is_consistent(&self) -> bool {
        self.completed + self.panicked == self.jobs_submitted
            && self.buckets.total() + self.outcomes.transport_error == self.completed
    }
}

/// Completed requests per second of wall-clock time. Zero when nothing completed or no time
/// elapsed.
pub fn requests_per_second(completed: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if completed == 0 || secs <= 0. {
        0.
    } else {
        completed as f64 / secs
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "jobs: {} submitted, {} completed, {} panicked",
            self.jobs_submitted, self.completed, self.panicked
        )?;
        writeln!(f, "elapsed: {}", humantime::format_duration(self.elapsed))?;
        writeln!(f, "rps: {:.2}", self.requests_per_second)?;
        writeln!(f, "errors: {}", self.error_count())?;
        for kind in OutcomeKind::ALL {
            writeln!(f, "  {:<16} {}", kind.as_str(), self.outcomes.get(kind))?;
        }
        writeln!(f, "latency buckets (ms):")?;
        for (bucket, count) in self.buckets.iter() {
            writeln!(f, "  {:<16} {}", bucket.label(), count)?;
        }
        write!(
            f,
            "latency: min={:?}, p50={:?}, p90={:?}, p99={:?}, max={:?}",
            self.latency.min, self.latency.p50, self.latency.p90, self.latency.p99, self.latency.max,
        )
    }
}
