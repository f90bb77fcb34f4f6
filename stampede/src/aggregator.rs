//! Shared tally of outcomes and their latencies.
use hdrhistogram::Histogram;
use stampede_core::{Bucket, BucketCounts, LatencySummary, Outcome, OutcomeCounts, Snapshot};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, trace, warn};

/// Largest latency the quantile histogram resolves, in microseconds. Longer samples saturate
/// here; min/max and the buckets still see the exact value.
const HISTOGRAM_HIGHEST_MICROS: u64 = 3_600_000_000;
const HISTOGRAM_SIGFIGS: u8 = 3;

/// Thread-safe histogram of completed requests.
///
/// Every counter lives behind one mutex so a [`snapshot`](Self::snapshot) always sees a
/// consistent view. Workers only ever touch it through [`record`](Self::record).
#[derive(Debug)]
pub struct LatencyAggregator {
    tallies: Mutex<Tallies>,
}

#[derive(Debug)]
struct Tallies {
    outcomes: OutcomeCounts,
    buckets: BucketCounts,
    latency: Histogram<u64>,
    min: Option<Duration>,
    max: Option<Duration>,
}

impl Default for LatencyAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyAggregator {
    pub fn new() -> Self {
        Self {
            tallies: Mutex::new(Tallies {
                outcomes: OutcomeCounts::default(),
                buckets: BucketCounts::default(),
                latency: default_histogram(),
                min: None,
                max: None,
            }),
        }
    }

    /// Count the outcome by kind and, if the target answered, place its latency in a bucket.
    pub fn record(&self, outcome: &Outcome) {
        let kind = outcome.kind();
        let measured = outcome.measured_latency();

        #[cfg(feature = "metrics")]
        {
            metrics::counter!(stampede_core::outcome_metric(kind)).increment(1);
            if let Some(latency) = measured {
                metrics::histogram!(stampede_core::LATENCY_METRIC)
                    .record(latency.as_secs_f64());
            }
        }

        let mut tallies = self.lock();
        tallies.outcomes.increment(kind);

        if let Some(latency) = measured {
            let bucket = Bucket::classify(latency);
            if bucket == Bucket::Uncategorized {
                warn!("Latency {latency:?} does not fit any bucket.");
            }
            tallies.buckets.increment(bucket);
            tallies
                .latency
                .saturating_record(u64::try_from(latency.as_micros()).unwrap_or(u64::MAX));
            tallies.min = Some(tallies.min.map_or(latency, |min| min.min(latency)));
            tallies.max = Some(tallies.max.map_or(latency, |max| max.max(latency)));
        }
    }

    /// Copy of every counter. Only a complete picture once no job is in flight.
    pub fn snapshot(&self) -> Snapshot {
        let tallies = self.lock();

        let latency = match (tallies.min, tallies.max) {
            (Some(min), Some(max)) => {
                let at = |q| quantile(&tallies.latency, q, min, max);
                LatencySummary {
                    min,
                    p50: at(0.5),
                    p90: at(0.9),
                    p99: at(0.99),
                    max,
                }
            }
            _ => LatencySummary::default(),
        };

        Snapshot {
            outcomes: tallies.outcomes,
            buckets: tallies.buckets,
            latency,
        }
    }

    // A panic while holding the lock cannot leave the plain counters half-written.
    fn lock(&self) -> MutexGuard<'_, Tallies> {
        self.tallies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Histogram buckets report their highest equivalent value, so the estimate is pinned to the
/// observed range.
fn quantile(histogram: &Histogram<u64>, q: f64, min: Duration, max: Duration) -> Duration {
    Duration::from_micros(histogram.value_at_quantile(q)).clamp(min, max)
}

fn default_histogram() -> Histogram<u64> {
    Histogram::new_with_bounds(1, HISTOGRAM_HIGHEST_MICROS, HISTOGRAM_SIGFIGS)
        .expect("histogram bounds are constant and valid")
}
