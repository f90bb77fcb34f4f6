use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A single unit of load: one GET against the target with the given `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Job {
    pub limit: u32,
}

impl Job {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }
}

/// Classified result of executing a [`Job`].
///
/// Latency is carried by every variant, failures included, measured from the start of the
/// request until the outcome was known.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { item_count: usize, latency: Duration },
    TransportError { cause: String, latency: Duration },
    BadStatus { code: u16, latency: Duration },
    DecodeError { cause: String, latency: Duration },
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success { .. } => OutcomeKind::Success,
            Outcome::TransportError { .. } => OutcomeKind::TransportError,
            Outcome::BadStatus { .. } => OutcomeKind::BadStatus,
            Outcome::DecodeError { .. } => OutcomeKind::DecodeError,
        }
    }

    pub fn latency(&self) -> Duration {
        match self {
            Outcome::Success { latency, .. }
            | Outcome::TransportError { latency, .. }
            | Outcome::BadStatus { latency, .. }
            | Outcome::DecodeError { latency, .. } => *latency,
        }
    }

    /// Latency of a completed round trip, i.e. one where the target answered.
    ///
    /// Transport failures never reached the target, so their time-to-failure is not a
    /// round-trip measurement and stays out of the histogram.
    pub fn measured_latency(&self) -> Option<Duration> {
        match self {
            Outcome::TransportError { .. } => None,
            _ => Some(self.latency()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success {
                item_count,
                latency,
            } => write!(f, "success ({item_count} items) in {latency:?}"),
            Outcome::TransportError { cause, latency } => {
                write!(f, "transport error after {latency:?}: {cause}")
            }
            Outcome::BadStatus { code, latency } => {
                write!(f, "bad status {code} after {latency:?}")
            }
            Outcome::DecodeError { cause, latency } => {
                write!(f, "decode error after {latency:?}: {cause}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    TransportError,
    BadStatus,
    DecodeError,
}

impl OutcomeKind {
    /// Every kind, in report order.
    pub const ALL: [OutcomeKind; 4] = [
        OutcomeKind::Success,
        OutcomeKind::TransportError,
        OutcomeKind::BadStatus,
        OutcomeKind::DecodeError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::TransportError => "transport_error",
            OutcomeKind::BadStatus => "bad_status",
            OutcomeKind::DecodeError => "decode_error",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latency histogram bucket, in whole milliseconds.
///
/// The first bucket includes zero; every other range excludes its lower bound and includes its
/// upper bound. Anything that cannot be expressed as a non-negative millisecond count is
/// `Uncategorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Bucket {
    #[serde(rename = "0-50")]
    UpTo50,
    #[serde(rename = "51-200")]
    UpTo200,
    #[serde(rename = "201-500")]
    UpTo500,
    #[serde(rename = "501-1000")]
    UpTo1000,
    #[serde(rename = "1000-1500")]
    UpTo1500,
    #[serde(rename = "1501+")]
    Over1500,
    #[serde(rename = "uncategorized")]
    Uncategorized,
}

impl Bucket {
    /// Every bucket, in report order.
    pub const ALL: [Bucket; 7] = [
        Bucket::UpTo50,
        Bucket::UpTo200,
        Bucket::UpTo500,
        Bucket::UpTo1000,
        Bucket::UpTo1500,
        Bucket::Over1500,
        Bucket::Uncategorized,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::UpTo50 => "0-50",
            Bucket::UpTo200 => "51-200",
            Bucket::UpTo500 => "201-500",
            Bucket::UpTo1000 => "501-1000",
            Bucket::UpTo1500 => "1000-1500",
            Bucket::Over1500 => "1501+",
            Bucket::Uncategorized => "uncategorized",
        }
    }

    pub fn classify(latency: Duration) -> Self {
        match i64::try_from(latency.as_millis()) {
            Ok(millis) => Self::from_millis(millis),
            Err(_) => Bucket::Uncategorized,
        }
    }

    pub fn from_millis(millis: i64) -> Self {
        match millis {
            0..=50 => Bucket::UpTo50,
            51..=200 => Bucket::UpTo200,
            201..=500 => Bucket::UpTo500,
            501..=1000 => Bucket::UpTo1000,
            1001..=1500 => Bucket::UpTo1500,
            1501.. => Bucket::Over1500,
            _ => Bucket::Uncategorized,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(Bucket::from_millis(0), Bucket::UpTo50);
        assert_eq!(Bucket::from_millis(50), Bucket::UpTo50);
        assert_eq!(Bucket::from_millis(51), Bucket::UpTo200);
        assert_eq!(Bucket::from_millis(200), Bucket::UpTo200);
        assert_eq!(Bucket::from_millis(201), Bucket::UpTo500);
        assert_eq!(Bucket::from_millis(500), Bucket::UpTo500);
        assert_eq!(Bucket::from_millis(501), Bucket::UpTo1000);
        assert_eq!(Bucket::from_millis(1000), Bucket::UpTo1000);
        assert_eq!(Bucket::from_millis(1001), Bucket::UpTo1500);
        assert_eq!(Bucket::from_millis(1500), Bucket::UpTo1500);
        assert_eq!(Bucket::from_millis(1501), Bucket::Over1500);
        assert_eq!(Bucket::from_millis(i64::MAX), Bucket::Over1500);
    }

    #[test]
    fn negative_millis_are_uncategorized() {
        assert_eq!(Bucket::from_millis(-1), Bucket::Uncategorized);
        assert_eq!(Bucket::from_millis(i64::MIN), Bucket::Uncategorized);
    }

    #[test]
    fn sub_second_durations_use_numeric_value() {
        assert_eq!(Bucket::classify(Duration::from_micros(50_999)), Bucket::UpTo50);
        assert_eq!(Bucket::classify(Duration::from_millis(51)), Bucket::UpTo200);
        assert_eq!(Bucket::classify(Duration::from_millis(999)), Bucket::UpTo1000);
        assert_eq!(Bucket::classify(Duration::from_millis(1500)), Bucket::UpTo1500);
        assert_eq!(Bucket::classify(Duration::from_secs(3)), Bucket::Over1500);
    }

    #[test]
    fn oversized_duration_is_uncategorized() {
        assert_eq!(Bucket::classify(Duration::MAX), Bucket::Uncategorized);
    }

    #[test]
    fn transport_errors_have_no_measured_latency() {
        let latency = Duration::from_millis(12);
        let failed = Outcome::TransportError {
            cause: "connection refused".to_string(),
            latency,
        };
        assert_eq!(failed.kind(), OutcomeKind::TransportError);
        assert_eq!(failed.latency(), latency);
        assert_eq!(failed.measured_latency(), None);

        let bad = Outcome::BadStatus { code: 503, latency };
        assert_eq!(bad.measured_latency(), Some(latency));
        assert!(!bad.is_success());
    }
}
