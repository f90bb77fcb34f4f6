use crate::OutcomeKind;

/// Histogram of every latency that lands in a bucket, in seconds.
pub const LATENCY_METRIC: &str = "stampede_latency";

/// Counter name for a given outcome kind.
pub const fn outcome_metric(kind: OutcomeKind) -> &'static str {
    match kind {
        OutcomeKind::Success => "stampede_success",
        OutcomeKind::TransportError => "stampede_transport_error",
        OutcomeKind::BadStatus => "stampede_bad_status",
        OutcomeKind::DecodeError => "stampede_decode_error",
    }
}
