use std::ops::RangeInclusive;

/// Target hit when nothing else is configured.
pub const DEFAULT_TARGET: &str = "http://localhost:8080/go-animals";

/// Number of jobs in a batch when not configured.
pub const DEFAULT_JOB_COUNT: usize = 100;

/// Number of concurrent workers when not configured.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Range `limit` values are drawn from when not configured.
pub const DEFAULT_LIMIT_RANGE: RangeInclusive<u32> = 1..=100;

/// Placeholder substituted with the job's `limit` in a target template.
pub const LIMIT_PLACEHOLDER: &str = "{limit}";

/// Query parameter carrying the job's `limit` when the template has no placeholder.
pub const LIMIT_QUERY_PARAM: &str = "limit";
