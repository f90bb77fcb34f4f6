//! Shared helpers for driving full runs against the mock service.
use mock_service::MockService;
use stampede::{RunConfig, RunController, RunSummary};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("stampede=info,mock_service=info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Start a fresh mock service with logging in place.
pub async fn mock() -> MockService {
    init();
    mock_service::spawn()
        .await
        .expect("mock service failed to bind")
}

/// Run a batch against `path` on the mock.
pub async fn run_against(
    mock: &MockService,
    path: &str,
    jobs: usize,
    concurrency: usize,
) -> RunSummary {
    let config = RunConfig::new(&mock.url(path))
        .jobs(jobs)
        .concurrency(concurrency);
    run(config).await
}

pub async fn run(config: RunConfig) -> RunSummary {
    RunController::new(config)
        .run()
        .await
        .expect("run should not fail on a valid configuration")
}

/// Accounting invariants every finished run has to satisfy.
pub fn assert_accounting(summary: &RunSummary, jobs: u64) {
    assert_eq!(summary.jobs_submitted, jobs);
    assert_eq!(summary.panicked, 0);
    assert_eq!(summary.outcomes.total(), jobs);
    assert_eq!(
        summary.buckets.total() + summary.outcomes.transport_error,
        jobs
    );
    assert!(summary.is_consistent());
    assert!(summary.requests_per_second.is_finite());
}
