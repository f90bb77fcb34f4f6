use stampede::{Bucket, OutcomeKind, RunConfig};
use stampede_tests::*;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fast_target_lands_in_first_bucket() {
    let mock = mock().await;

    let summary = run_against(&mock, "/animals?delay_ms=5", 1_000, 10).await;

    assert_accounting(&summary, 1_000);
    assert_eq!(summary.outcomes.get(OutcomeKind::Success), 1_000);
    assert_eq!(summary.error_count(), 0);
    assert_eq!(summary.buckets.get(Bucket::UpTo50), 1_000);
    for bucket in Bucket::ALL.iter().skip(1) {
        assert_eq!(summary.buckets.get(*bucket), 0, "bucket {bucket}");
    }
    assert!(summary.latency.min >= Duration::from_millis(5));
    assert!(summary.requests_per_second > 0.);

    assert_eq!(mock.requests(), 1_000);
    assert!(mock.max_in_flight() <= 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn server_errors_are_counted_and_bucketed() {
    let mock = mock().await;

    let summary = run_against(&mock, "/status/500", 200, 10).await;

    assert_accounting(&summary, 200);
    assert_eq!(summary.outcomes.get(OutcomeKind::BadStatus), 200);
    assert_eq!(summary.outcomes.success, 0);
    assert_eq!(summary.buckets.total(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_batch_reports_zero() {
    let mock = mock().await;

    let summary = run_against(&mock, "/animals", 0, 10).await;

    assert_accounting(&summary, 0);
    assert_eq!(summary.completed, 0);
    assert_eq!(summary.buckets.total(), 0);
    assert_eq!(summary.requests_per_second, 0.0);
    assert_eq!(mock.requests(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_target_completes_with_transport_errors() {
    init();
    let addr = mock_service::unused_addr().unwrap();
    let config = RunConfig::new(&format!("http://{addr}/animals"))
        .jobs(50)
        .concurrency(5);

    let summary = run(config).await;

    assert_accounting(&summary, 50);
    assert_eq!(summary.outcomes.get(OutcomeKind::TransportError), 50);
    assert_eq!(summary.buckets.total(), 0);

    let report = summary.to_string();
    assert!(report.contains("transport_error"));
    assert!(report.contains("uncategorized"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn malformed_bodies_are_decode_errors() {
    let mock = mock().await;

    let summary = run_against(&mock, "/malformed", 40, 4).await;
    assert_accounting(&summary, 40);
    assert_eq!(summary.outcomes.get(OutcomeKind::DecodeError), 40);

    let summary = run_against(&mock, "/wrong-shape", 40, 4).await;
    assert_accounting(&summary, 40);
    assert_eq!(summary.outcomes.get(OutcomeKind::DecodeError), 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn timeouts_are_transport_errors() {
    let mock = mock().await;
    let config = RunConfig::new(&mock.url("/animals?delay_ms=2000"))
        .jobs(10)
        .concurrency(5)
        .timeout(Duration::from_millis(50));

    let summary = run(config).await;

    assert_accounting(&summary, 10);
    assert_eq!(summary.outcomes.get(OutcomeKind::TransportError), 10);
    assert!(summary.elapsed < Duration::from_secs(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn in_flight_requests_never_exceed_pool_size() {
    let mock = mock().await;

    let summary = run_against(&mock, "/animals?delay_ms=10", 120, 4).await;

    assert_accounting(&summary, 120);
    assert_eq!(summary.outcomes.success, 120);
    assert!(mock.max_in_flight() <= 4);
    assert!(mock.max_in_flight() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bounded_queue_still_runs_everything() {
    let mock = mock().await;
    let config = RunConfig::new(&mock.url("/animals"))
        .jobs(300)
        .concurrency(3)
        .queue_capacity(2)
        .limit_range(10..=10)
        .seed(1);

    let summary = run(config).await;

    assert_accounting(&summary, 300);
    assert_eq!(summary.outcomes.success, 300);
    assert_eq!(mock.requests(), 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn placeholder_template_targets_the_animals_route() {
    let mock = mock().await;
    let config = RunConfig::new(&mock.url("/go-animals?limit={limit}"))
        .jobs(20)
        .concurrency(4)
        .limit_range(1..=3);

    let summary = run(config).await;

    assert_accounting(&summary, 20);
    assert_eq!(summary.outcomes.success, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn json_report_lists_buckets_in_canonical_order() {
    let mock = mock().await;

    let summary = run_against(&mock, "/animals", 5, 2).await;
    let json = serde_json::to_string(&summary).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["outcomes"]["success"], 5);
    assert_eq!(value["jobs_submitted"], 5);

    let positions: Vec<_> = Bucket::ALL
        .iter()
        .map(|bucket| json.find(&format!("\"{}\"", bucket.label())).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}
