use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// Only one recorder can be installed per process; later calls (tests that
/// build several routers) get a detached handle instead of panicking.
pub fn init_metrics() -> PrometheusHandle {
    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::debug!(error = %e, "Prometheus recorder already installed");
            PrometheusBuilder::new().build_recorder().handle()
        }
    };

    // Pre-register counters so they appear even before the first increment.
    counter!("odds_fixtures_locked_total").absolute(0);
    counter!("odds_predictions_snapshotted_total").absolute(0);
    counter!("odds_lock_skipped_total").absolute(0);
    counter!("odds_events_mapped_total").absolute(0);
    counter!("predictions_settled_total").absolute(0);
    counter!("settlement_write_failures_total").absolute(0);
    counter!("fixtures_results_synced_total").absolute(0);
    counter!("predictions_submitted_total").absolute(0);
    counter!("leaderboard_requests_total").absolute(0);
    counter!("rate_limited_requests_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("job_duration_seconds", "job" => "odds_lock").record(0.0);

    handle
}
