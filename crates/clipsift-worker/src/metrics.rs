//! Prometheus metrics for pipeline runs.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use clipsift_models::AnalyzerSource;

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_TOTAL: &str = "clipsift_runs_total";
    pub const RUN_DURATION_SECONDS: &str = "clipsift_run_duration_seconds";

    pub const CANDIDATES_GENERATED_TOTAL: &str = "clipsift_candidates_generated_total";
    pub const CANDIDATES_DEDUPLICATED_TOTAL: &str = "clipsift_candidates_deduplicated_total";
    pub const TOPIC_FILTER_FAILURES_TOTAL: &str = "clipsift_topic_filter_failures_total";
    pub const JUDGE_CALLS_TOTAL: &str = "clipsift_judge_calls_total";
    pub const JUDGE_DURATION_SECONDS: &str = "clipsift_judge_duration_seconds";
    pub const CLIPS_SELECTED_TOTAL: &str = "clipsift_clips_selected_total";

    pub const CLIPS_RENDERED_TOTAL: &str = "clipsift_clips_rendered_total";
    pub const FFMPEG_DURATION_SECONDS: &str = "clipsift_ffmpeg_duration_seconds";
}

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!("Prometheus exporter listening on {}", addr);
    Ok(())
}

/// Record the outcome of a pipeline run.
pub fn record_run(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
    histogram!(names::RUN_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record candidate counts after generation and overlap resolution.
pub fn record_candidates(generated: usize, deduplicated: usize) {
    counter!(names::CANDIDATES_GENERATED_TOTAL).increment(generated as u64);
    counter!(names::CANDIDATES_DEDUPLICATED_TOTAL).increment(deduplicated as u64);
}

pub fn record_topic_filter_failure() {
    counter!(names::TOPIC_FILTER_FAILURES_TOTAL).increment(1);
}

/// Record one quality analysis.
pub fn record_judge_call(source: AnalyzerSource, duration_secs: f64) {
    let outcome = match source {
        AnalyzerSource::ExternalJudge => "ok",
        AnalyzerSource::Heuristic => "fallback",
    };
    let labels = [("outcome", outcome.to_string())];
    counter!(names::JUDGE_CALLS_TOTAL, &labels).increment(1);
    histogram!(names::JUDGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_selected(count: usize) {
    counter!(names::CLIPS_SELECTED_TOTAL).increment(count as u64);
}

/// Record one clip render.
pub fn record_render(success: bool, duration_secs: f64) {
    let outcome = if success { "ok" } else { "failed" };
    let labels = [("outcome", outcome.to_string())];
    counter!(names::CLIPS_RENDERED_TOTAL, &labels).increment(1);
    histogram!(names::FFMPEG_DURATION_SECONDS, &labels).record(duration_secs);
}
