//! Prometheus metrics

use crate::execution::OrderResult;
use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Round trip of one exchange submission
    OrderSubmission,
    /// Single price read at grid creation
    PriceRead,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::OrderSubmission => "algoexec_order_submission_latency_ms",
        LatencyMetric::PriceRead => "algoexec_price_read_latency_ms",
    };

    histogram!(metric_name).record(duration.as_secs_f64() * 1000.0);
}

/// Count one submission by outcome
pub fn record_order_outcome(result: &OrderResult) {
    let outcome = match result.failure_kind() {
        None => "accepted",
        Some(kind) => kind.as_str(),
    };

    counter!(
        "algoexec_orders_total",
        "order_type" => result.order_type.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Count one executed TWAP slice
pub fn record_twap_slice(failed: bool) {
    let outcome = if failed { "failed" } else { "accepted" };
    counter!("algoexec_twap_slices_total", "outcome" => outcome).increment(1);
}

/// Count one grid level placement
pub fn record_grid_level(failed: bool) {
    let outcome = if failed { "failed" } else { "accepted" };
    counter!("algoexec_grid_levels_total", "outcome" => outcome).increment(1);
}

/// Publish the number of active strategies
pub fn set_active_strategies(count: usize) {
    gauge!("algoexec_active_strategies").set(count as f64);
}
