//! Histogram metrics

use super::labels;

/// Time spent in one dial attempt, in milliseconds
pub fn dial_duration(kind: &'static str, duration_ms: u64) {
    metrics::histogram!("pgtwixt_dial_duration_ms", labels::KIND => kind).record(duration_ms as f64);
}
