//! Counter metrics

use super::labels;

/// A `resolve` call finished with the given outcome label
pub fn resolve_completed(result: &'static str) {
    metrics::counter!("pgtwixt_resolve_total", labels::RESULT => result).increment(1);
}

/// One target of the given kind was materialized
pub fn target_resolved(kind: &'static str) {
    metrics::counter!("pgtwixt_targets_resolved_total", labels::KIND => kind).increment(1);
}

/// A dial attempt against a target of the given kind finished
pub fn dial_completed(kind: &'static str, result: &'static str) {
    metrics::counter!(
        "pgtwixt_dial_total",
        labels::KIND => kind,
        labels::RESULT => result
    )
    .increment(1);
}
