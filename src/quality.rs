// Completeness scoring and the alert predicate. Alert delivery (console
// line, pager, whatever) is the caller's problem; this module only decides.
use crate::types::QualityMetrics;

/// Completeness below this percentage should raise an alert.
pub const ALERT_THRESHOLD: f64 = 80.0;

/// Share of ingested rows that were accepted, as a percentage. An empty
/// snapshot scores 0, not NaN.
pub fn completeness(valid_rows: usize, total_rows: usize) -> f64 {
    if total_rows == 0 {
        return 0.0;
    }
    valid_rows as f64 / total_rows as f64 * 100.0
}

pub fn should_alert(metrics: &QualityMetrics) -> bool {
    metrics.completeness_score < ALERT_THRESHOLD
}
