// Row validation: one fatal check (district id), everything else degrades
// to a default with a warning. Counters feed the quality monitor; the log
// events are the engine's only side channel and are picked up by whatever
// subscriber the host process installed.
use tracing::{error, warn};

use crate::types::{DistrictRecord, QualityMetrics, RawRecord};
use crate::util::{parse_f64_safe, parse_period_safe};

pub const DEFAULT_DISTRICT_NAME: &str = "Unknown District";
pub const DEFAULT_STATE_NAME: &str = "Unknown";

/// Validate a single raw row.
///
/// Returns the normalized record for accepted rows, `None` for rejected
/// ones. `metrics` is updated either way: `total_rows` always, then
/// `valid_rows` or `invalid_rows`/`skipped_districts` depending on the
/// outcome. Degraded fields keep the row valid.
pub fn validate(row: &RawRecord, metrics: &mut QualityMetrics) -> Option<DistrictRecord> {
    metrics.total_rows += 1;

    let district_id = match row.district_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            metrics.invalid_rows += 1;
            metrics.skipped_districts += 1;
            error!("row rejected: missing or empty district id");
            return None;
        }
    };

    let district_name = non_empty_or_default(
        row.district_name.as_deref(),
        "DistrictName",
        DEFAULT_DISTRICT_NAME,
        &district_id,
    );
    let state_name = non_empty_or_default(
        row.state_name.as_deref(),
        "StateName",
        DEFAULT_STATE_NAME,
        &district_id,
    );

    let period = match parse_period_safe(row.period.as_deref()) {
        Some(p) => p,
        None => {
            warn!(
                district = %district_id,
                "field Period is not a valid year-month token, substituting \"\""
            );
            String::new()
        }
    };

    let employed_count = numeric_or_default(row.employed_count.as_deref(), "EmployedCount", &district_id);
    let payment_speed_pct =
        numeric_or_default(row.payment_speed_pct.as_deref(), "PaymentSpeedPct", &district_id);
    let works_completed =
        numeric_or_default(row.works_completed.as_deref(), "WorksCompleted", &district_id);
    let wages_disbursed =
        numeric_or_default(row.wages_disbursed.as_deref(), "WagesDisbursed", &district_id);

    metrics.valid_rows += 1;
    Some(DistrictRecord {
        district_id,
        district_name,
        state_name,
        period,
        employed_count,
        payment_speed_pct,
        works_completed,
        wages_disbursed,
    })
}

fn non_empty_or_default(raw: Option<&str>, field: &str, default: &str, district_id: &str) -> String {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => {
            warn!(district = %district_id, field, default, "field is empty, substituting default");
            default.to_string()
        }
    }
}

fn numeric_or_default(raw: Option<&str>, field: &str, district_id: &str) -> f64 {
    match parse_f64_safe(raw) {
        Some(v) => v,
        None => {
            warn!(district = %district_id, field, "field is not a finite number, substituting 0");
            0.0
        }
    }
}
