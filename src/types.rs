use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::analytics::TrendInsight;

/// Number of recent periods kept per district. The history slice is always
/// exactly this long; shorter series are padded during store construction.
pub const HISTORY_LEN: usize = 6;

/// One row as it arrives from the source, before any validation.
///
/// Every field is optional text: exports from the upstream portal routinely
/// carry blanks, stray units and malformed numbers, so parsing decisions all
/// live in the validator.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "DistrictId")]
    pub district_id: Option<String>,
    #[serde(rename = "DistrictName")]
    pub district_name: Option<String>,
    #[serde(rename = "StateName")]
    pub state_name: Option<String>,
    #[serde(rename = "Period")]
    pub period: Option<String>,
    #[serde(rename = "EmployedCount")]
    pub employed_count: Option<String>,
    #[serde(rename = "PaymentSpeedPct")]
    pub payment_speed_pct: Option<String>,
    #[serde(rename = "WorksCompleted")]
    pub works_completed: Option<String>,
    #[serde(rename = "WagesDisbursed")]
    pub wages_disbursed: Option<String>,
}

/// A validated row. String fields are trimmed and defaulted, metrics are
/// finite numbers (0.0 stands in for anything missing or unparseable).
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictRecord {
    pub district_id: String,
    pub district_name: String,
    pub state_name: String,
    pub period: String,
    pub employed_count: f64,
    pub payment_speed_pct: f64,
    pub works_completed: f64,
    pub wages_disbursed: f64,
}

/// Per-district state held by the store: the newest record plus a
/// fixed-length employment series, most-recent-first.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictEntry {
    pub latest: DistrictRecord,
    pub history: [f64; HISTORY_LEN],
}

/// Counters for one ingestion cycle. Rebuilt from scratch every cycle, never
/// accumulated across cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityMetrics {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub skipped_districts: usize,
    pub completeness_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSummary {
    pub id: String,
    pub display_name: String,
}

/// One metric rendered for display. `imputed` marks values (or categories)
/// that came out of an estimator instead of the source row.
#[derive(Debug, Clone, Serialize)]
pub struct MetricDisplay {
    pub value: Option<f64>,
    pub display: String,
    pub label: String,
    pub color: String,
    pub imputed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonDisplay {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MlInsights {
    pub predicted_employment: Option<f64>,
    pub forecast_employment: Option<f64>,
    pub trend: Option<TrendInsight>,
    pub latest_is_anomalous: Option<bool>,
}

/// Everything a dashboard needs to draw one district card.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayPayload {
    pub district_id: String,
    pub district_name: String,
    pub state_name: String,
    pub period: String,
    pub employment: MetricDisplay,
    pub payment_speed: MetricDisplay,
    pub state_comparison: ComparisonDisplay,
    pub works_completed: f64,
    /// Wages for the period, scaled into display units ("N/A" when absent).
    pub wages_disbursed: String,
    /// Employment series oldest-to-newest, ready for charting.
    pub history: Vec<f64>,
    pub insights: MlInsights,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DistrictOverviewRow {
    #[serde(rename = "DistrictId")]
    #[tabled(rename = "DistrictId")]
    pub district_id: String,
    #[serde(rename = "DistrictName")]
    #[tabled(rename = "DistrictName")]
    pub district_name: String,
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "Employment")]
    #[tabled(rename = "Employment")]
    pub employment: String,
    #[serde(rename = "EmploymentBand")]
    #[tabled(rename = "EmploymentBand")]
    pub employment_band: String,
    #[serde(rename = "PaymentSpeed")]
    #[tabled(rename = "PaymentSpeed")]
    pub payment_speed: String,
    #[serde(rename = "PaymentBand")]
    #[tabled(rename = "PaymentBand")]
    pub payment_band: String,
    #[serde(rename = "VsState")]
    #[tabled(rename = "VsState")]
    pub vs_state: String,
}
