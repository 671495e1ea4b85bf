// The engine facade. Owns the current (store, quality) snapshot behind a
// mutex-guarded Arc: readers clone the Arc and work on an immutable
// snapshot, `rebuild` swaps in a fully-built replacement in one assignment.
// A read that started before a swap keeps its old snapshot alive.
use std::sync::{Arc, Mutex};

use crate::analytics::{self, AnalyticsConfig, ClusterGroup, DistrictPoint, SpeedCategory, TrendInsight};
use crate::quality;
use crate::rules::{BandStyle, RuleConfig};
use crate::store::{self, DistrictStore};
use crate::types::{
    ComparisonDisplay, DisplayPayload, DistrictEntry, DistrictSummary, MetricDisplay, MlInsights,
    QualityMetrics, RawRecord,
};

#[derive(Debug, Default)]
struct EngineState {
    store: DistrictStore,
    quality: QualityMetrics,
}

pub struct Engine {
    rules: RuleConfig,
    analytics: AnalyticsConfig,
    state: Mutex<Arc<EngineState>>,
}

impl Engine {
    pub fn new(rules: RuleConfig, analytics: AnalyticsConfig) -> Self {
        Self {
            rules,
            analytics,
            state: Mutex::new(Arc::new(EngineState::default())),
        }
    }

    fn snapshot(&self) -> Arc<EngineState> {
        self.state.lock().unwrap().clone()
    }

    /// Full-snapshot ingestion. The previous store stays visible to in-flight
    /// readers until the new one is complete.
    pub fn rebuild(&self, rows: &[RawRecord]) -> QualityMetrics {
        let (store, metrics) = store::build_store(rows);
        let next = Arc::new(EngineState {
            store,
            quality: metrics.clone(),
        });
        *self.state.lock().unwrap() = next;
        metrics
    }

    pub fn get_district(&self, id: &str) -> Option<DistrictEntry> {
        self.snapshot().store.get(id).cloned()
    }

    /// Districts ordered by id, optionally narrowed to one state
    /// (case-insensitive).
    pub fn list_districts(&self, state_filter: Option<&str>) -> Vec<DistrictSummary> {
        let snap = self.snapshot();
        snap.store
            .values()
            .filter(|entry| match state_filter {
                Some(state) => entry.latest.state_name.eq_ignore_ascii_case(state.trim()),
                None => true,
            })
            .map(|entry| DistrictSummary {
                id: entry.latest.district_id.clone(),
                display_name: entry.latest.district_name.clone(),
            })
            .collect()
    }

    pub fn get_quality(&self) -> QualityMetrics {
        self.snapshot().quality.clone()
    }

    pub fn should_alert(&self) -> bool {
        quality::should_alert(&self.snapshot().quality)
    }

    /// Trend-regression estimate of next-period employment.
    pub fn predicted_employment(&self, id: &str) -> Option<f64> {
        if !(self.analytics.enabled && self.analytics.trend) {
            return None;
        }
        let entry = self.get_district(id)?;
        analytics::predict_next(&chronological(&entry))
    }

    /// Trend direction plus the expected payment-speed tier.
    pub fn trend_insight(&self, id: &str) -> Option<TrendInsight> {
        if !(self.analytics.enabled && self.analytics.category) {
            return None;
        }
        let entry = self.get_district(id)?;
        analytics::classify_trend(&chronological(&entry), entry.latest.employed_count)
    }

    /// Exponentially smoothed employment forecast.
    pub fn forecast(&self, id: &str) -> Option<f64> {
        if !(self.analytics.enabled && self.analytics.forecast) {
            return None;
        }
        let entry = self.get_district(id)?;
        analytics::smooth_forecast(&chronological(&entry))
    }

    /// Whether the latest employment figure is a z-score outlier against the
    /// district's own history.
    pub fn latest_is_anomalous(&self, id: &str) -> Option<bool> {
        if !(self.analytics.enabled && self.analytics.anomaly) {
            return None;
        }
        let entry = self.get_district(id)?;
        Some(analytics::is_anomalous(
            &chronological(&entry),
            entry.latest.employed_count,
        ))
    }

    /// Partition of all districts across the three fixed performance
    /// centroids.
    pub fn cluster_assignments(&self) -> Option<Vec<ClusterGroup>> {
        if !(self.analytics.enabled && self.analytics.clustering) {
            return None;
        }
        let snap = self.snapshot();
        let points: Vec<DistrictPoint> = snap
            .store
            .values()
            .map(|entry| DistrictPoint {
                id: entry.latest.district_id.clone(),
                employment: entry.latest.employed_count,
                payment_speed: entry.latest.payment_speed_pct,
            })
            .collect();
        Some(analytics::cluster_districts(&points))
    }

    /// The display-ready view of one district. Imputation runs only where
    /// the stored value is missing/zero: employment gaps get a trend
    /// prediction, payment-speed gaps get a rule-predicted category.
    pub fn get_display_payload(&self, id: &str) -> Option<DisplayPayload> {
        let entry = self.get_district(id)?;
        let history = chronological(&entry);
        let latest = &entry.latest;

        let employment = self.employment_display(latest.employed_count, &history);
        let payment_speed = self.payment_display(latest.payment_speed_pct, &history, employment.value);
        let state_comparison = if latest.payment_speed_pct > 0.0 {
            style_to_comparison(self.rules.comparison.judge(latest.payment_speed_pct))
        } else {
            style_to_comparison(&self.rules.unavailable)
        };

        let insights = MlInsights {
            predicted_employment: self.predicted_employment(id),
            forecast_employment: self.forecast(id),
            trend: self.trend_insight(id),
            latest_is_anomalous: self.latest_is_anomalous(id),
        };

        let wages_disbursed = if latest.wages_disbursed > 0.0 {
            self.rules.format_magnitude(latest.wages_disbursed)
        } else {
            "N/A".to_string()
        };

        Some(DisplayPayload {
            district_id: latest.district_id.clone(),
            district_name: latest.district_name.clone(),
            state_name: latest.state_name.clone(),
            period: latest.period.clone(),
            employment,
            payment_speed,
            state_comparison,
            works_completed: latest.works_completed,
            wages_disbursed,
            history,
            insights,
        })
    }

    fn employment_display(&self, raw: f64, history: &[f64]) -> MetricDisplay {
        let (value, imputed) = if raw > 0.0 {
            (Some(raw), false)
        } else if self.analytics.enabled && self.analytics.trend {
            (analytics::predict_next(history), true)
        } else {
            (None, false)
        };
        match value {
            Some(v) => {
                let style = self.rules.employment.classify(v);
                MetricDisplay {
                    value: Some(v),
                    display: self.rules.format_magnitude(v),
                    label: style.label.clone(),
                    color: style.color.clone(),
                    imputed,
                }
            }
            None => self.unavailable_metric(),
        }
    }

    fn payment_display(&self, raw: f64, history: &[f64], employment: Option<f64>) -> MetricDisplay {
        if raw > 0.0 {
            let style = self.rules.payment_speed.classify(raw);
            return MetricDisplay {
                value: Some(raw),
                display: format!("{:.1}%", raw),
                label: style.label.clone(),
                color: style.color.clone(),
                imputed: false,
            };
        }
        if self.analytics.enabled && self.analytics.category {
            if let Some(emp) = employment {
                if let Some(insight) = analytics::classify_trend(history, emp) {
                    let style = self.category_style(insight.expected_speed);
                    return MetricDisplay {
                        value: None,
                        display: "N/A".to_string(),
                        label: format!("Predicted: {}", insight.expected_speed),
                        color: style.color.clone(),
                        imputed: true,
                    };
                }
            }
        }
        self.unavailable_metric()
    }

    fn category_style(&self, category: SpeedCategory) -> &BandStyle {
        match category {
            SpeedCategory::Fast => self.rules.payment_speed.band_style(0),
            SpeedCategory::Moderate => self.rules.payment_speed.band_style(1),
            SpeedCategory::Slow => self.rules.payment_speed.floor_style(),
        }
    }

    fn unavailable_metric(&self) -> MetricDisplay {
        MetricDisplay {
            value: None,
            display: "N/A".to_string(),
            label: self.rules.unavailable.label.clone(),
            color: self.rules.unavailable.color.clone(),
            imputed: false,
        }
    }
}

/// The store keeps history most-recent-first; estimators want it
/// chronological.
fn chronological(entry: &DistrictEntry) -> Vec<f64> {
    entry.history.iter().rev().copied().collect()
}

fn style_to_comparison(style: &BandStyle) -> ComparisonDisplay {
    ComparisonDisplay {
        label: style.label.clone(),
        color: style.color.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::TrendDirection;

    fn raw(id: &str, state: &str, period: &str, employed: &str, speed: &str) -> RawRecord {
        RawRecord {
            district_id: Some(id.to_string()),
            district_name: Some(format!("{} District", id)),
            state_name: Some(state.to_string()),
            period: Some(period.to_string()),
            employed_count: Some(employed.to_string()),
            payment_speed_pct: Some(speed.to_string()),
            works_completed: Some("12".to_string()),
            wages_disbursed: Some("500000".to_string()),
        }
    }

    fn default_engine() -> Engine {
        Engine::new(RuleConfig::dashboard_defaults(), AnalyticsConfig::default())
    }

    fn linear_history(id: &str, state: &str, speed: &str) -> Vec<RawRecord> {
        // Oldest 10 up to newest 60; the chronological reversal is an exact
        // slope-10 line.
        (1..=6)
            .map(|m| raw(id, state, &format!("2023-{:02}", m), &format!("{}", m * 10), speed))
            .collect()
    }

    #[test]
    fn rebuild_then_lookup_round_trips() {
        let engine = default_engine();
        let metrics = engine.rebuild(&[raw("RJ-01", "Rajasthan", "2023-04", "125000", "92")]);
        assert_eq!(metrics.valid_rows, 1);
        let entry = engine.get_district("RJ-01").unwrap();
        assert_eq!(entry.latest.employed_count, 125000.0);
        assert!(engine.get_district("nope").is_none());
    }

    #[test]
    fn rebuild_replaces_rather_than_merges() {
        let engine = default_engine();
        engine.rebuild(&[raw("RJ-01", "Rajasthan", "2023-04", "100", "90")]);
        engine.rebuild(&[raw("MH-07", "Maharashtra", "2023-04", "100", "90")]);
        assert!(engine.get_district("RJ-01").is_none());
        assert!(engine.get_district("MH-07").is_some());
    }

    #[test]
    fn list_districts_filters_by_state_case_insensitively() {
        let engine = default_engine();
        engine.rebuild(&[
            raw("MH-07", "Maharashtra", "2023-04", "100", "90"),
            raw("RJ-01", "Rajasthan", "2023-04", "100", "90"),
            raw("RJ-02", "Rajasthan", "2023-04", "100", "90"),
        ]);
        let all = engine.list_districts(None);
        assert_eq!(all.len(), 3);
        // BTreeMap ordering makes the listing deterministic.
        assert_eq!(all[0].id, "MH-07");
        let rajasthan = engine.list_districts(Some("rajasthan"));
        assert_eq!(rajasthan.len(), 2);
        assert!(engine.list_districts(Some("Kerala")).is_empty());
    }

    #[test]
    fn payload_classifies_present_values_without_imputing() {
        let engine = default_engine();
        engine.rebuild(&[raw("RJ-01", "Rajasthan", "2023-04", "145000", "92")]);
        let payload = engine.get_display_payload("RJ-01").unwrap();
        assert_eq!(payload.employment.display, "1.45 Lakh");
        assert_eq!(payload.employment.label, "High Availability");
        assert!(!payload.employment.imputed);
        assert_eq!(payload.payment_speed.display, "92.0%");
        assert_eq!(payload.payment_speed.label, "Fast Payments");
        assert_eq!(payload.state_comparison.label, "Above State Benchmark");
        assert_eq!(payload.wages_disbursed, "5.00 Lakh");
        // Chronological series ends at the latest value.
        assert_eq!(payload.history.last().copied(), Some(145000.0));
    }

    #[test]
    fn missing_employment_is_imputed_from_the_trend() {
        let engine = default_engine();
        let mut rows = linear_history("RJ-01", "Rajasthan", "92");
        rows.push(raw("RJ-01", "Rajasthan", "2023-07", "0", "92"));
        engine.rebuild(&rows);
        let payload = engine.get_display_payload("RJ-01").unwrap();
        assert!(payload.employment.imputed);
        // History window is [60..20, 0]; the fit over the five usable points
        // predicts the next step of the slope-10 line.
        assert_eq!(payload.employment.value, Some(70.0));
    }

    #[test]
    fn missing_payment_speed_gets_a_predicted_category() {
        let engine = default_engine();
        engine.rebuild(&[
            raw("RJ-01", "Rajasthan", "2023-03", "110000", "0"),
            raw("RJ-01", "Rajasthan", "2023-04", "125000", "0"),
        ]);
        let payload = engine.get_display_payload("RJ-01").unwrap();
        assert!(payload.payment_speed.imputed);
        assert_eq!(payload.payment_speed.label, "Predicted: Fast");
        assert_eq!(payload.payment_speed.value, None);
        // No raw payment figure means no state comparison either.
        assert_eq!(payload.state_comparison.label, "Data Not Available");
    }

    #[test]
    fn unavailable_when_nothing_can_be_imputed() {
        let engine = default_engine();
        engine.rebuild(&[raw("RJ-01", "Rajasthan", "2023-04", "0", "0")]);
        let payload = engine.get_display_payload("RJ-01").unwrap();
        // All-zero history gives the trend estimator nothing to fit.
        assert_eq!(payload.employment.label, "Data Not Available");
        assert!(!payload.employment.imputed);
    }

    #[test]
    fn estimator_queries_cover_the_linear_fixture() {
        let engine = default_engine();
        engine.rebuild(&linear_history("RJ-01", "Rajasthan", "92"));
        assert_eq!(engine.predicted_employment("RJ-01"), Some(70.0));
        assert!(engine.forecast("RJ-01").is_some());
        let insight = engine.trend_insight("RJ-01").unwrap();
        assert_eq!(insight.direction, TrendDirection::Improving);
        assert_eq!(engine.latest_is_anomalous("RJ-01"), Some(false));
        assert!(engine.predicted_employment("nope").is_none());
    }

    #[test]
    fn disabled_estimators_return_no_result() {
        let analytics = AnalyticsConfig {
            enabled: true,
            trend: false,
            category: false,
            forecast: false,
            anomaly: false,
            clustering: false,
        };
        let engine = Engine::new(RuleConfig::dashboard_defaults(), analytics);
        engine.rebuild(&linear_history("RJ-01", "Rajasthan", "92"));
        assert_eq!(engine.predicted_employment("RJ-01"), None);
        assert_eq!(engine.forecast("RJ-01"), None);
        assert_eq!(engine.trend_insight("RJ-01"), None);
        assert_eq!(engine.latest_is_anomalous("RJ-01"), None);
        assert_eq!(engine.cluster_assignments(), None);
    }

    #[test]
    fn master_flag_overrides_individual_flags() {
        let analytics = AnalyticsConfig {
            enabled: false,
            ..AnalyticsConfig::default()
        };
        let engine = Engine::new(RuleConfig::dashboard_defaults(), analytics);
        engine.rebuild(&linear_history("RJ-01", "Rajasthan", "92"));
        assert_eq!(engine.predicted_employment("RJ-01"), None);
        // With imputation off, a zero metric renders as unavailable.
        engine.rebuild(&[raw("RJ-01", "Rajasthan", "2023-04", "0", "0")]);
        let payload = engine.get_display_payload("RJ-01").unwrap();
        assert_eq!(payload.employment.label, "Data Not Available");
        assert_eq!(payload.payment_speed.label, "Data Not Available");
    }

    #[test]
    fn cluster_assignments_partition_the_store() {
        let engine = default_engine();
        engine.rebuild(&[
            raw("HI-01", "StateA", "2023-04", "160000", "92"),
            raw("LO-01", "StateB", "2023-04", "15000", "40"),
        ]);
        let groups = engine.cluster_assignments().unwrap();
        assert_eq!(groups[0].members, vec!["HI-01".to_string()]);
        assert_eq!(groups[2].members, vec!["LO-01".to_string()]);
        assert!(groups[1].members.is_empty());
    }

    #[test]
    fn quality_surface_matches_the_last_cycle() {
        let engine = default_engine();
        let mut bad = raw("", "Rajasthan", "2023-04", "100", "90");
        bad.district_id = None;
        engine.rebuild(&[
            raw("RJ-01", "Rajasthan", "2023-04", "100", "90"),
            bad.clone(),
            bad.clone(),
            bad.clone(),
            bad,
        ]);
        let quality = engine.get_quality();
        assert_eq!(quality.total_rows, 5);
        assert_eq!(quality.valid_rows, 1);
        assert_eq!(quality.completeness_score, 20.0);
        assert!(engine.should_alert());

        // A clean cycle clears the alert; counters are not cumulative.
        engine.rebuild(&[raw("RJ-01", "Rajasthan", "2023-04", "100", "90")]);
        assert_eq!(engine.get_quality().total_rows, 1);
        assert!(!engine.should_alert());
    }

    #[test]
    fn empty_snapshot_is_a_normal_outcome() {
        let engine = default_engine();
        let metrics = engine.rebuild(&[]);
        assert_eq!(metrics.completeness_score, 0.0);
        assert!(engine.list_districts(None).is_empty());
        assert!(engine.get_display_payload("RJ-01").is_none());
    }

    #[test]
    fn repeated_rebuilds_are_idempotent() {
        let engine = default_engine();
        let rows = linear_history("RJ-01", "Rajasthan", "92");
        let first = engine.rebuild(&rows);
        let entry_first = engine.get_district("RJ-01").unwrap();
        let second = engine.rebuild(&rows);
        let entry_second = engine.get_district("RJ-01").unwrap();
        assert_eq!(first, second);
        assert_eq!(entry_first, entry_second);
    }
}
