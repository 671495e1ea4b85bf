// Full-snapshot store construction: validate, group by district, order each
// group by period and reduce to (latest record, padded history). Pure so the
// engine can build the whole replacement off to the side and swap it in as
// one assignment.
use std::collections::BTreeMap;

use crate::quality;
use crate::types::{DistrictEntry, DistrictRecord, QualityMetrics, RawRecord, HISTORY_LEN};
use crate::validator;

pub type DistrictStore = BTreeMap<String, DistrictEntry>;

/// Build a fresh store from a complete snapshot of raw rows.
///
/// Rejected rows are dropped and counted; degraded rows are kept. The
/// returned metrics describe this cycle only.
pub fn build_store(rows: &[RawRecord]) -> (DistrictStore, QualityMetrics) {
    let mut metrics = QualityMetrics::default();

    let mut groups: BTreeMap<String, Vec<DistrictRecord>> = BTreeMap::new();
    for row in rows {
        if let Some(rec) = validator::validate(row, &mut metrics) {
            groups.entry(rec.district_id.clone()).or_default().push(rec);
        }
    }

    let mut store = DistrictStore::new();
    for (id, mut records) in groups {
        // Periods are sortable tokens; newest first.
        records.sort_by(|a, b| b.period.cmp(&a.period));
        let history = build_history(&records);
        let Some(latest) = records.into_iter().next() else {
            continue;
        };
        store.insert(id, DistrictEntry { latest, history });
    }

    metrics.completeness_score = quality::completeness(metrics.valid_rows, metrics.total_rows);
    (store, metrics)
}

/// First `HISTORY_LEN` employment values of the newest-first records,
/// right-padded by repeating the last available value (zeros when the group
/// has none).
fn build_history(records: &[DistrictRecord]) -> [f64; HISTORY_LEN] {
    let mut history = [0.0; HISTORY_LEN];
    let values: Vec<f64> = records
        .iter()
        .take(HISTORY_LEN)
        .map(|r| r.employed_count)
        .collect();
    let pad = values.last().copied().unwrap_or(0.0);
    for (i, slot) in history.iter_mut().enumerate() {
        *slot = values.get(i).copied().unwrap_or(pad);
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, period: &str, employed: &str) -> RawRecord {
        RawRecord {
            district_id: Some(id.to_string()),
            district_name: Some(format!("{} District", id)),
            state_name: Some("Rajasthan".to_string()),
            period: Some(period.to_string()),
            employed_count: Some(employed.to_string()),
            payment_speed_pct: Some("85".to_string()),
            works_completed: Some("10".to_string()),
            wages_disbursed: Some("100000".to_string()),
        }
    }

    #[test]
    fn latest_record_wins_by_period_ordering() {
        let rows = vec![
            raw("RJ-01", "2023-02", "200"),
            raw("RJ-01", "2023-04", "400"),
            raw("RJ-01", "2023-03", "300"),
        ];
        let (store, _) = build_store(&rows);
        let entry = store.get("RJ-01").unwrap();
        assert_eq!(entry.latest.period, "2023-04");
        assert_eq!(entry.latest.employed_count, 400.0);
        assert_eq!(entry.history[0], 400.0);
        assert_eq!(entry.history[1], 300.0);
        assert_eq!(entry.history[2], 200.0);
    }

    #[test]
    fn short_history_pads_with_the_oldest_value() {
        let rows = vec![raw("RJ-01", "2023-04", "400"), raw("RJ-01", "2023-03", "300")];
        let (store, _) = build_store(&rows);
        let entry = store.get("RJ-01").unwrap();
        assert_eq!(entry.history, [400.0, 300.0, 300.0, 300.0, 300.0, 300.0]);
    }

    #[test]
    fn single_period_repeats_six_times() {
        let rows = vec![raw("RJ-01", "2023-04", "250")];
        let (store, _) = build_store(&rows);
        let entry = store.get("RJ-01").unwrap();
        assert_eq!(entry.history, [250.0; HISTORY_LEN]);
    }

    #[test]
    fn history_truncates_to_six_newest_periods() {
        let rows: Vec<RawRecord> = (1..=8)
            .map(|m| raw("RJ-01", &format!("2023-{:02}", m), &format!("{}", m * 100)))
            .collect();
        let (store, _) = build_store(&rows);
        let entry = store.get("RJ-01").unwrap();
        assert_eq!(entry.history, [800.0, 700.0, 600.0, 500.0, 400.0, 300.0]);
    }

    #[test]
    fn rejected_rows_are_dropped_and_counted() {
        let mut bad = raw("", "2023-04", "100");
        bad.district_id = None;
        let rows = vec![raw("RJ-01", "2023-04", "100"), bad];
        let (store, metrics) = build_store(&rows);
        assert_eq!(store.len(), 1);
        assert_eq!(metrics.total_rows, 2);
        assert_eq!(metrics.valid_rows, 1);
        assert_eq!(metrics.invalid_rows, 1);
        assert_eq!(metrics.completeness_score, 50.0);
    }

    #[test]
    fn empty_snapshot_yields_empty_store_and_zero_completeness() {
        let (store, metrics) = build_store(&[]);
        assert!(store.is_empty());
        assert_eq!(metrics.total_rows, 0);
        assert_eq!(metrics.completeness_score, 0.0);
    }

    #[test]
    fn rebuild_is_idempotent_for_identical_input() {
        let rows = vec![
            raw("RJ-01", "2023-04", "400"),
            raw("RJ-01", "2023-03", "300"),
            raw("RJ-02", "2023-04", "90000"),
        ];
        let (store_a, metrics_a) = build_store(&rows);
        let (store_b, metrics_b) = build_store(&rows);
        assert_eq!(store_a, store_b);
        assert_eq!(metrics_a, metrics_b);
    }

    #[test]
    fn all_invalid_metrics_leave_a_zero_history() {
        let mut row = raw("RJ-01", "2023-04", "not a number");
        row.payment_speed_pct = None;
        let (store, metrics) = build_store(&[row]);
        let entry = store.get("RJ-01").unwrap();
        assert_eq!(entry.history, [0.0; HISTORY_LEN]);
        // Degraded, not rejected.
        assert_eq!(metrics.valid_rows, 1);
    }
}
