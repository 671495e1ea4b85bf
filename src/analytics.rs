// The five estimators. Each is a pure function over a chronological
// (oldest-to-newest) employment series; the store keeps history
// most-recent-first, so callers reverse before invoking. None of them may
// panic on degenerate input: short series and zero variance return neutral
// results instead.
use serde::Serialize;
use std::fmt;

use crate::util::{average, population_std_dev};

/// Fixed smoothing factor for the exponential forecast.
pub const SMOOTHING_ALPHA: f64 = 0.3;
/// Z-score above which a value counts as anomalous.
pub const ANOMALY_Z_THRESHOLD: f64 = 2.0;
/// Employment above this on an improving trend predicts fast payments.
pub const FAST_EMPLOYMENT_CUTOFF: f64 = 100_000.0;
/// Employment above this on an improving trend predicts moderate payments.
pub const MODERATE_EMPLOYMENT_CUTOFF: f64 = 50_000.0;

/// Hand-set (employment, payment speed) anchors for the three performance
/// clusters, high to low. These are guesses, not fitted statistics; whoever
/// owns the real analytical requirements should replace them.
pub const CENTROIDS: [(f64, f64); 3] = [(150_000.0, 90.0), (75_000.0, 70.0), (20_000.0, 45.0)];

/// Master switch plus one flag per estimator. A disabled estimator reports
/// "no result" rather than running.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    pub trend: bool,
    pub category: bool,
    pub forecast: bool,
    pub anomaly: bool,
    pub clustering: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trend: true,
            category: true,
            forecast: true,
            anomaly: true,
            clustering: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Improving,
    Declining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeedCategory {
    Fast,
    Moderate,
    Slow,
}

impl fmt::Display for SpeedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeedCategory::Fast => write!(f, "Fast"),
            SpeedCategory::Moderate => write!(f, "Moderate"),
            SpeedCategory::Slow => write!(f, "Slow"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendInsight {
    pub direction: TrendDirection,
    pub expected_speed: SpeedCategory,
}

/// Ordinary-least-squares prediction of the next value in the series.
///
/// Zero and non-finite entries are treated as gaps and filtered out before
/// fitting; the remaining points sit at index positions 1..n and the fit is
/// evaluated at n+1. Fewer than two usable points means no prediction.
pub fn predict_next(history: &[f64]) -> Option<f64> {
    let points: Vec<f64> = history
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    let n = points.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let sum_x = nf * (nf + 1.0) / 2.0;
    let sum_x2 = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 6.0;
    let sum_y: f64 = points.iter().sum();
    let sum_xy: f64 = points
        .iter()
        .enumerate()
        .map(|(i, y)| (i as f64 + 1.0) * y)
        .sum();
    let denom = nf * sum_x2 - sum_x * sum_x;
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let slope = (nf * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / nf;
    Some((slope * (nf + 1.0) + intercept).max(0.0))
}

/// Rule-based category prediction: label the trend by comparing the given
/// employment figure to the series mean, then map (trend, magnitude) to an
/// expected payment-speed tier via fixed cutoffs.
pub fn classify_trend(history: &[f64], employment: f64) -> Option<TrendInsight> {
    if history.is_empty() {
        return None;
    }
    let mean = average(history);
    let direction = if employment > mean {
        TrendDirection::Improving
    } else {
        TrendDirection::Declining
    };
    let expected_speed = if direction == TrendDirection::Improving && employment > FAST_EMPLOYMENT_CUTOFF {
        SpeedCategory::Fast
    } else if direction == TrendDirection::Improving && employment > MODERATE_EMPLOYMENT_CUTOFF {
        SpeedCategory::Moderate
    } else {
        SpeedCategory::Slow
    };
    Some(TrendInsight {
        direction,
        expected_speed,
    })
}

/// Exponential smoothing forecast, seeded with the oldest value and blended
/// forward through the series.
pub fn smooth_forecast(history: &[f64]) -> Option<f64> {
    let (first, rest) = history.split_first()?;
    let mut smoothed = *first;
    for v in rest {
        smoothed = SMOOTHING_ALPHA * v + (1.0 - SMOOTHING_ALPHA) * smoothed;
    }
    Some(smoothed.max(0.0))
}

/// Population z-score anomaly check. A series with zero spread can never
/// flag a value, whatever the value is.
pub fn is_anomalous(history: &[f64], value: f64) -> bool {
    let std_dev = population_std_dev(history);
    if std_dev <= 0.0 {
        return false;
    }
    (value - average(history)).abs() / std_dev > ANOMALY_Z_THRESHOLD
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistrictPoint {
    pub id: String,
    pub employment: f64,
    pub payment_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterGroup {
    pub centroid: (f64, f64),
    pub members: Vec<String>,
}

/// Assign every district to its nearest fixed centroid by Euclidean
/// distance. Ties go to the earlier centroid. The result always has one
/// group per centroid, empty or not.
pub fn cluster_districts(points: &[DistrictPoint]) -> Vec<ClusterGroup> {
    let mut groups: Vec<ClusterGroup> = CENTROIDS
        .iter()
        .map(|c| ClusterGroup {
            centroid: *c,
            members: Vec::new(),
        })
        .collect();
    for p in points {
        let mut best = 0usize;
        let mut best_dist = f64::INFINITY;
        for (idx, (cx, cy)) in CENTROIDS.iter().enumerate() {
            let dx = p.employment - cx;
            let dy = p.payment_speed - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < best_dist {
                best_dist = dist;
                best = idx;
            }
        }
        groups[best].members.push(p.id.clone());
    }
    groups
}
