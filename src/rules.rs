// Display rules: tier bands, magnitude formatting and the state-comparison
// policy, bundled into one immutable config so the engine can be constructed
// with alternative rule sets in tests.
use std::cmp::Ordering;

/// Magnitudes at or above this divide into the large display unit.
pub const LARGE_UNIT_CUTOFF: f64 = 100_000.0;
/// Magnitudes at or above this (but below the large cutoff) divide into the
/// medium display unit.
pub const MEDIUM_UNIT_CUTOFF: f64 = 1_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BandStyle {
    pub label: String,
    pub color: String,
}

impl BandStyle {
    pub fn new(label: &str, color: &str) -> Self {
        Self {
            label: label.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TierBand {
    /// Values strictly above this cut point fall into the band.
    pub above: f64,
    pub style: BandStyle,
}

/// Ordered cut points for one metric. Bands are scanned high to low and the
/// first `value > above` wins; anything at or below the lowest cut point
/// takes the floor style.
#[derive(Debug, Clone)]
pub struct TieredMetric {
    bands: Vec<TierBand>,
    floor: BandStyle,
}

impl TieredMetric {
    pub fn new(mut bands: Vec<TierBand>, floor: BandStyle) -> Self {
        bands.sort_by(|a, b| b.above.partial_cmp(&a.above).unwrap_or(Ordering::Equal));
        Self { bands, floor }
    }

    /// Callers must filter out missing/zero values first; classification has
    /// no "no data" tier.
    pub fn classify(&self, value: f64) -> &BandStyle {
        self.bands
            .iter()
            .find(|b| value > b.above)
            .map(|b| &b.style)
            .unwrap_or(&self.floor)
    }

    /// Style of the nth band counted from the top; out-of-range indexes fall
    /// back to the floor.
    pub fn band_style(&self, idx: usize) -> &BandStyle {
        self.bands.get(idx).map(|b| &b.style).unwrap_or(&self.floor)
    }

    pub fn floor_style(&self) -> &BandStyle {
        &self.floor
    }
}

/// Binary better/worse judgement against a scalar cutoff. The cutoff is a
/// hand-set benchmark, not a computed statistic; it stays a plain data field
/// so the owning analyst can replace it without touching the engine.
#[derive(Debug, Clone)]
pub struct ComparisonPolicy {
    pub cutoff: f64,
    pub better: BandStyle,
    pub worse: BandStyle,
}

impl ComparisonPolicy {
    pub fn judge(&self, value: f64) -> &BandStyle {
        if value >= self.cutoff {
            &self.better
        } else {
            &self.worse
        }
    }
}

#[derive(Debug, Clone)]
pub struct MagnitudeUnits {
    pub large_label: String,
    pub medium_label: String,
}

impl MagnitudeUnits {
    /// Scale a count into display units: `145000` becomes `"1.45 Lakh"`,
    /// `1500` becomes `"1.50 K"`, `500` stays `"500"`.
    pub fn format(&self, value: f64) -> String {
        if value >= LARGE_UNIT_CUTOFF {
            format!("{:.2} {}", value / LARGE_UNIT_CUTOFF, self.large_label)
        } else if value >= MEDIUM_UNIT_CUTOFF {
            format!("{:.2} {}", value / MEDIUM_UNIT_CUTOFF, self.medium_label)
        } else {
            format!("{}", value as i64)
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub employment: TieredMetric,
    pub payment_speed: TieredMetric,
    pub comparison: ComparisonPolicy,
    pub units: MagnitudeUnits,
    /// Style substituted whenever a metric has no usable value and no
    /// estimator could fill it.
    pub unavailable: BandStyle,
}

impl RuleConfig {
    pub fn format_magnitude(&self, value: f64) -> String {
        self.units.format(value)
    }

    /// The rule set the dashboard ships with.
    pub fn dashboard_defaults() -> Self {
        Self {
            employment: TieredMetric::new(
                vec![
                    TierBand {
                        above: 100_000.0,
                        style: BandStyle::new("High Availability", "#2e7d32"),
                    },
                    TierBand {
                        above: 50_000.0,
                        style: BandStyle::new("Moderate Availability", "#f9a825"),
                    },
                ],
                BandStyle::new("Low Availability", "#c62828"),
            ),
            payment_speed: TieredMetric::new(
                vec![
                    TierBand {
                        above: 90.0,
                        style: BandStyle::new("Fast Payments", "#2e7d32"),
                    },
                    TierBand {
                        above: 75.0,
                        style: BandStyle::new("Moderate Payments", "#f9a825"),
                    },
                ],
                BandStyle::new("Slow Payments", "#c62828"),
            ),
            comparison: ComparisonPolicy {
                cutoff: 75.0,
                better: BandStyle::new("Above State Benchmark", "#2e7d32"),
                worse: BandStyle::new("Below State Benchmark", "#c62828"),
            },
            units: MagnitudeUnits {
                large_label: "Lakh".to_string(),
                medium_label: "K".to_string(),
            },
            unavailable: BandStyle::new("Data Not Available", "#9e9e9e"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_strict_greater_than() {
        let rules = RuleConfig::dashboard_defaults();
        assert_eq!(rules.employment.classify(100_001.0).label, "High Availability");
        // Exactly on the cut point falls through to the next band.
        assert_eq!(rules.employment.classify(100_000.0).label, "Moderate Availability");
        assert_eq!(rules.employment.classify(50_000.0).label, "Low Availability");
        assert_eq!(rules.employment.classify(1.0).label, "Low Availability");
    }

    #[test]
    fn bands_sort_themselves_high_to_low() {
        let tiers = TieredMetric::new(
            vec![
                TierBand {
                    above: 10.0,
                    style: BandStyle::new("low", "#111111"),
                },
                TierBand {
                    above: 100.0,
                    style: BandStyle::new("high", "#222222"),
                },
            ],
            BandStyle::new("floor", "#333333"),
        );
        assert_eq!(tiers.classify(500.0).label, "high");
        assert_eq!(tiers.classify(50.0).label, "low");
        assert_eq!(tiers.classify(5.0).label, "floor");
    }

    #[test]
    fn magnitude_formatting_scales_by_unit() {
        let rules = RuleConfig::dashboard_defaults();
        assert_eq!(rules.format_magnitude(145_000.0), "1.45 Lakh");
        assert_eq!(rules.format_magnitude(1_500.0), "1.50 K");
        assert_eq!(rules.format_magnitude(500.0), "500");
        assert_eq!(rules.format_magnitude(100_000.0), "1.00 Lakh");
        assert_eq!(rules.format_magnitude(1_000.0), "1.00 K");
        assert_eq!(rules.format_magnitude(999.0), "999");
    }

    #[test]
    fn comparison_cutoff_is_inclusive_on_the_better_side() {
        let rules = RuleConfig::dashboard_defaults();
        assert_eq!(rules.comparison.judge(75.0).label, "Above State Benchmark");
        assert_eq!(rules.comparison.judge(74.9).label, "Below State Benchmark");
    }

    #[test]
    fn band_style_indexing_falls_back_to_floor() {
        let rules = RuleConfig::dashboard_defaults();
        assert_eq!(rules.payment_speed.band_style(0).label, "Fast Payments");
        assert_eq!(rules.payment_speed.band_style(1).label, "Moderate Payments");
        assert_eq!(rules.payment_speed.band_style(9).label, "Slow Payments");
        assert_eq!(rules.payment_speed.floor_style().label, "Slow Payments");
    }
}
