use std::collections::HashMap;

use lazy_static::lazy_static;

/// Key of the synthetic nutrient built from the additive tag list.
pub const ADDITIVES_KEY: &str = "additives";

/// Benchmark unit of count-like metrics; amounts pass through unconverted.
pub const UNITLESS: &str = "";

/// Which end of the scale is unhealthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// More is worse (fat, sugars, salt...). Thresholds ascend, `amount <= t`.
    AscendingBad,
    /// More is better (fiber, proteins). Thresholds descend, `amount >= t`.
    DescendingBad,
}

/// Multiplier taking an amount in `unit` to the metric's benchmark unit.
#[derive(Debug, Clone, Copy)]
pub struct UnitFactor {
    pub unit: &'static str,
    pub factor: f64,
}

/// How one nutrient key is converted and classified.
///
/// `rates` has exactly one more entry than `thresholds`: bucket `i` is the
/// first threshold the amount satisfies, the last bucket catches the rest.
/// Bucket 0 is always the least severe one.
#[derive(Debug, Clone, Copy)]
pub struct MetricDefinition {
    pub key: &'static str,
    pub benchmark_unit: &'static str,
    pub conversions: &'static [UnitFactor],
    pub thresholds: &'static [f64],
    pub rates: &'static [&'static str],
    pub direction: Direction,
}

impl MetricDefinition {
    pub fn buckets(&self) -> usize {
        self.rates.len()
    }

    pub fn is_unitless(&self) -> bool {
        self.benchmark_unit == UNITLESS
    }
}

const MASS_TO_GRAMS: &[UnitFactor] = &[
    UnitFactor { unit: "g", factor: 1.0 },
    UnitFactor { unit: "mg", factor: 0.001 },
    UnitFactor { unit: "µg", factor: 0.000_001 },
    UnitFactor { unit: "kg", factor: 1000.0 },
];

const ENERGY_TO_KCAL: &[UnitFactor] = &[
    UnitFactor { unit: "kcal", factor: 1.0 },
    UnitFactor { unit: "kj", factor: 1.0 / 4.184 },
];

const LEVELS: &[&str] = &["low", "moderate", "high"];
const GOOD_LEVELS: &[&str] = &["high", "moderate", "low"];

// Per 100 g. Ascending-bad limits follow the usual front-of-pack traffic lights.
const METRICS: &[MetricDefinition] = &[
    MetricDefinition {
        key: "energy-kcal",
        benchmark_unit: "kcal",
        conversions: ENERGY_TO_KCAL,
        thresholds: &[160.0, 400.0],
        rates: LEVELS,
        direction: Direction::AscendingBad,
    },
    MetricDefinition {
        key: "fat",
        benchmark_unit: "g",
        conversions: MASS_TO_GRAMS,
        thresholds: &[3.0, 17.5],
        rates: LEVELS,
        direction: Direction::AscendingBad,
    },
    MetricDefinition {
        key: "saturated-fat",
        benchmark_unit: "g",
        conversions: MASS_TO_GRAMS,
        thresholds: &[1.5, 5.0],
        rates: LEVELS,
        direction: Direction::AscendingBad,
    },
    MetricDefinition {
        key: "sugars",
        benchmark_unit: "g",
        conversions: MASS_TO_GRAMS,
        thresholds: &[5.0, 22.5],
        rates: LEVELS,
        direction: Direction::AscendingBad,
    },
    MetricDefinition {
        key: "salt",
        benchmark_unit: "g",
        conversions: MASS_TO_GRAMS,
        thresholds: &[0.3, 1.5],
        rates: LEVELS,
        direction: Direction::AscendingBad,
    },
    MetricDefinition {
        key: "fiber",
        benchmark_unit: "g",
        conversions: MASS_TO_GRAMS,
        thresholds: &[6.0, 3.0],
        rates: GOOD_LEVELS,
        direction: Direction::DescendingBad,
    },
    MetricDefinition {
        key: "proteins",
        benchmark_unit: "g",
        conversions: MASS_TO_GRAMS,
        thresholds: &[8.0, 4.0],
        rates: GOOD_LEVELS,
        direction: Direction::DescendingBad,
    },
    MetricDefinition {
        key: ADDITIVES_KEY,
        benchmark_unit: UNITLESS,
        conversions: &[],
        thresholds: &[0.0, 2.0, 5.0],
        rates: &["none", "few", "some", "many"],
        direction: Direction::AscendingBad,
    },
];

lazy_static! {
    static ref CATALOG: HashMap<&'static str, &'static MetricDefinition> =
        METRICS.iter().map(|m| (m.key, m)).collect();
}

/// Catalog entry for `key`, or `None` when the nutrient is not tracked.
pub fn lookup(key: &str) -> Option<&'static MetricDefinition> {
    CATALOG.get(key).copied()
}

#[cfg(test)]
pub fn all() -> &'static [MetricDefinition] {
    METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_and_unknown() {
        let fat = lookup("fat").expect("fat is tracked");
        assert_eq!(fat.benchmark_unit, "g");
        assert!(lookup("nova-group").is_none());
        assert!(lookup("FAT").is_none());
    }

    #[test]
    fn every_metric_is_well_formed() {
        for m in all() {
            assert_eq!(m.rates.len(), m.thresholds.len() + 1, "{}", m.key);
            let ordered = m.thresholds.windows(2).all(|w| match m.direction {
                Direction::AscendingBad => w[0] < w[1],
                Direction::DescendingBad => w[0] > w[1],
            });
            assert!(ordered, "{} thresholds out of order", m.key);
            if !m.is_unitless() {
                let has_identity = m
                    .conversions
                    .iter()
                    .any(|c| c.unit == m.benchmark_unit && c.factor == 1.0);
                assert!(has_identity, "{} lacks an identity conversion", m.key);
            }
        }
    }

    #[test]
    fn additives_are_unitless() {
        let m = lookup(ADDITIVES_KEY).unwrap();
        assert!(m.is_unitless());
        assert_eq!(m.buckets(), 4);
    }
}
