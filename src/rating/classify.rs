use super::catalog::{Direction, MetricDefinition};

/// Index of the first bucket whose boundary `amount` satisfies, or the last
/// bucket when none does. Comparison is inclusive in the metric's direction.
pub fn classify(amount: f64, metric: &MetricDefinition) -> usize {
    let satisfies = |threshold: f64| match metric.direction {
        Direction::AscendingBad => amount <= threshold,
        Direction::DescendingBad => amount >= threshold,
    };
    metric
        .thresholds
        .iter()
        .position(|&t| satisfies(t))
        .unwrap_or(metric.thresholds.len())
}

/// Label of bucket `index`, e.g. `"moderate"`.
pub fn rate_label(index: usize, metric: &MetricDefinition) -> &'static str {
    metric
        .rates
        .get(index)
        .or_else(|| metric.rates.last())
        .copied()
        .unwrap_or_default()
}
