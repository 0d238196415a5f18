use super::normalize::NormalizedNutrient;

/// Best possible product rating.
pub const MAX_RATING: i32 = 100;

/// Severity of one nutrient in per-mille: 0 for the best bucket, 1000 for
/// the worst, evenly spaced between.
fn severity_permille(rate_index: usize, buckets: usize) -> u64 {
    if buckets <= 1 {
        return 0;
    }
    let index = rate_index.min(buckets - 1) as u64;
    index * 1000 / (buckets as u64 - 1)
}

/// Product rating on a 0..=100 scale, 100 being best.
///
/// Mean per-mille severity over all nutrients, rounded half up, mapped to
/// `100 - mean / 10`. Integer arithmetic keeps the result identical for any
/// ordering of `nutrients`. `None` when there is nothing to rate.
pub fn aggregate(nutrients: &[NormalizedNutrient]) -> Option<i32> {
    if nutrients.is_empty() {
        return None;
    }
    let count = nutrients.len() as u64;
    let total: u64 = nutrients
        .iter()
        .map(|n| severity_permille(n.rate_index, n.buckets))
        .sum();
    let mean = (total + count / 2) / count;
    let penalty = ((mean + 5) / 10) as i32;
    Some(MAX_RATING - penalty)
}
