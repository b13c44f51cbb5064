/// Sort ascending and drop the single smallest and largest sample.
///
/// Inputs with fewer than two samples yield an empty vector.
pub fn trim(samples: &[f64]) -> Vec<f64> {
    if samples.len() < 2 {
        return Vec::new();
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[1..sorted.len() - 1].to_vec()
}

/// Median of an arbitrary-order slice; `None` when empty.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Candidate over baseline.
pub fn ratio(modified_median: f64, normal_median: f64) -> f64 {
    modified_median / normal_median
}
