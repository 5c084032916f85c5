//! Small order statistics shared by the zone classifier and aggregates.

pub fn median(mut values: Vec<f32>) -> Option<f32> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Median where each value carries a weight (character count)
pub fn weighted_median(values: impl IntoIterator<Item = (f32, usize)>) -> Option<f32> {
    let mut weighted: Vec<(f32, usize)> = values
        .into_iter()
        .filter(|(v, w)| v.is_finite() && *w > 0)
        .collect();
    if weighted.is_empty() {
        return None;
    }
    weighted.sort_by(|a, b| a.0.total_cmp(&b.0));
    let total: usize = weighted.iter().map(|(_, w)| w).sum();
    let half = total.div_ceil(2);
    let mut seen = 0;
    for (value, weight) in &weighted {
        seen += weight;
        if seen >= half {
            return Some(*value);
        }
    }
    weighted.last().map(|(v, _)| *v)
}

/// Most frequent value at 0.1 resolution, weighted; ties go to the larger size
pub fn weighted_mode(values: impl IntoIterator<Item = (f32, usize)>) -> Option<f32> {
    let mut counts: std::collections::BTreeMap<i64, usize> = std::collections::BTreeMap::new();
    for (value, weight) in values {
        if value.is_finite() && weight > 0 {
            *counts.entry((value * 10.0).round() as i64).or_insert(0) += weight;
        }
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(key, _)| key as f32 / 10.0)
}
