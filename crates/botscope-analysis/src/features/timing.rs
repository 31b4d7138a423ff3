use botscope_core::{Item, TimingFeatures};

use super::ratio;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Activity rates, hour-of-day histogram and inter-arrival statistics.
///
/// Only finite, positive timestamps are used. The observed span is floored at
/// one day so a burst of activity inside a few minutes does not produce an
/// unbounded per-day rate.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_timing_features(items: &[Item]) -> TimingFeatures {
    let mut timestamps: Vec<f64> = items.iter().filter_map(Item::usable_timestamp).collect();
    timestamps.sort_by(f64::total_cmp);

    let span_days = match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) => ((last - first) / SECONDS_PER_DAY).max(1.0),
        _ => 1.0,
    };

    let posts = items.iter().filter(|i| i.is_post()).count();
    let comments = items.iter().filter(|i| i.is_comment()).count();

    let gaps: Vec<f64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
    let gap_hours: Vec<f64> = gaps
        .iter()
        .filter(|g| **g > 0.0)
        .map(|g| g / SECONDS_PER_HOUR)
        .collect();

    let burstiness_index = coefficient_of_variation(&gaps);
    let regularity_score = if burstiness_index == 0.0 {
        0.0
    } else {
        1.0 / (1.0 + burstiness_index)
    };

    TimingFeatures {
        posts_per_day: posts as f64 / span_days,
        comments_per_day: comments as f64 / span_days,
        active_hours_histogram: hour_histogram(&timestamps),
        sleep_gap_hours_p95: percentile(&gap_hours, 0.95),
        burstiness_index,
        regularity_score,
        span_days,
        total_items: items.len(),
        timestamp_completeness: ratio(timestamps.len(), items.len()),
    }
}

/// Counts per UTC hour of day.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hour_histogram(timestamps: &[f64]) -> [u32; 24] {
    let mut hours = [0_u32; 24];
    for ts in timestamps {
        let hour = (ts.rem_euclid(SECONDS_PER_DAY) / SECONDS_PER_HOUR).floor() as usize;
        hours[hour.min(23)] += 1;
    }
    hours
}

/// Linear-interpolated percentile (`pct` in `[0, 1]`); `0.0` for no values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let k = (sorted.len() - 1) as f64 * pct;
    let lower = k.floor();
    let upper = k.ceil();
    if (upper - lower).abs() < f64::EPSILON {
        return sorted[k as usize];
    }
    sorted[lower as usize] * (upper - k) + sorted[upper as usize] * (k - lower)
}

/// Population standard deviation over mean; `0.0` when empty or the mean is 0.
#[allow(clippy::cast_precision_loss)]
fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}
