//! Feature extractors over normalized items.
//!
//! Every extractor is an independent pure function `&[Item] -> group`; groups
//! never read each other, so they may be computed in any order or in
//! parallel. Degenerate inputs (no items, no timestamps, no comments) map to
//! documented zero or neutral values.

mod content;
mod interaction;
mod repetition;
mod timing;

use botscope_core::{CoverageFlags, FeatureSet, Item, TimingFeatures};

pub use content::compute_content_features;
pub use interaction::compute_interaction_features;
pub use repetition::compute_repetition_features;
pub use timing::compute_timing_features;

/// Runs every extractor and assembles the full feature mapping.
#[must_use]
pub fn compute_features(items: &[Item]) -> FeatureSet {
    let timing = compute_timing_features(items);
    let coverage_flags = compute_coverage_flags(items, &timing);
    FeatureSet {
        repetition: compute_repetition_features(items),
        content: compute_content_features(items),
        interaction: compute_interaction_features(items),
        timing,
        coverage_flags,
    }
}

/// Coverage flags consumed downstream to contextualize confidence.
#[must_use]
pub fn compute_coverage_flags(items: &[Item], timing: &TimingFeatures) -> CoverageFlags {
    CoverageFlags {
        has_items: !items.is_empty(),
        has_timestamps: timing.timestamp_completeness > 0.0,
        has_comments: items.iter().any(Item::is_comment),
        has_posts: items.iter().any(Item::is_post),
    }
}

/// `numerator / denominator`, or `0.0` when the denominator is zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use botscope_core::{Item, ItemKind};

    pub(crate) fn post(id: &str, created_utc: Option<f64>) -> Item {
        Item {
            kind: ItemKind::Post,
            item_id: id.to_string(),
            created_utc,
            subreddit: Some("rust".to_string()),
            permalink: Some(format!("https://www.reddit.com/r/rust/comments/{id}/")),
            body_text: None,
            url: None,
            link_id: None,
            parent_id: None,
        }
    }

    pub(crate) fn comment(id: &str, created_utc: Option<f64>, body: Option<&str>) -> Item {
        Item {
            kind: ItemKind::Comment,
            item_id: id.to_string(),
            created_utc,
            subreddit: Some("rust".to_string()),
            permalink: Some(format!("https://www.reddit.com/r/rust/comments/abc/x/{id}/")),
            body_text: body.map(str::to_string),
            url: None,
            link_id: Some("t3_abc".to_string()),
            parent_id: Some("t3_abc".to_string()),
        }
    }
}
