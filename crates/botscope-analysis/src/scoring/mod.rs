//! Rule-based automation scoring.
//!
//! [`score`] is deterministic: the same features, profile, items and `now`
//! always produce the same [`ScoreResult`], with reasons in catalogue order.

mod rules;

use botscope_core::{
    AccountProfile, Explanations, FeatureSet, Item, RepetitionFeatures, ScoreResult,
};
use chrono::{DateTime, Utc};

pub use rules::{Curve, Evidence, RuleInputs, RuleSpec, RULES};

use crate::features::ratio;

const SHORT_COMMENT_CHARS: usize = 20;

/// Scores one snapshot.
///
/// `now` anchors the account-age computation.
#[must_use]
pub fn score(
    features: &FeatureSet,
    profile: &AccountProfile,
    items: &[Item],
    now: DateTime<Utc>,
) -> ScoreResult {
    let inputs = rule_inputs(features, profile, items, now);

    let reasons: Vec<_> = RULES
        .iter()
        .filter_map(|rule| rule.evaluate(&inputs, items))
        .collect();

    let total: u32 = reasons.iter().map(|r| r.impact).sum();
    let automation_score = u8::try_from(total.min(100)).unwrap_or(100);
    let confidence = compute_confidence(features);

    ScoreResult {
        automation_score,
        coordination_score: Some(coordination_score(&features.repetition)),
        confidence: Some(confidence),
        reasons,
        explanations: Explanations {
            coverage: features.coverage_flags,
            confidence,
        },
    }
}

/// Derives the scalar rule inputs from features, profile and raw items.
#[must_use]
pub fn rule_inputs(
    features: &FeatureSet,
    profile: &AccountProfile,
    items: &[Item],
    now: DateTime<Utc>,
) -> RuleInputs {
    let timing = &features.timing;
    let comment_count = items.iter().filter(|i| i.is_comment()).count();

    RuleInputs {
        activity_per_day: timing.posts_per_day + timing.comments_per_day,
        burstiness: timing.burstiness_index,
        sleep_gap_p95: timing.sleep_gap_hours_p95,
        timestamped_items: items.iter().filter_map(Item::usable_timestamp).count(),
        near_duplicate_rate: features.repetition.near_duplicate_rate,
        domain_concentration: features.repetition.link_domain_concentration,
        subreddit_concentration: 1.0 - features.repetition.subreddit_entropy,
        short_comment_rate: short_comment_rate(items),
        url_rate: features.content.url_rate,
        account_age_days: profile.account_age_days(now),
        comment_count,
        thread_diversity: ratio(
            features.interaction.unique_threads_replied_to,
            comment_count.max(1),
        ),
    }
}

/// Volume, span and completeness blended into `[0, 1]`, with a flat 0.3
/// penalty below 30 items.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_confidence(features: &FeatureSet) -> f64 {
    let timing = &features.timing;
    let volume = (timing.total_items as f64 / 200.0).min(1.0);
    let span = (timing.span_days / 30.0).min(1.0);
    let completeness = timing.timestamp_completeness.min(1.0);

    let base = 0.5 * volume + 0.3 * span + 0.2 * completeness;
    let penalty = if timing.total_items < 30 { 0.3 } else { 0.0 };
    (base - penalty).clamp(0.0, 1.0)
}

/// Duplication, domain and subreddit concentration blended into 0–100.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coordination_score(repetition: &RepetitionFeatures) -> u8 {
    let blend = 0.4 * repetition.near_duplicate_rate
        + 0.3 * repetition.link_domain_concentration
        + 0.3 * (1.0 - repetition.subreddit_entropy);
    (100.0 * blend.clamp(0.0, 1.0)).round_ties_even() as u8
}

/// Share of comments with a body that are shorter than 20 characters.
fn short_comment_rate(items: &[Item]) -> f64 {
    let bodies: Vec<&str> = items
        .iter()
        .filter(|i| i.is_comment())
        .filter_map(|i| i.body_text.as_deref())
        .filter(|b| !b.is_empty())
        .collect();
    let short = bodies
        .iter()
        .filter(|b| b.chars().count() < SHORT_COMMENT_CHARS)
        .count();
    ratio(short, bodies.len())
}
