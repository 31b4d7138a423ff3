//! The automation rule catalogue.
//!
//! Each rule is a [`RuleSpec`] row: a metric read from [`RuleInputs`], a
//! curve mapping the metric onto a point range, an evidence subset and a
//! detail formatter. [`RULES`] is evaluated top to bottom, and that order is
//! the order of the emitted reasons.

use botscope_core::{Item, Reason};

const MAX_EVIDENCE: usize = 3;

/// Scalar signals the rules read, derived once per scoring call.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleInputs {
    /// Posts per day plus comments per day.
    pub activity_per_day: f64,
    pub burstiness: f64,
    pub sleep_gap_p95: f64,
    /// Items with a usable timestamp. Inter-arrival rules need at least two.
    pub timestamped_items: usize,
    pub near_duplicate_rate: f64,
    pub domain_concentration: f64,
    /// `1 - normalized subreddit entropy`.
    pub subreddit_concentration: f64,
    /// Share of bodied comments shorter than 20 characters.
    pub short_comment_rate: f64,
    pub url_rate: f64,
    pub account_age_days: Option<f64>,
    pub comment_count: usize,
    /// Unique threads over comment count.
    pub thread_diversity: f64,
}

/// How a metric value maps onto `[min_points, max_points]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Curve {
    /// 0 at or below `low`, `max` at or above `high`, linear in between.
    Ascending { low: f64, high: f64 },
    /// `max` at or below `low`, 0 at or above `high`, linear in between.
    Descending { low: f64, high: f64 },
    /// Flat `max` when the value is at least the threshold.
    AtLeast(f64),
    /// Flat `max` when the value is strictly below the threshold.
    Below(f64),
}

impl Curve {
    /// Points for `value`. Interpolated values round half to even.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn points(self, value: f64, min_points: u32, max_points: u32) -> u32 {
        let interpolate = |fraction: f64| {
            let span = f64::from(max_points) - f64::from(min_points);
            (f64::from(min_points) + fraction * span).round_ties_even() as u32
        };
        match self {
            Curve::Ascending { low, high } => {
                if value <= low {
                    0
                } else if value >= high {
                    max_points
                } else {
                    interpolate((value - low) / (high - low))
                }
            }
            Curve::Descending { low, high } => {
                if value >= high {
                    0
                } else if value <= low {
                    max_points
                } else {
                    interpolate((high - value) / (high - low))
                }
            }
            Curve::AtLeast(threshold) => {
                if value >= threshold {
                    max_points
                } else {
                    0
                }
            }
            Curve::Below(threshold) => {
                if value < threshold {
                    max_points
                } else {
                    0
                }
            }
        }
    }
}

/// Which items a triggered rule samples permalinks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    AllItems,
    Comments,
    WithUrl,
    None,
}

impl Evidence {
    /// First three non-empty permalinks of the subset, in item order.
    #[must_use]
    pub fn sample(self, items: &[Item]) -> Vec<String> {
        let keep: fn(&Item) -> bool = match self {
            Evidence::None => return Vec::new(),
            Evidence::AllItems => |_| true,
            Evidence::Comments => Item::is_comment,
            Evidence::WithUrl => |i| i.url.as_deref().is_some_and(|u| !u.is_empty()),
        };
        items
            .iter()
            .filter(|i| keep(i))
            .filter_map(|i| i.permalink.as_deref())
            .filter(|p| !p.is_empty())
            .take(MAX_EVIDENCE)
            .map(str::to_string)
            .collect()
    }
}

/// One row of the rule catalogue.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub title: &'static str,
    /// `None` when the rule's precondition does not hold.
    pub metric: fn(&RuleInputs) -> Option<f64>,
    pub curve: Curve,
    pub min_points: u32,
    pub max_points: u32,
    pub evidence: Evidence,
    pub details: fn(&RuleInputs, f64) -> String,
}

impl RuleSpec {
    /// Points this rule contributes for `inputs`; 0 when not triggered.
    #[must_use]
    pub fn impact(&self, inputs: &RuleInputs) -> u32 {
        (self.metric)(inputs).map_or(0, |value| {
            self.curve.points(value, self.min_points, self.max_points)
        })
    }

    /// The reason entry for this rule, or `None` when it contributes nothing.
    #[must_use]
    pub fn evaluate(&self, inputs: &RuleInputs, items: &[Item]) -> Option<Reason> {
        let value = (self.metric)(inputs)?;
        let impact = self.curve.points(value, self.min_points, self.max_points);
        if impact == 0 {
            return None;
        }
        Some(Reason {
            title: self.title.to_string(),
            impact,
            evidence: self.evidence.sample(items),
            details: (self.details)(inputs, value),
        })
    }
}

pub const RULES: &[RuleSpec] = &[
    RuleSpec {
        title: "Very high activity volume",
        metric: activity,
        curve: Curve::Ascending { low: 20.0, high: 200.0 },
        min_points: 8,
        max_points: 25,
        evidence: Evidence::AllItems,
        details: activity_details,
    },
    RuleSpec {
        title: "Unusually regular posting cadence",
        metric: burstiness,
        curve: Curve::Descending { low: 0.1, high: 1.0 },
        min_points: 8,
        max_points: 15,
        evidence: Evidence::None,
        details: cadence_details,
    },
    RuleSpec {
        title: "Low extended idle time",
        metric: sleep_gap,
        curve: Curve::Descending { low: 3.0, high: 8.0 },
        min_points: 8,
        max_points: 15,
        evidence: Evidence::None,
        details: sleep_gap_details,
    },
    RuleSpec {
        title: "High near-duplicate rate",
        metric: near_duplicate,
        curve: Curve::Ascending { low: 0.10, high: 0.60 },
        min_points: 8,
        max_points: 30,
        evidence: Evidence::AllItems,
        details: near_duplicate_details,
    },
    RuleSpec {
        title: "Single domain dominates",
        metric: domain_concentration,
        curve: Curve::Ascending { low: 0.30, high: 0.80 },
        min_points: 8,
        max_points: 15,
        evidence: Evidence::AllItems,
        details: domain_details,
    },
    RuleSpec {
        title: "Subreddit concentration",
        metric: subreddit_concentration,
        curve: Curve::Ascending { low: 0.40, high: 0.90 },
        min_points: 8,
        max_points: 10,
        evidence: Evidence::None,
        details: subreddit_details,
    },
    RuleSpec {
        title: "Many very short comments",
        metric: short_comments,
        curve: Curve::AtLeast(0.60),
        min_points: 10,
        max_points: 10,
        evidence: Evidence::Comments,
        details: short_comment_details,
    },
    RuleSpec {
        title: "URL-heavy posting",
        metric: url_rate,
        curve: Curve::Ascending { low: 0.30, high: 0.80 },
        min_points: 5,
        max_points: 15,
        evidence: Evidence::WithUrl,
        details: url_details,
    },
    RuleSpec {
        title: "High activity on a new account",
        metric: new_account_activity,
        curve: Curve::Ascending { low: 50.0, high: 200.0 },
        min_points: 6,
        max_points: 10,
        evidence: Evidence::AllItems,
        details: new_account_details,
    },
    RuleSpec {
        title: "Low thread diversity",
        metric: thread_diversity,
        curve: Curve::Below(0.20),
        min_points: 8,
        max_points: 8,
        evidence: Evidence::Comments,
        details: thread_details,
    },
];

const NEW_ACCOUNT_DAYS: f64 = 30.0;
const NEW_ACCOUNT_MIN_ACTIVITY: f64 = 50.0;
const THREAD_DIVERSITY_MIN_COMMENTS: usize = 20;

fn activity(inputs: &RuleInputs) -> Option<f64> {
    Some(inputs.activity_per_day)
}

fn burstiness(inputs: &RuleInputs) -> Option<f64> {
    (inputs.timestamped_items >= 2).then_some(inputs.burstiness)
}

fn sleep_gap(inputs: &RuleInputs) -> Option<f64> {
    (inputs.timestamped_items >= 2).then_some(inputs.sleep_gap_p95)
}

fn near_duplicate(inputs: &RuleInputs) -> Option<f64> {
    Some(inputs.near_duplicate_rate)
}

fn domain_concentration(inputs: &RuleInputs) -> Option<f64> {
    Some(inputs.domain_concentration)
}

fn subreddit_concentration(inputs: &RuleInputs) -> Option<f64> {
    Some(inputs.subreddit_concentration)
}

fn short_comments(inputs: &RuleInputs) -> Option<f64> {
    Some(inputs.short_comment_rate)
}

fn url_rate(inputs: &RuleInputs) -> Option<f64> {
    Some(inputs.url_rate)
}

fn new_account_activity(inputs: &RuleInputs) -> Option<f64> {
    let age = inputs.account_age_days?;
    (age < NEW_ACCOUNT_DAYS && inputs.activity_per_day > NEW_ACCOUNT_MIN_ACTIVITY)
        .then_some(inputs.activity_per_day)
}

fn thread_diversity(inputs: &RuleInputs) -> Option<f64> {
    (inputs.comment_count > THREAD_DIVERSITY_MIN_COMMENTS).then_some(inputs.thread_diversity)
}

fn activity_details(_: &RuleInputs, value: f64) -> String {
    format!("Average activity {value:.1}/day across collected span.")
}

fn cadence_details(_: &RuleInputs, value: f64) -> String {
    format!("Inter-arrival CV {value:.2} suggests regular timing.")
}

fn sleep_gap_details(_: &RuleInputs, value: f64) -> String {
    format!("95th percentile gap {value:.1} hours.")
}

fn near_duplicate_details(_: &RuleInputs, value: f64) -> String {
    format!("Duplicate rate {value:.2}.")
}

fn domain_details(_: &RuleInputs, value: f64) -> String {
    format!("Top domain share {value:.2}.")
}

fn subreddit_details(_: &RuleInputs, value: f64) -> String {
    format!("Subreddit concentration {value:.2}.")
}

fn short_comment_details(_: &RuleInputs, value: f64) -> String {
    format!("Short comment rate {value:.2}.")
}

fn url_details(_: &RuleInputs, value: f64) -> String {
    format!("URL rate {value:.2}.")
}

fn new_account_details(inputs: &RuleInputs, _: f64) -> String {
    format!("Account age {:.0} days.", inputs.account_age_days.unwrap_or_default())
}

fn thread_details(_: &RuleInputs, value: f64) -> String {
    format!("Thread diversity ratio {value:.2}.")
}
