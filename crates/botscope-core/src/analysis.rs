//! Feature and score documents stored alongside each snapshot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingFeatures {
    pub posts_per_day: f64,
    pub comments_per_day: f64,
    /// Activity counts by UTC hour of day.
    pub active_hours_histogram: [u32; 24],
    /// 95th percentile of positive inter-item gaps, in hours.
    pub sleep_gap_hours_p95: f64,
    /// Coefficient of variation of inter-arrival gaps.
    pub burstiness_index: f64,
    pub regularity_score: f64,
    /// Observed span in days, floored at 1.
    pub span_days: f64,
    pub total_items: usize,
    /// Fraction of items carrying a usable timestamp.
    pub timestamp_completeness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionFeatures {
    pub near_duplicate_rate: f64,
    pub top_phrase_reuse: f64,
    pub link_domain_concentration: f64,
    pub top_domain: Option<String>,
    /// Shannon entropy of the subreddit distribution normalized to `[0, 1]`.
    pub subreddit_entropy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFeatures {
    pub avg_comment_length: f64,
    pub median_comment_length: f64,
    pub url_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionFeatures {
    pub unique_threads_replied_to: usize,
    /// Share of comments that reply directly to the submission.
    pub top_level_reply_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageFlags {
    pub has_items: bool,
    pub has_timestamps: bool,
    pub has_comments: bool,
    pub has_posts: bool,
}

/// Full feature mapping for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub timing: TimingFeatures,
    pub repetition: RepetitionFeatures,
    pub content: ContentFeatures,
    pub interaction: InteractionFeatures,
    pub coverage_flags: CoverageFlags,
}

/// One triggered scoring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub title: String,
    pub impact: u32,
    /// Up to three sample permalinks.
    pub evidence: Vec<String>,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanations {
    pub coverage: CoverageFlags,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Sum of triggered rule impacts, capped at 100.
    pub automation_score: u8,
    pub coordination_score: Option<u8>,
    pub confidence: Option<f64>,
    /// Triggered rules in catalogue order.
    pub reasons: Vec<Reason>,
    pub explanations: Explanations,
}
