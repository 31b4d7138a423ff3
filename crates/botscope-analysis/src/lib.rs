//! Behavioral feature extraction and rule-based scoring.
//!
//! Both stages are pure: the same items always produce the same
//! [`FeatureSet`](botscope_core::FeatureSet) and the same
//! [`ScoreResult`](botscope_core::ScoreResult), and no input sequence makes
//! them fail.

pub mod features;
pub mod scoring;

pub use features::{
    compute_content_features, compute_coverage_flags, compute_features,
    compute_interaction_features, compute_repetition_features, compute_timing_features,
};
pub use scoring::{compute_confidence, coordination_score, score, RULES};
