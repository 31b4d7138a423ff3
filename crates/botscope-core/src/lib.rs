//! Shared domain types and configuration for botscope.
//!
//! Everything that crosses a crate boundary lives here: the normalized
//! [`Item`] representation, the feature and score documents persisted per
//! snapshot, username parsing, and the environment-driven [`AppConfig`].

pub mod analysis;
pub mod app_config;
pub mod config;
pub mod items;
pub mod username;

use thiserror::Error;

pub use analysis::{
    ContentFeatures, CoverageFlags, Explanations, FeatureSet, InteractionFeatures, Reason,
    RepetitionFeatures, ScoreResult, TimingFeatures,
};
pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use items::{AccountProfile, Item, ItemKind, Platform, SnapshotRef};
pub use username::{parse_username, UsernameParseError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
