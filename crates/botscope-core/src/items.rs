use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External platform an account lives on. Only Reddit is collected today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Reddit,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Reddit => "reddit",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Post => "post",
            ItemKind::Comment => "comment",
        }
    }
}

/// A single post or comment in platform-neutral form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    /// Platform fullname, e.g. `t3_abc123`. Empty when the source omitted it.
    pub item_id: String,
    /// Creation time in epoch seconds.
    pub created_utc: Option<f64>,
    pub subreddit: Option<String>,
    pub permalink: Option<String>,
    pub body_text: Option<String>,
    /// Outbound link. Only posts carry one.
    pub url: Option<String>,
    /// Thread the comment belongs to. Comments only.
    pub link_id: Option<String>,
    /// Direct parent of the comment. Comments only.
    pub parent_id: Option<String>,
}

impl Item {
    #[must_use]
    pub fn is_post(&self) -> bool {
        self.kind == ItemKind::Post
    }

    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.kind == ItemKind::Comment
    }

    /// The creation timestamp when it is present, finite and positive.
    #[must_use]
    pub fn usable_timestamp(&self) -> Option<f64> {
        self.created_utc.filter(|ts| ts.is_finite() && *ts > 0.0)
    }
}

/// Core profile attributes returned by the profile lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub username: String,
    pub created_utc: Option<f64>,
    pub link_karma: Option<i64>,
    pub comment_karma: Option<i64>,
}

impl AccountProfile {
    /// Age of the account in days relative to `now`, or `None` when the
    /// creation time is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn account_age_days(&self, now: DateTime<Utc>) -> Option<f64> {
        let created = self.created_utc.filter(|c| c.is_finite() && *c > 0.0)?;
        let now_secs = now.timestamp_millis() as f64 / 1000.0;
        Some((now_secs - created) / 86_400.0)
    }
}

/// Reference to a persisted snapshot, handed back by the job runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRef {
    pub snapshot_id: i64,
    pub username: String,
    pub collected_at: DateTime<Utc>,
}
