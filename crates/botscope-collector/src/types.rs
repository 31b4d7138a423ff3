//! Reddit API response shapes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) expires_in: Option<f64>,
}

/// `GET /user/{name}/about` envelope.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AboutResponse {
    #[serde(default)]
    pub(crate) data: AboutData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AboutData {
    pub(crate) created_utc: Option<f64>,
    pub(crate) link_karma: Option<i64>,
    pub(crate) comment_karma: Option<i64>,
}

/// Listing envelope shared by `submitted` and `comments`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Listing {
    #[serde(default)]
    pub(crate) data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub(crate) children: Vec<Thing>,
    pub(crate) after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thing {
    #[serde(default)]
    pub(crate) data: RawThing,
}

/// One submission or comment as returned by Reddit.
///
/// Submissions carry `title`/`selftext`/`url`; comments carry
/// `body`/`link_id`/`parent_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawThing {
    pub name: Option<String>,
    pub created_utc: Option<f64>,
    pub subreddit: Option<String>,
    pub permalink: Option<String>,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    pub link_id: Option<String>,
    pub parent_id: Option<String>,
}

/// Per-user activity listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Submitted,
    Comments,
}

impl ListingKind {
    /// Path segment used in `/user/{name}/{segment}`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ListingKind::Submitted => "submitted",
            ListingKind::Comments => "comments",
        }
    }
}

impl std::fmt::Display for ListingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
