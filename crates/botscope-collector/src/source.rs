use std::future::Future;

use botscope_core::{AccountProfile, Item};

use crate::error::CollectorError;

/// Profile plus normalized activity for one account.
#[derive(Debug, Clone)]
pub struct CollectedActivity {
    pub profile: AccountProfile,
    pub items: Vec<Item>,
}

/// Anything that can gather an account's public activity.
///
/// [`crate::RedditClient`] is the production implementation; the job runner
/// is generic over this trait so it can be driven by fakes in tests.
pub trait ActivitySource: Send + Sync {
    /// Collects the profile and up to `max_items` normalized items.
    fn collect(
        &self,
        username: &str,
        max_items: usize,
    ) -> impl Future<Output = Result<CollectedActivity, CollectorError>> + Send;
}
