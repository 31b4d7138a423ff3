//! Reddit activity collection for botscope.
//!
//! Fetches an account's profile and paginated submission/comment listings
//! through a shared [`RateLimiter`] and [`TokenCache`], caches raw responses
//! in a best-effort [`KvCache`], and normalizes the records into
//! [`botscope_core::Item`]s.

pub mod cache;
pub mod client;
pub mod error;
pub mod normalize;
pub mod rate_limit;
pub mod source;
pub mod token;
pub mod types;

pub use cache::{CacheUnavailable, KvCache, MemoryCache};
pub use client::{CollectorConfig, RedditClient};
pub use error::CollectorError;
pub use normalize::normalize_items;
pub use rate_limit::RateLimiter;
pub use source::{ActivitySource, CollectedActivity};
pub use token::{Credentials, TokenCache};
pub use types::{ListingKind, RawThing};
