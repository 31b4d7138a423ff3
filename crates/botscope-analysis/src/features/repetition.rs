use std::collections::HashMap;
use std::sync::LazyLock;

use botscope_core::{Item, RepetitionFeatures};
use regex::Regex;
use reqwest::Url;

use super::ratio;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+").expect("valid token regex"));

const PHRASE_LEN: usize = 3;

/// Duplication, phrase reuse, outbound-domain and subreddit concentration.
#[must_use]
pub fn compute_repetition_features(items: &[Item]) -> RepetitionFeatures {
    let normalized: Vec<String> = items
        .iter()
        .filter_map(|i| i.body_text.as_deref())
        .filter(|text| !text.is_empty())
        .map(normalize_text)
        .collect();

    let near_duplicate_rate = if normalized.is_empty() {
        0.0
    } else {
        let unique = tally(normalized.iter().cloned()).len();
        (1.0 - ratio(unique, normalized.len())).max(0.0)
    };

    let phrases = tally(normalized.iter().flat_map(|text| {
        let tokens: Vec<&str> = text.split(' ').filter(|t| !t.is_empty()).collect();
        tokens
            .windows(PHRASE_LEN)
            .map(|w| w.join(" "))
            .collect::<Vec<_>>()
    }));
    let top_phrase_reuse = most_common(&phrases)
        .map_or(0.0, |(_, count)| ratio(count, normalized.len().max(1)));

    let domains = tally(items.iter().filter_map(|i| i.url.as_deref()).filter_map(url_domain));
    let total_domains: usize = domains.iter().map(|(_, count)| count).sum();
    let (top_domain, link_domain_concentration) = match most_common(&domains) {
        Some((domain, count)) => (Some(domain.to_string()), ratio(count, total_domains)),
        None => (None, 0.0),
    };

    let subreddits = tally(
        items
            .iter()
            .filter_map(|i| i.subreddit.as_deref())
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );

    RepetitionFeatures {
        near_duplicate_rate,
        top_phrase_reuse,
        link_domain_concentration,
        top_domain,
        subreddit_entropy: normalized_entropy(&subreddits),
    }
}

/// Lowercases and keeps only `[a-z0-9]+` tokens joined by single spaces.
pub(crate) fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Counts in first-occurrence order.
fn tally<I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        if let Some(&slot) = index.get(&value) {
            counts[slot].1 += 1;
        } else {
            index.insert(value.clone(), counts.len());
            counts.push((value, 1));
        }
    }
    counts
}

/// Highest count; ties resolve to the value seen first.
fn most_common(counts: &[(String, usize)]) -> Option<(&str, usize)> {
    counts
        .iter()
        .fold(None, |best: Option<(&str, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((value.as_str(), *count)),
        })
}

/// Shannon entropy divided by its maximum for the observed label count.
///
/// `1.0` with no labels, `0.0` with a single distinct label.
#[allow(clippy::cast_precision_loss)]
fn normalized_entropy(counts: &[(String, usize)]) -> f64 {
    if counts.is_empty() {
        return 1.0;
    }
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    let entropy: f64 = counts
        .iter()
        .map(|(_, c)| ratio(*c, total))
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.ln())
        .sum();
    let max_entropy = (counts.len() as f64).ln();
    if max_entropy == 0.0 {
        0.0
    } else {
        (entropy / max_entropy).clamp(0.0, 1.0)
    }
}

/// Lowercased host of an absolute or scheme-relative URL. Port and
/// userinfo are not part of the key.
fn url_domain(url: &str) -> Option<String> {
    let parsed = match url.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{rest}")),
        None => Url::parse(url),
    }
    .ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_lowercase)
}
