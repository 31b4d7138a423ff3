//! Raw Reddit records → platform-neutral [`Item`]s.

use botscope_core::{Item, ItemKind};

use crate::types::RawThing;

const PERMALINK_ORIGIN: &str = "https://www.reddit.com";

/// Normalizes submissions followed by comments, preserving input order.
#[must_use]
pub fn normalize_items(submissions: &[RawThing], comments: &[RawThing]) -> Vec<Item> {
    submissions
        .iter()
        .map(normalize_submission)
        .chain(comments.iter().map(normalize_comment))
        .collect()
}

fn normalize_submission(raw: &RawThing) -> Item {
    Item {
        kind: ItemKind::Post,
        item_id: raw.name.clone().unwrap_or_default(),
        created_utc: raw.created_utc,
        subreddit: raw.subreddit.clone(),
        permalink: Some(permalink(raw.permalink.as_deref())),
        body_text: non_empty(raw.selftext.as_deref()),
        url: non_empty(raw.url.as_deref()),
        link_id: None,
        parent_id: None,
    }
}

fn normalize_comment(raw: &RawThing) -> Item {
    Item {
        kind: ItemKind::Comment,
        item_id: raw.name.clone().unwrap_or_default(),
        created_utc: raw.created_utc,
        subreddit: raw.subreddit.clone(),
        permalink: Some(permalink(raw.permalink.as_deref())),
        body_text: non_empty(raw.body.as_deref()),
        url: None,
        link_id: raw.link_id.clone(),
        parent_id: raw.parent_id.clone(),
    }
}

fn permalink(path: Option<&str>) -> String {
    format!("{PERMALINK_ORIGIN}{}", path.unwrap_or_default())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
