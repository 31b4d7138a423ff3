use std::collections::HashSet;

use botscope_core::{InteractionFeatures, Item};

use super::ratio;

/// Thread reach of the account's comments.
#[must_use]
pub fn compute_interaction_features(items: &[Item]) -> InteractionFeatures {
    let comments: Vec<&Item> = items.iter().filter(|i| i.is_comment()).collect();

    let threads: HashSet<&str> = comments
        .iter()
        .filter_map(|c| c.link_id.as_deref())
        .filter(|id| !id.is_empty())
        .collect();

    let top_level = comments
        .iter()
        .filter(|c| match (c.parent_id.as_deref(), c.link_id.as_deref()) {
            (Some(parent), Some(link)) => !link.is_empty() && parent == link,
            _ => false,
        })
        .count();

    InteractionFeatures {
        unique_threads_replied_to: threads.len(),
        top_level_reply_rate: ratio(top_level, comments.len()),
    }
}
