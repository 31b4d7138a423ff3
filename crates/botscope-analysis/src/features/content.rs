use botscope_core::{ContentFeatures, Item};

use super::ratio;

/// Comment length statistics and the share of items carrying an outbound URL.
///
/// Lengths are counted in characters; a comment without a body has length 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_content_features(items: &[Item]) -> ContentFeatures {
    let mut lengths: Vec<usize> = items
        .iter()
        .filter(|i| i.is_comment())
        .map(|i| i.body_text.as_deref().map_or(0, |b| b.chars().count()))
        .collect();

    let avg_comment_length = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    };

    lengths.sort_unstable();
    let median_comment_length = median(&lengths);

    let with_url = items.iter().filter(|i| i.url.is_some()).count();

    ContentFeatures {
        avg_comment_length,
        median_comment_length,
        url_rate: ratio(with_url, items.len()),
    }
}

/// Median of an already sorted slice; the mean of the middle pair for even
/// lengths.
#[allow(clippy::cast_precision_loss)]
fn median(sorted: &[usize]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2] as f64,
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::test_support::{comment, post};

    #[test]
    fn empty_input_defaults() {
        let c = compute_content_features(&[]);
        assert_eq!(c.avg_comment_length, 0.0);
        assert_eq!(c.median_comment_length, 0.0);
        assert_eq!(c.url_rate, 0.0);
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let items = [comment("t1_a", None, Some("héllo"))];
        let c = compute_content_features(&items);
        assert_eq!(c.avg_comment_length, 5.0);
    }

    #[test]
    fn missing_body_counts_as_zero_length() {
        let items = [
            comment("t1_a", None, None),
            comment("t1_b", None, Some("abcd")),
        ];
        let c = compute_content_features(&items);
        assert_eq!(c.avg_comment_length, 2.0);
        assert_eq!(c.median_comment_length, 2.0);
    }

    #[test]
    fn median_of_odd_count() {
        let items = [
            comment("t1_a", None, Some("aaaaaaaaaa")),
            comment("t1_b", None, Some("a")),
            comment("t1_c", None, Some("aaa")),
        ];
        let c = compute_content_features(&items);
        assert_eq!(c.median_comment_length, 3.0);
    }

    #[test]
    fn posts_do_not_affect_comment_lengths() {
        let mut p = post("t3_a", None);
        p.body_text = Some("a very long self post body".to_string());
        let items = [p, comment("t1_b", None, Some("ab"))];
        let c = compute_content_features(&items);
        assert_eq!(c.avg_comment_length, 2.0);
    }

    #[test]
    fn url_rate_is_over_all_items() {
        let mut linked = post("t3_a", None);
        linked.url = Some("https://example.com".to_string());
        let items = [
            linked,
            post("t3_b", None),
            comment("t1_c", None, Some("x")),
            comment("t1_d", None, Some("y")),
        ];
        let c = compute_content_features(&items);
        assert_eq!(c.url_rate, 0.25);
    }
}
