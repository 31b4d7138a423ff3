//! Username extraction from raw handles and profile URLs.

use reqwest::Url;
use thiserror::Error;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameParseError {
    #[error("username input is empty")]
    Empty,

    #[error("unable to find a username in URL \"{0}\"")]
    UnrecognizedUrl(String),

    #[error("invalid username \"{username}\": {reason}")]
    Invalid { username: String, reason: String },
}

/// Extract a Reddit username from a bare handle (`alice`, `u/alice`,
/// `/u/alice`) or a profile URL (`https://www.reddit.com/user/alice/`).
///
/// # Errors
///
/// Returns [`UsernameParseError`] when no handle can be located or the
/// handle is not 3–20 characters of `[A-Za-z0-9_-]`.
pub fn parse_username(input: &str) -> Result<String, UsernameParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UsernameParseError::Empty);
    }

    let candidate = if trimmed.contains("reddit.com") {
        profile_segment(trimmed)
            .ok_or_else(|| UsernameParseError::UnrecognizedUrl(trimmed.to_string()))?
    } else {
        let without_slash = trimmed.trim_start_matches('/');
        without_slash
            .strip_prefix("u/")
            .or_else(|| without_slash.strip_prefix("user/"))
            .unwrap_or(without_slash)
            .trim_end_matches('/')
            .to_string()
    };

    validate(candidate)
}

/// The path segment following `user` or `u` in a Reddit profile URL such as
/// `https://www.reddit.com/user/alice/comments?sort=new`. A missing scheme is
/// taken as `https`.
fn profile_segment(input: &str) -> Option<String> {
    let url = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("https://{}", input.trim_start_matches('/')))
    }
    .ok()?;

    let host = url.host_str()?;
    if host != "reddit.com" && !host.ends_with(".reddit.com") {
        return None;
    }

    let parts: Vec<&str> = url.path_segments()?.filter(|p| !p.is_empty()).collect();
    let idx = parts
        .iter()
        .position(|p| *p == "user")
        .or_else(|| parts.iter().position(|p| *p == "u"))?;
    parts.get(idx + 1).map(|s| (*s).to_string())
}

fn validate(candidate: String) -> Result<String, UsernameParseError> {
    let len = candidate.chars().count();
    if !(MIN_LEN..=MAX_LEN).contains(&len) {
        return Err(UsernameParseError::Invalid {
            reason: format!("length must be between {MIN_LEN} and {MAX_LEN} characters"),
            username: candidate,
        });
    }
    if !candidate
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(UsernameParseError::Invalid {
            reason: "only letters, digits, '_' and '-' are allowed".to_string(),
            username: candidate,
        });
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_handle_is_returned_unchanged() {
        assert_eq!(parse_username("alice").unwrap(), "alice");
        assert_eq!(parse_username("  Some_Bot-42 ").unwrap(), "Some_Bot-42");
    }

    #[test]
    fn u_prefix_is_stripped_without_eating_leading_letters() {
        assert_eq!(parse_username("u/alice").unwrap(), "alice");
        assert_eq!(parse_username("/u/alice/").unwrap(), "alice");
        assert_eq!(parse_username("ulysses").unwrap(), "ulysses");
    }

    #[test]
    fn profile_urls_are_parsed() {
        assert_eq!(
            parse_username("https://www.reddit.com/user/alice/").unwrap(),
            "alice"
        );
        assert_eq!(
            parse_username("https://old.reddit.com/u/bob/comments/?sort=new").unwrap(),
            "bob"
        );
        assert_eq!(parse_username("reddit.com/user/carol#top").unwrap(), "carol");
    }

    #[test]
    fn url_without_user_segment_is_rejected() {
        let err = parse_username("https://www.reddit.com/r/rust/").unwrap_err();
        assert!(matches!(err, UsernameParseError::UnrecognizedUrl(_)));
    }

    #[test]
    fn profile_url_with_port_and_mixed_case_host_is_parsed() {
        assert_eq!(
            parse_username("https://WWW.Reddit.com:443/user/dave/").unwrap(),
            "dave"
        );
    }

    #[test]
    fn reddit_in_path_of_other_host_is_rejected() {
        let err = parse_username("https://evil.example/reddit.com/user/mallory").unwrap_err();
        assert!(matches!(err, UsernameParseError::UnrecognizedUrl(_)));
    }

    #[test]
    fn empty_and_malformed_inputs_are_rejected() {
        assert_eq!(parse_username("   ").unwrap_err(), UsernameParseError::Empty);
        assert!(matches!(
            parse_username("ab").unwrap_err(),
            UsernameParseError::Invalid { .. }
        ));
        assert!(matches!(
            parse_username("bad name!").unwrap_err(),
            UsernameParseError::Invalid { .. }
        ));
        assert!(matches!(
            parse_username("a_very_long_username_indeed").unwrap_err(),
            UsernameParseError::Invalid { .. }
        ));
    }
}
