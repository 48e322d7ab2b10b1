use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RedditError, Result};

static RE_PROFILE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)reddit\.com/(?:user|u)/([A-Za-z0-9_-]+)").unwrap()
});
static RE_BARE_USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/?(?:u/)?([A-Za-z0-9_-]{3,20})/?$").unwrap());

/// Extract a username from a profile URL (`https://www.reddit.com/user/name/`,
/// `reddit.com/u/name`) or a bare `u/name` / `name`.
pub fn username_from_profile(input: &str) -> Result<String> {
    let input = input.trim();

    if let Some(caps) = RE_PROFILE_URL.captures(input) {
        return Ok(caps[1].to_string());
    }
    if let Some(caps) = RE_BARE_USERNAME.captures(input) {
        return Ok(caps[1].to_string());
    }

    Err(RedditError::InvalidProfile(input.to_string()))
}
