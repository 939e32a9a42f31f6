//! Share token (`pwd_id`) extraction from Quark share URLs.

use regex::Regex;
use std::sync::LazyLock;

/// Captures everything after the first `/s/` up to a `?`, a further `/s/`
/// marker, or the end of the URL.
static SHARE_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)/s/(.*?)(?:/s/|\?|$)").expect("Invalid share token regex")
});

/// Extract the share token from a share URL.
///
/// Returns `None` when the URL has no `/s/` segment or the segment is empty.
///
/// # Examples
///
/// ```
/// use quark_save::share_link::extract_share_token;
///
/// let token = extract_share_token("https://pan.quark.cn/s/abc123?entry=home");
/// assert_eq!(token.as_deref(), Some("abc123"));
///
/// assert_eq!(extract_share_token("https://pan.quark.cn/list"), None);
/// ```
pub fn extract_share_token(url: &str) -> Option<String> {
    let captures = SHARE_TOKEN_REGEX.captures(url)?;
    let token = captures.get(1)?.as_str();

    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
