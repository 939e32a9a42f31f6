//! Client configuration and credential file import.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{Error, Result};

/// Quark account info endpoint.
pub const ACCOUNT_INFO_URL: &str = "https://pan.quark.cn/account/info";

/// Resource aggregator search endpoint.
pub const SEARCH_URL: &str = "https://so.252035.xyz/api/search";

/// Base URL for the share page API (`/token`, `/save`).
pub const SHARE_PAGE_BASE: &str = "https://drive-m.quark.cn/1/clouddrive/share/sharepage";

/// Referer sent with every request.
pub const REFERER: &str = "https://pan.quark.cn/";

/// Desktop browser user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Matches a `cookies = "..."` assignment line.
static ASSIGNMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*cookies?\s*=\s*["']?(.*?)["']?\s*$"#).expect("Invalid assignment regex")
});

/// Locations of the three external services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub account_info: String,
    pub search: String,
    pub share_page: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            account_info: ACCOUNT_INFO_URL.to_string(),
            search: SEARCH_URL.to_string(),
            share_page: SHARE_PAGE_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point all three services at one base URL, keeping the provider's paths.
    ///
    /// Used to aim the client at a local stand-in server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            account_info: format!("{}/account/info", base),
            search: format!("{}/api/search", base),
            share_page: format!("{}/1/clouddrive/share/sharepage", base),
        }
    }

    pub(crate) fn share_token(&self) -> String {
        format!("{}/token", self.share_page.trim_end_matches('/'))
    }

    pub(crate) fn share_save(&self) -> String {
        format!("{}/save", self.share_page.trim_end_matches('/'))
    }
}

/// Settings for the HTTP adapter and worker pool.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: Endpoints,
    pub request_timeout: Duration,
    /// Upper bound on concurrently outstanding network calls.
    pub max_in_flight: usize,
    pub user_agent: String,
    pub referer: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            request_timeout: Duration::from_secs(30),
            max_in_flight: 4,
            user_agent: USER_AGENT.to_string(),
            referer: REFERER.to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight == 0 {
            return Err(Error::InvalidConfig(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "request timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read a cookie from a local file.
///
/// The file may hold the bare cookie string or a single `cookies = "..."`
/// line. Blank lines and `#` comments are ignored.
pub fn load_credential_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| Error::CredentialFile {
        path: path.to_path_buf(),
        source,
    })?;

    let cookie = parse_credential(&content);
    if cookie.is_empty() {
        return Err(Error::EmptyCredentialFile(path.to_path_buf()));
    }
    Ok(cookie)
}

fn parse_credential(content: &str) -> String {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect();

    for line in &lines {
        if let Some(captures) = ASSIGNMENT_REGEX.captures(line) {
            if let Some(value) = captures.get(1) {
                return value.as_str().trim().to_string();
            }
        }
    }

    lines.join(" ").trim().to_string()
}
