//! Data models for provider and aggregator responses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider status code that marks a successful share-page call.
pub const PROVIDER_OK: i64 = 200;

/// A shareable resource returned by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub timestamp: String,
    /// The aggregator's record as received.
    pub raw: Value,
}

impl SearchResult {
    /// Build a result from one aggregator record.
    ///
    /// Missing fields become empty strings; the record itself is kept in `raw`.
    pub fn from_value(raw: Value) -> Self {
        let field = |name: &str| {
            raw.get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            title: field("note"),
            url: field("url"),
            timestamp: field("datetime"),
            raw,
        }
    }

    /// Title shortened for list display.
    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            return "Untitled".to_string();
        }
        truncate_chars(&self.title, 32)
    }

    /// Date part of the timestamp (first ten characters).
    pub fn display_date(&self) -> String {
        self.timestamp.chars().take(10).collect()
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let date = self.display_date();
        let date = if date.is_empty() { "-" } else { date.as_str() };
        write!(f, "{}\t{}\t{}", self.display_title(), date, self.url)
    }
}

/// Shorten `text` to `max` characters, appending `...` when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Response from the account info endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AccountInfoResponse {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
}

impl AccountInfoResponse {
    pub fn nickname(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .get("nickname")?
            .as_str()
            .filter(|n| !n.is_empty())
    }
}

/// A flag that counts as `false` unless it is literally `true`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
}

/// A provider status code; anything but an integer reads as absent.
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_i64()))
}

/// A message field; anything but a string reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().map(str::to_string)))
}

/// Response from the aggregator search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub merged_by_type: Option<HashMap<String, Value>>,
}

impl SearchResponse {
    /// Records listed under `provider`, in source order.
    pub fn records(self, provider: &str) -> Vec<Value> {
        self.data
            .and_then(|d| d.merged_by_type)
            .and_then(|mut by_type| by_type.remove(provider))
            .and_then(|v| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Request body for the share token endpoint.
#[derive(Debug, Serialize)]
pub struct ShareTokenRequest<'a> {
    pub pwd_id: &'a str,
    pub passcode: &'a str,
}

/// Response from the share token endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ShareTokenResponse {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ShareTokenResponse {
    /// The stoken, if the provider accepted the share.
    pub fn stoken(&self) -> Option<&str> {
        if self.status != Some(PROVIDER_OK) {
            return None;
        }
        self.data
            .as_ref()?
            .get("stoken")?
            .as_str()
            .filter(|t| !t.is_empty())
    }
}

/// Request body for the save endpoint.
#[derive(Debug, Serialize)]
pub struct SaveRequest<'a> {
    pub pdir_fid: &'a str,
    pub pdir_save_all: bool,
    pub pwd_id: &'a str,
    pub scene: &'a str,
    pub stoken: &'a str,
    pub to_pdir_fid: &'a str,
}

impl<'a> SaveRequest<'a> {
    /// Save everything in the share into the drive root.
    pub fn to_root(pwd_id: &'a str, stoken: &'a str) -> Self {
        Self {
            pdir_fid: "0",
            pdir_save_all: true,
            pwd_id,
            scene: "link",
            stoken,
            to_pdir_fid: "0",
        }
    }
}

/// Response from the save endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SaveResponse {
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
}

impl SaveResponse {
    pub fn is_ok(&self) -> bool {
        self.status == Some(PROVIDER_OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 32), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("夸克网盘资源", 2), "夸克...");
    }

    #[test]
    fn test_search_result_from_value() {
        let result = SearchResult::from_value(json!({
            "note": "Movie",
            "url": "https://pan.quark.cn/s/abc",
            "datetime": "2024-05-01T12:00:00Z",
            "source": "tg"
        }));

        assert_eq!(result.title, "Movie");
        assert_eq!(result.url, "https://pan.quark.cn/s/abc");
        assert_eq!(result.display_date(), "2024-05-01");
        assert_eq!(result.raw["source"], "tg");
    }

    #[test]
    fn test_search_result_display_untitled() {
        let result = SearchResult::from_value(json!({"url": "https://pan.quark.cn/s/x"}));
        let display = format!("{}", result);
        assert!(display.starts_with("Untitled"));
        assert!(display.contains("https://pan.quark.cn/s/x"));
    }

    #[test]
    fn test_account_info_nickname() {
        let ok: AccountInfoResponse =
            serde_json::from_value(json!({"success": true, "data": {"nickname": "Alice"}}))
                .unwrap();
        assert_eq!(ok.nickname(), Some("Alice"));

        let blank: AccountInfoResponse =
            serde_json::from_value(json!({"success": true, "data": {"nickname": ""}})).unwrap();
        assert_eq!(blank.nickname(), None);
    }

    #[test]
    fn test_share_token_requires_status() {
        let rejected: ShareTokenResponse = serde_json::from_value(
            json!({"status": 404, "message": "gone", "data": {"stoken": "T"}}),
        )
        .unwrap();
        assert_eq!(rejected.stoken(), None);

        let accepted: ShareTokenResponse =
            serde_json::from_value(json!({"status": 200, "data": {"stoken": "T"}})).unwrap();
        assert_eq!(accepted.stoken(), Some("T"));
    }

    #[test]
    fn test_loose_field_types() {
        let info: AccountInfoResponse =
            serde_json::from_value(json!({"success": null, "data": null})).unwrap();
        assert!(!info.success);
        assert_eq!(info.nickname(), None);

        let info: AccountInfoResponse =
            serde_json::from_value(json!({"success": "true", "data": {"nickname": "A"}}))
                .unwrap();
        assert!(!info.success);

        let token: ShareTokenResponse = serde_json::from_value(
            json!({"status": "200", "message": 41003, "data": {"stoken": 7}}),
        )
        .unwrap();
        assert_eq!(token.status, None);
        assert_eq!(token.message, None);
        assert_eq!(token.stoken(), None);

        let save: SaveResponse =
            serde_json::from_value(json!({"status": 400, "message": ["quota"]})).unwrap();
        assert!(!save.is_ok());
        assert_eq!(save.message, None);
    }

    #[test]
    fn test_save_request_payload() {
        let body = serde_json::to_value(SaveRequest::to_root("xyz", "T1")).unwrap();
        assert_eq!(
            body,
            json!({
                "pdir_fid": "0",
                "pdir_save_all": true,
                "pwd_id": "xyz",
                "scene": "link",
                "stoken": "T1",
                "to_pdir_fid": "0"
            })
        );
    }

    #[test]
    fn test_search_records_missing_provider() {
        let response: SearchResponse =
            serde_json::from_value(json!({"data": {"merged_by_type": {"baidu": []}}})).unwrap();
        assert!(response.records("quark").is_empty());
    }
}
