//! Cookie verification against the Quark account endpoint.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::VerificationError;
use crate::http::HttpAdapter;
use crate::models::AccountInfoResponse;

/// An authenticated user, valid as of its verification call.
///
/// No expiry is tracked; a stale cookie shows up when a later call fails.
#[derive(Clone, PartialEq)]
pub struct Session {
    credential: String,
    nickname: String,
    profile: Value,
}

impl Session {
    /// The cookie this session was verified with.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// The account payload returned by the provider.
    pub fn profile(&self) -> &Value {
        &self.profile
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("credential", &"<redacted>")
            .field("nickname", &self.nickname)
            .finish()
    }
}

/// Verify a pasted cookie and build a session from the account info.
///
/// An empty or whitespace-only cookie fails with `EmptyCredential` without
/// touching the network.
pub async fn verify(http: &HttpAdapter, credential: &str) -> Result<Session, VerificationError> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(VerificationError::EmptyCredential);
    }

    let query = [("fr", "pc".to_string()), ("platform", "pc".to_string())];
    let response = http
        .get_json(&http.endpoints().account_info, &query, Some(credential))
        .await?;

    // A JSON reply of any other shape is a rejection, not a transport failure.
    let info: AccountInfoResponse = serde_json::from_value(response.body).unwrap_or_default();

    let nickname = match (info.success, info.nickname()) {
        (true, Some(nickname)) => nickname.to_string(),
        _ => {
            warn!(status = response.status, "cookie rejected by provider");
            return Err(VerificationError::InvalidOrExpired);
        }
    };

    info!(nickname = %nickname, "cookie verified");
    Ok(Session {
        credential: credential.to_string(),
        nickname,
        profile: info.data.unwrap_or(Value::Null),
    })
}

#[cfg(test)]
impl Session {
    pub(crate) fn for_tests(credential: &str, nickname: &str) -> Self {
        Self {
            credential: credential.to_string(),
            nickname: nickname.to_string(),
            profile: Value::Null,
        }
    }
}
