//! The two-phase save workflow: share validity check, then save to drive.
//!
//! A [`SaveTransaction`] walks `Start → LinkParsed → ValidityChecked → Done`.
//! Each step either advances or finishes with a terminal [`SaveOutcome`].
//! The save call is only issued after the validity check produced an stoken.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::HttpError;
use crate::http::HttpAdapter;
use crate::models::{
    SaveRequest, SaveResponse, SearchResult, ShareTokenRequest, ShareTokenResponse,
};
use crate::session::Session;
use crate::share_link::extract_share_token;

const RESOURCE_INVALID_FALLBACK: &str = "Resource Invalid";
const SAVE_FAILED_FALLBACK: &str = "Save Failed";

/// Terminal result of a save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Succeeded,
    LinkUnparseable,
    ResourceInvalid(String),
    SaveFailed(String),
    NetworkError(String),
    /// The same share is already being saved for this cookie.
    AlreadyInProgress,
}

impl SaveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SaveOutcome::Succeeded)
    }

    /// Whether trying the same resource again could change the result.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SaveOutcome::SaveFailed(_) | SaveOutcome::NetworkError(_)
        )
    }
}

impl std::fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveOutcome::Succeeded => write!(f, "Saved"),
            SaveOutcome::LinkUnparseable => write!(f, "Could not parse share link"),
            SaveOutcome::ResourceInvalid(reason) => write!(f, "Resource invalid: {}", reason),
            SaveOutcome::SaveFailed(reason) => write!(f, "Save failed: {}", reason),
            SaveOutcome::NetworkError(detail) => write!(f, "Network error: {}", detail),
            SaveOutcome::AlreadyInProgress => write!(f, "Already saving"),
        }
    }
}

impl From<HttpError> for SaveOutcome {
    fn from(err: HttpError) -> Self {
        SaveOutcome::NetworkError(err.to_string())
    }
}

/// Where a transaction currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    Start,
    LinkParsed { pwd_id: String },
    ValidityChecked { pwd_id: String, stoken: String },
    Done(SaveOutcome),
}

/// Cache-busting query parameters attached to the save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveRequestMeta {
    /// Pseudo-random delay in milliseconds, in `[60_000, 300_000)`.
    pub delay_ms: u64,
    /// Wall-clock time in milliseconds since the epoch.
    pub timestamp_ms: u64,
}

impl SaveRequestMeta {
    fn query(&self) -> [(&'static str, String); 5] {
        [
            ("pr", "ucpro".to_string()),
            ("fr", "pc".to_string()),
            ("uc_param_str", String::new()),
            ("__dt", self.delay_ms.to_string()),
            ("__t", self.timestamp_ms.to_string()),
        ]
    }
}

/// Build the metadata for one save request.
///
/// The provider deduplicates identical requests; these values only need to vary.
pub fn save_request_metadata() -> SaveRequestMeta {
    let delay_ms = rand::thread_rng().gen_range(60_000..300_000);
    let timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();

    SaveRequestMeta {
        delay_ms,
        timestamp_ms,
    }
}

/// One save attempt for one resource under one session.
pub struct SaveTransaction<'a> {
    http: &'a HttpAdapter,
    session: &'a Session,
    url: String,
    state: SaveState,
}

impl<'a> SaveTransaction<'a> {
    pub fn new(http: &'a HttpAdapter, session: &'a Session, resource: &SearchResult) -> Self {
        Self {
            http,
            session,
            url: resource.url.clone(),
            state: SaveState::Start,
        }
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    /// Advance by one state. Does nothing once the transaction is done.
    pub async fn step(&mut self) {
        let next = match &self.state {
            SaveState::Start => self.parse_link(),
            SaveState::LinkParsed { pwd_id } => self.check_validity(pwd_id).await,
            SaveState::ValidityChecked { pwd_id, stoken } => self.save(pwd_id, stoken).await,
            SaveState::Done(_) => return,
        };
        debug!(state = ?next, "save transaction advanced");
        self.state = next;
    }

    /// Drive the transaction to its terminal outcome.
    pub async fn run(&mut self) -> SaveOutcome {
        loop {
            if let SaveState::Done(outcome) = &self.state {
                return outcome.clone();
            }
            self.step().await;
        }
    }

    fn parse_link(&self) -> SaveState {
        match extract_share_token(&self.url) {
            Some(pwd_id) => SaveState::LinkParsed { pwd_id },
            None => {
                warn!(url = %self.url, "no share token in link");
                SaveState::Done(SaveOutcome::LinkUnparseable)
            }
        }
    }

    async fn check_validity(&self, pwd_id: &str) -> SaveState {
        let query = [("pr", "ucpro".to_string()), ("fr", "h5".to_string())];
        let body = ShareTokenRequest {
            pwd_id,
            passcode: "",
        };

        let response = match self
            .http
            .post_json(
                &self.http.endpoints().share_token(),
                &query,
                &body,
                Some(self.session.credential()),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => return SaveState::Done(e.into()),
        };

        let parsed: ShareTokenResponse =
            serde_json::from_value(response.body).unwrap_or_default();

        if let Some(stoken) = parsed.stoken() {
            return SaveState::ValidityChecked {
                pwd_id: pwd_id.to_string(),
                stoken: stoken.to_string(),
            };
        }

        let reason = parsed
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| RESOURCE_INVALID_FALLBACK.to_string());
        warn!(pwd_id, status = ?parsed.status, reason = %reason, "share rejected");
        SaveState::Done(SaveOutcome::ResourceInvalid(reason))
    }

    async fn save(&self, pwd_id: &str, stoken: &str) -> SaveState {
        let meta = save_request_metadata();
        let body = SaveRequest::to_root(pwd_id, stoken);

        let response = match self
            .http
            .post_json(
                &self.http.endpoints().share_save(),
                &meta.query(),
                &body,
                Some(self.session.credential()),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => return SaveState::Done(e.into()),
        };

        let parsed: SaveResponse =
            serde_json::from_value(response.body).unwrap_or_default();

        if parsed.is_ok() {
            info!(pwd_id, "share saved to drive");
            return SaveState::Done(SaveOutcome::Succeeded);
        }

        let reason = parsed
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| SAVE_FAILED_FALLBACK.to_string());
        warn!(pwd_id, status = ?parsed.status, reason = %reason, "save rejected");
        SaveState::Done(SaveOutcome::SaveFailed(reason))
    }
}

/// Save `resource` into the drive root of `session`'s account.
pub async fn save(http: &HttpAdapter, session: &Session, resource: &SearchResult) -> SaveOutcome {
    let mut tx = SaveTransaction::new(http, session, resource);
    tx.run().await
}
