//! Core entry points driven by the view layer.
//!
//! [`App`] owns the application state and exposes the three user intents:
//! verify a cookie, search for resources, and save one resource. Views
//! observe changes through [`App::subscribe`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, VerificationError};
use crate::http::HttpAdapter;
use crate::models::SearchResult;
use crate::save::{self, SaveOutcome};
use crate::search::{self, SearchOutcome};
use crate::session::{self, Session};
use crate::share_link::extract_share_token;
use crate::state::{AppState, StateEvent};

/// Capacity of the state event channel.
const EVENT_CAPACITY: usize = 256;

type SaveKey = (String, String);

/// The application core. Clones share state, so a view can hand one to each
/// concurrently running save.
#[derive(Clone)]
pub struct App {
    http: HttpAdapter,
    state: Arc<RwLock<AppState>>,
    events: broadcast::Sender<StateEvent>,
    in_flight: Arc<Mutex<HashSet<SaveKey>>>,
}

impl App {
    /// Create a new App with empty state.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_adapter(HttpAdapter::new(config)?))
    }

    pub fn with_adapter(http: HttpAdapter) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http,
            state: Arc::new(RwLock::new(AppState::new())),
            events,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Receive state change events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// The current session, if a cookie has been verified.
    pub async fn session(&self) -> Option<Arc<Session>> {
        self.state.read().await.session()
    }

    /// The results of the most recent search.
    pub async fn results(&self) -> Vec<SearchResult> {
        self.state.read().await.results().to_vec()
    }

    /// Verify `credential` and make it the current session.
    ///
    /// On failure the existing session is kept.
    pub async fn verify_credential(
        &self,
        credential: &str,
    ) -> std::result::Result<Arc<Session>, VerificationError> {
        let verified = session::verify(&self.http, credential).await?;
        let nickname = verified.nickname().to_string();

        let session = self.state.write().await.set_session(verified);
        self.emit(StateEvent::SessionChanged {
            nickname: Some(nickname),
        });
        Ok(session)
    }

    /// Forget the current session, as when the cookie input is cleared.
    pub async fn clear_session(&self) {
        let cleared = self.state.write().await.clear_session();
        if cleared {
            info!("session cleared");
            self.emit(StateEvent::SessionChanged { nickname: None });
        }
    }

    /// Search for `keyword` and replace the stored results.
    ///
    /// A blank keyword is ignored and leaves the stored results untouched.
    pub async fn search(&self, keyword: &str) -> SearchOutcome {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            debug!("blank keyword, search skipped");
            return SearchOutcome::Results(Vec::new());
        }

        let outcome = search::search(&self.http, keyword).await;
        let count = outcome.results().len();
        let failed = outcome.is_failed();

        self.state
            .write()
            .await
            .replace_results(outcome.results().to_vec());
        self.emit(StateEvent::ResultsReplaced { count, failed });
        outcome
    }

    /// Save `resource` into the current session's drive.
    ///
    /// Fails with `NoSession` before any network call when no cookie has been
    /// verified. A second save of the same share under the same cookie while
    /// the first is running returns `AlreadyInProgress`.
    pub async fn save_resource(
        &self,
        resource: &SearchResult,
    ) -> std::result::Result<SaveOutcome, VerificationError> {
        let session = self.session().await.ok_or(VerificationError::NoSession)?;

        let _guard = match extract_share_token(&resource.url) {
            Some(pwd_id) => {
                let key = (session.credential().to_string(), pwd_id);
                match InFlightGuard::acquire(&self.in_flight, key) {
                    Some(guard) => Some(guard),
                    None => {
                        debug!(url = %resource.url, "save already in progress");
                        return Ok(SaveOutcome::AlreadyInProgress);
                    }
                }
            }
            None => None,
        };

        self.emit(StateEvent::SaveStarted {
            url: resource.url.clone(),
            title: resource.title.clone(),
        });

        let outcome = save::save(&self.http, &session, resource).await;

        self.emit(StateEvent::SaveFinished {
            url: resource.url.clone(),
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    fn emit(&self, event: StateEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Marks a `(cookie, pwd_id)` pair as being saved until dropped.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<SaveKey>>>,
    key: SaveKey,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<SaveKey>>>, key: SaveKey) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone());

        inserted.then(|| Self {
            set: Arc::clone(set),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}
