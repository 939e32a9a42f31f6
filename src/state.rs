//! Application state and the events emitted when it changes.

use std::sync::Arc;

use crate::models::SearchResult;
use crate::save::SaveOutcome;
use crate::session::Session;

/// Current session and the latest search results.
///
/// Only the [`App`](crate::app::App) entry points write here. The session is
/// swapped as a whole and the results are replaced, never appended.
#[derive(Debug, Default)]
pub struct AppState {
    session: Option<Arc<Session>>,
    results: Vec<SearchResult>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.clone()
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub(crate) fn set_session(&mut self, session: Session) -> Arc<Session> {
        let session = Arc::new(session);
        self.session = Some(Arc::clone(&session));
        session
    }

    pub(crate) fn clear_session(&mut self) -> bool {
        self.session.take().is_some()
    }

    pub(crate) fn replace_results(&mut self, results: Vec<SearchResult>) {
        self.results = results;
    }
}

/// Change notifications for view-layer observers.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// A session was established or cleared.
    SessionChanged { nickname: Option<String> },
    /// The result list was replaced. `failed` is set when the search itself
    /// failed rather than matching nothing.
    ResultsReplaced { count: usize, failed: bool },
    SaveStarted { url: String, title: String },
    SaveFinished { url: String, outcome: SaveOutcome },
}
