//! Keyword search against the resource aggregator.

use tracing::{debug, warn};

use crate::http::HttpAdapter;
use crate::models::{SearchResponse, SearchResult};

/// Provider key the aggregator files Quark links under.
pub const PROVIDER_KEY: &str = "quark";

/// Result of one search call.
///
/// Callers that don't care why a search came back empty can use
/// [`SearchOutcome::into_results`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<SearchResult>),
    Failed(String),
}

impl SearchOutcome {
    /// The results, with a failed search treated as no results.
    pub fn into_results(self) -> Vec<SearchResult> {
        match self {
            SearchOutcome::Results(results) => results,
            SearchOutcome::Failed(_) => Vec::new(),
        }
    }

    pub fn results(&self) -> &[SearchResult] {
        match self {
            SearchOutcome::Results(results) => results,
            SearchOutcome::Failed(_) => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SearchOutcome::Failed(_))
    }
}

/// Search the aggregator for Quark share links matching `keyword`.
///
/// Never errors: transport failures and non-200 responses become
/// [`SearchOutcome::Failed`]. Results keep the aggregator's order.
pub async fn search(http: &HttpAdapter, keyword: &str) -> SearchOutcome {
    let query = [
        ("kw", keyword.to_string()),
        ("cloud_types", PROVIDER_KEY.to_string()),
    ];

    let response = match http.get_json(&http.endpoints().search, &query, None).await {
        Ok(response) => response,
        Err(e) => {
            warn!(keyword, error = %e, "search request failed");
            return SearchOutcome::Failed(e.to_string());
        }
    };

    if response.status != 200 {
        warn!(keyword, status = response.status, "search returned non-200 status");
        return SearchOutcome::Failed(format!("HTTP {}", response.status));
    }

    let parsed: SearchResponse = match serde_json::from_value(response.body) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(keyword, error = %e, "unexpected search payload");
            return SearchOutcome::Failed(e.to_string());
        }
    };

    let results: Vec<SearchResult> = parsed
        .records(PROVIDER_KEY)
        .into_iter()
        .map(SearchResult::from_value)
        .collect();

    debug!(keyword, count = results.len(), "search completed");
    SearchOutcome::Results(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_is_empty() {
        let outcome = SearchOutcome::Failed("HTTP 502".to_string());
        assert!(outcome.is_failed());
        assert!(outcome.results().is_empty());
        assert!(outcome.into_results().is_empty());
    }
}
