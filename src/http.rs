//! HTTP adapter for the provider and aggregator endpoints.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, REFERER};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::{Config, Endpoints};
use crate::error::{Error, HttpError, Result};

/// A parsed JSON response together with its HTTP status.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: u16,
    pub body: Value,
}

/// Wraps outbound calls, attaching fixed headers and classifying failures.
///
/// Cloning is cheap; clones share the connection pool and the in-flight limit.
#[derive(Clone)]
pub struct HttpAdapter {
    http: Client,
    endpoints: Arc<Endpoints>,
    limiter: Arc<Semaphore>,
}

impl HttpAdapter {
    /// Create a new adapter from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            REFERER,
            HeaderValue::from_str(&config.referer)
                .map_err(|e| Error::InvalidConfig(e.to_string()))?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoints: Arc::new(config.endpoints.clone()),
            limiter: Arc::new(Semaphore::new(config.max_in_flight)),
        })
    }

    /// Get the configured endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a GET request and parse the JSON body.
    pub async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        credential: Option<&str>,
    ) -> std::result::Result<JsonResponse, HttpError> {
        let request = self.http.get(url).query(query);
        self.execute(request, credential).await
    }

    /// Send a POST request with a JSON body and parse the JSON response.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, String)],
        body: &B,
        credential: Option<&str>,
    ) -> std::result::Result<JsonResponse, HttpError> {
        let request = self.http.post(url).query(query).json(body);
        self.execute(request, credential).await
    }

    async fn execute(
        &self,
        mut request: RequestBuilder,
        credential: Option<&str>,
    ) -> std::result::Result<JsonResponse, HttpError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| HttpError::Unknown(e.to_string()))?;

        if let Some(credential) = credential {
            let value = HeaderValue::from_str(&format_cookie(credential))
                .map_err(|e| HttpError::Unknown(format!("invalid cookie header: {}", e)))?;
            request = request.header(COOKIE, value);
        }

        let response = request.send().await.map_err(|e| {
            let err = HttpError::from(e);
            warn!(error = %err, "request failed");
            err
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(HttpError::from)?;

        let body: Value = serde_json::from_str(&text).map_err(|e| {
            warn!(status, error = %e, "response is not JSON");
            HttpError::MalformedResponse(e.to_string())
        })?;

        debug!(status, "response received");
        Ok(JsonResponse { status, body })
    }
}

/// Normalize a pasted cookie into a header value.
///
/// Strips surrounding whitespace and a leading `cookie:` prefix in any case.
///
/// # Examples
///
/// ```
/// use quark_save::http::format_cookie;
///
/// assert_eq!(format_cookie("Cookie: a=1; b=2 "), "a=1; b=2");
/// assert_eq!(format_cookie("a=1"), "a=1");
/// ```
pub fn format_cookie(raw: &str) -> String {
    let trimmed = raw.trim();
    let prefix = "cookie:";
    match trimmed.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => {
            trimmed[prefix.len()..].trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}
