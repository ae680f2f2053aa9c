//! Server-side conversation search.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use prism_core::{Conversation, PrismConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Search endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Failed to decode search results: {0}")]
    Decode(String),
}

impl SearchError {
    /// Message for the dismissible search banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Search is unavailable. Check your connection.".into(),
            Self::Status(401 | 403) => "Search failed: you are not signed in.".into(),
            Self::Status(429) => "Too many searches. Try again in a moment.".into(),
            Self::Status(code) => format!("Search failed (HTTP {code})."),
            Self::Decode(_) => "Search returned an unexpected response.".into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::Decode(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Remote full-text search over the user's conversations.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Conversation>, SearchError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchBody {
    Bare(Vec<Conversation>),
    Envelope { conversations: Vec<Conversation> },
}

/// Decodes a search response: either a bare array or
/// `{"conversations": [...]}`.
pub fn decode_results(body: &str) -> Result<Vec<Conversation>, SearchError> {
    match serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))? {
        SearchBody::Bare(conversations) | SearchBody::Envelope { conversations } => {
            Ok(conversations)
        }
    }
}

/// `GET {url}?q=<query>` with an optional bearer token.
pub struct HttpSearchBackend {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpSearchBackend {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    pub fn from_config(config: &PrismConfig) -> Self {
        Self::new(config.search_url.clone(), config.api_key.clone())
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str) -> Result<Vec<Conversation>, SearchError> {
        let mut request = self
            .http
            .get(&self.url)
            .query(&[("q", query)])
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;
        decode_results(&body)
    }
}
