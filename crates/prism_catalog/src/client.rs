//! Fetch, validate and cache the model catalog.
//!
//! The endpoint may return a bare JSON array or an OpenRouter-style
//! `{"data": [...]}` envelope. Entries are normalized at this boundary so the
//! rest of the crate never sees a missing field. Snapshots are cached for
//! five minutes by default.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use prism_core::PrismConfig;

use crate::types::{ModelCatalogEntry, Pricing, ProviderRef, TierFlags};

const DEFAULT_TTL: Duration = Duration::from_secs(300);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors surfaced while loading the catalog. All are recoverable through a
/// retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Catalog endpoint returned HTTP {0}")]
    Status(u16),

    #[error("Failed to decode catalog: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Message suitable for an inline retry banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Couldn't reach the model catalog. Check your connection.".into(),
            Self::Status(401 | 403) => "The model catalog rejected your API key.".into(),
            Self::Status(code) => format!("The model catalog is unavailable (HTTP {code})."),
            Self::Decode(_) => "The model catalog returned an unexpected response.".into(),
        }
    }

    /// Whether retrying without changing anything could plausibly succeed.
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

/// Anything that can produce a catalog snapshot.
#[async_trait]
pub trait CatalogFetcher: Send + Sync {
    async fn fetch_models(&self) -> Result<Vec<ModelCatalogEntry>, CatalogError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogBody {
    Bare(Vec<serde_json::Value>),
    Envelope { data: Vec<serde_json::Value> },
}

#[derive(Debug, Deserialize)]
struct WireModel {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    provider: Option<WireProvider>,
    #[serde(default)]
    context_length: Option<u32>,
    #[serde(default)]
    pricing: Option<WirePricing>,
    #[serde(default)]
    input_modalities: Option<Vec<String>>,
    #[serde(default)]
    output_modalities: Option<Vec<String>>,
    /// OpenRouter nests modalities here.
    #[serde(default)]
    architecture: Option<WireArchitecture>,
    #[serde(default)]
    supported_parameters: Option<Vec<String>>,
    #[serde(default)]
    tiers: Option<TierFlags>,
}

#[derive(Debug, Deserialize)]
struct WireProvider {
    #[serde(default)]
    slug: Option<String>,
    #[serde(default, alias = "name")]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireArchitecture {
    #[serde(default)]
    input_modalities: Option<Vec<String>>,
    #[serde(default)]
    output_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct WirePricing {
    #[serde(default)]
    prompt: Option<WirePrice>,
    #[serde(default)]
    completion: Option<WirePrice>,
    #[serde(default)]
    image: Option<WirePrice>,
}

/// Prices are usually decimal strings, but some proxies emit numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePrice {
    Text(String),
    Number(f64),
}

impl WirePrice {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Applies the documented defaults. Returns `None` for entries without an ID.
fn normalize(wire: WireModel) -> Option<ModelCatalogEntry> {
    let id = non_blank(wire.id)?;
    let name = non_blank(wire.name).unwrap_or_else(|| id.clone());

    let (slug, label) = match wire.provider {
        Some(p) => (non_blank(p.slug), non_blank(p.label)),
        None => (None, None),
    };
    // OpenRouter IDs look like `openai/gpt-4o`.
    let slug = slug.unwrap_or_else(|| match id.split_once('/') {
        Some((prefix, _)) if !prefix.is_empty() => prefix.to_string(),
        _ => "unknown".to_string(),
    });
    // OpenRouter names look like `OpenAI: GPT-4o`.
    let label = label
        .or_else(|| {
            name.split_once(": ")
                .map(|(prefix, _)| prefix.trim().to_string())
                .filter(|p| !p.is_empty())
        })
        .unwrap_or_else(|| slug.clone());

    let pricing = wire
        .pricing
        .map(|p| Pricing {
            prompt: p.prompt.map(WirePrice::into_string),
            completion: p.completion.map(WirePrice::into_string),
            image: p.image.map(WirePrice::into_string),
        })
        .unwrap_or_default();

    let (arch_in, arch_out) = match wire.architecture {
        Some(a) => (a.input_modalities, a.output_modalities),
        None => (None, None),
    };

    Some(ModelCatalogEntry {
        id,
        name,
        description: wire.description.unwrap_or_default(),
        provider: ProviderRef { slug, label },
        context_length: wire.context_length.unwrap_or(0),
        pricing,
        input_modalities: wire.input_modalities.or(arch_in).unwrap_or_default(),
        output_modalities: wire.output_modalities.or(arch_out).unwrap_or_default(),
        supported_parameters: wire.supported_parameters.unwrap_or_default(),
        tiers: wire.tiers.unwrap_or_default(),
    })
}

/// Decodes and validates a catalog response body.
///
/// Only the outer shape can fail the whole body. Each entry is decoded on its
/// own; malformed or id-less entries are dropped with a warning.
pub fn decode_catalog(body: &str) -> Result<Vec<ModelCatalogEntry>, CatalogError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| CatalogError::Decode(e.to_string()))?;
    let entries = match serde_json::from_value(value) {
        Ok(CatalogBody::Bare(entries) | CatalogBody::Envelope { data: entries }) => entries,
        Err(_) => {
            return Err(CatalogError::Decode(
                "expected a JSON array or an object with a `data` array".into(),
            ));
        }
    };

    let total = entries.len();
    let mut models = Vec::with_capacity(total);
    for (index, entry) in entries.into_iter().enumerate() {
        let wire = match serde_json::from_value::<WireModel>(entry) {
            Ok(wire) => wire,
            Err(e) => {
                warn!("Dropping malformed catalog entry #{index}: {e}");
                continue;
            }
        };
        match normalize(wire) {
            Some(model) => models.push(model),
            None => warn!("Dropping catalog entry #{index} without an id"),
        }
    }
    if models.len() < total {
        warn!("Kept {} of {total} catalog entries", models.len());
    }
    Ok(models)
}

// ---------------------------------------------------------------------------
// CatalogClient
// ---------------------------------------------------------------------------

struct CatalogCache {
    models: Vec<ModelCatalogEntry>,
    fetched_at: Option<Instant>,
}

/// HTTP client for the catalog endpoint with an in-memory snapshot cache.
pub struct CatalogClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    ttl: Duration,
    cache: Mutex<CatalogCache>,
}

impl CatalogClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            url: url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            ttl: DEFAULT_TTL,
            cache: Mutex::new(CatalogCache {
                models: Vec::new(),
                fetched_at: None,
            }),
        }
    }

    pub fn from_config(config: &PrismConfig) -> Self {
        Self::new(config.catalog_url.clone(), config.api_key.clone())
            .with_ttl(config.catalog_cache_ttl())
    }

    /// Overrides the cache lifetime. A zero TTL disables caching.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Clear the cached snapshot (e.g. when the API key changes).
    pub fn invalidate_cache(&self) {
        let mut cache = self.cache.lock();
        cache.models.clear();
        cache.fetched_at = None;
    }

    fn cached(&self) -> Option<Vec<ModelCatalogEntry>> {
        let cache = self.cache.lock();
        let fetched_at = cache.fetched_at?;
        if fetched_at.elapsed() < self.ttl && !cache.models.is_empty() {
            Some(cache.models.clone())
        } else {
            None
        }
    }

    async fn fetch_remote(&self) -> Result<Vec<ModelCatalogEntry>, CatalogError> {
        let mut request = self
            .http
            .get(&self.url)
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;
        decode_catalog(&body)
    }
}

#[async_trait]
impl CatalogFetcher for CatalogClient {
    /// Returns the cached snapshot if fresh, otherwise fetches a new one.
    async fn fetch_models(&self) -> Result<Vec<ModelCatalogEntry>, CatalogError> {
        if let Some(models) = self.cached() {
            debug!("Serving {} catalog models from cache", models.len());
            return Ok(models);
        }

        let models = self.fetch_remote().await.inspect_err(|e| {
            warn!("Catalog fetch from {} failed: {e}", self.url);
        })?;
        info!("Fetched {} catalog models from {}", models.len(), self.url);

        let mut cache = self.cache.lock();
        cache.models = models.clone();
        cache.fetched_at = Some(Instant::now());
        Ok(models)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
