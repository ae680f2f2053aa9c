use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use prism_catalog::{
    CatalogBrowser, CatalogError, CatalogFetcher, Feature, FetchStatus, FilterState,
    ModelCatalogEntry, Pricing, ProviderRef, Tier, TierFlags,
};
use tokio::time::{Instant, sleep};

const SEARCH_DELAY: Duration = Duration::from_millis(250);

fn model(id: &str, provider: &str, free: bool, tiers: TierFlags) -> ModelCatalogEntry {
    let price = if free { "0" } else { "0.001" };
    ModelCatalogEntry {
        id: id.into(),
        name: id.into(),
        description: String::new(),
        provider: ProviderRef {
            slug: provider.into(),
            label: provider.into(),
        },
        context_length: 8192,
        pricing: Pricing {
            prompt: Some(price.into()),
            completion: Some(price.into()),
            image: None,
        },
        input_modalities: vec!["text".into()],
        output_modalities: vec!["text".into()],
        supported_parameters: Vec::new(),
        tiers,
    }
}

fn tiers(free: bool, pro: bool, enterprise: bool) -> TierFlags {
    TierFlags {
        free,
        pro,
        enterprise,
    }
}

fn catalog() -> Vec<ModelCatalogEntry> {
    vec![
        model("llama-free", "meta", true, tiers(true, true, true)),
        model("gpt-mini", "openai", false, tiers(false, true, true)),
        model("claude-max", "anthropic", false, tiers(false, false, true)),
        model("gpt-big", "openai", false, tiers(false, false, true)),
    ]
}

fn filtered_ids(browser: &CatalogBrowser) -> Vec<String> {
    browser
        .filtered()
        .into_iter()
        .map(|m| m.entry().id.clone())
        .collect()
}

/// Serves a scripted sequence of results.
struct ScriptedFetcher {
    results: Mutex<Vec<Result<Vec<ModelCatalogEntry>, CatalogError>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(mut results: Vec<Result<Vec<ModelCatalogEntry>, CatalogError>>) -> Arc<Self> {
        results.reverse();
        Arc::new(Self {
            results: Mutex::new(results),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CatalogFetcher for ScriptedFetcher {
    async fn fetch_models(&self) -> Result<Vec<ModelCatalogEntry>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.results
            .lock()
            .pop()
            .unwrap_or_else(|| Err(CatalogError::Network("script exhausted".into())))
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_success_sets_done() {
    let fetcher = ScriptedFetcher::new(vec![Ok(catalog())]);
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);
    assert_eq!(browser.status(), FetchStatus::Idle);

    let status = browser.load(fetcher.as_ref()).await;
    assert_eq!(status, FetchStatus::Done);
    assert_eq!(browser.models().len(), 4);
    assert!(browser.error().is_none());
}

#[tokio::test]
async fn load_failure_keeps_previous_snapshot_and_retry_recovers() {
    let fetcher = ScriptedFetcher::new(vec![
        Ok(catalog()),
        Err(CatalogError::Status(503)),
        Ok(catalog()[..2].to_vec()),
    ]);
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);

    browser.load(fetcher.as_ref()).await;
    let status = browser.load(fetcher.as_ref()).await;
    assert_eq!(status, FetchStatus::Failed);
    assert!(browser.error().unwrap().contains("503"));
    assert_eq!(browser.models().len(), 4);

    let status = browser.retry(fetcher.as_ref()).await;
    assert_eq!(status, FetchStatus::Done);
    assert!(browser.error().is_none());
    assert_eq!(browser.models().len(), 2);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn available_providers_are_distinct_in_order() {
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);
    browser.set_models(catalog());
    let slugs: Vec<String> = browser
        .available_providers()
        .into_iter()
        .map(|p| p.slug)
        .collect();
    assert_eq!(slugs, ["meta", "openai", "anthropic"]);
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[test]
fn toggles_apply_synchronously() {
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);
    browser.set_models(catalog());

    assert!(browser.toggle_provider("openai"));
    assert_eq!(filtered_ids(&browser), ["gpt-mini", "gpt-big"]);

    assert!(browser.toggle_feature(Feature::Free));
    assert!(filtered_ids(&browser).is_empty());

    assert!(!browser.toggle_provider("openai"));
    assert_eq!(filtered_ids(&browser), ["llama-free"]);

    assert_eq!(browser.query_string(), "features=free");
}

#[test]
fn toggles_agree_with_filter_state() {
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);
    let mut expected = FilterState::default();

    for slug in ["openai", "a,b", "openai"] {
        assert_eq!(browser.toggle_provider(slug), expected.toggle_provider(slug));
    }
    for feature in [Feature::Reasoning, Feature::Paid, Feature::Reasoning] {
        assert_eq!(browser.toggle_feature(feature), expected.toggle_feature(feature));
    }
    assert_eq!(browser.filter_state(), expected);

    // The URL written by the browser restores the same toggles.
    let restored = CatalogBrowser::with_filters(
        FilterState::from_query_string(&browser.query_string()),
        SEARCH_DELAY,
    );
    assert_eq!(restored.filter_state(), expected);
}

#[tokio::test(start_paused = true)]
async fn search_text_is_debounced() {
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);
    browser.set_models(catalog());
    let mut updates = browser.search_updates();
    let start = Instant::now();

    browser.set_search_input("g");
    sleep(Duration::from_millis(100)).await;
    browser.set_search_input("gp");
    sleep(Duration::from_millis(100)).await;
    browser.set_search_input("gpt");

    // Typed but not yet applied.
    assert_eq!(browser.search_input(), "gpt");
    assert_eq!(filtered_ids(&browser).len(), 4);

    updates.changed().await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_millis(450));
    assert_eq!(browser.filter_state().search, "gpt");
    assert_eq!(filtered_ids(&browser), ["gpt-mini", "gpt-big"]);
}

#[tokio::test(start_paused = true)]
async fn flush_search_applies_immediately() {
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);
    browser.set_models(catalog());

    browser.set_search_input("claude");
    browser.flush_search();
    assert_eq!(filtered_ids(&browser), ["claude-max"]);
}

#[tokio::test(start_paused = true)]
async fn initial_filters_from_url_apply_at_once() {
    let initial = FilterState::from_query_string("q=gpt&features=paid");
    let mut browser = CatalogBrowser::with_filters(initial.clone(), SEARCH_DELAY);
    browser.set_models(catalog());

    assert_eq!(browser.filter_state(), initial);
    assert_eq!(filtered_ids(&browser), ["gpt-mini", "gpt-big"]);

    browser.clear_filters();
    assert!(browser.filter_state().is_empty());
    assert_eq!(browser.query_string(), "");
    assert_eq!(filtered_ids(&browser).len(), 4);
}

// ---------------------------------------------------------------------------
// Tier grouping and collapse state
// ---------------------------------------------------------------------------

#[test]
fn grouped_respects_filters() {
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);
    browser.set_models(catalog());
    browser.toggle_provider("openai");

    let groups = browser.grouped();
    assert!(groups.get(Tier::Free).is_empty());
    assert_eq!(groups.get(Tier::Pro).len(), 1);
    assert_eq!(groups.get(Tier::Enterprise).len(), 2);
}

#[test]
fn collapsing_a_tier_does_not_filter() {
    let mut browser = CatalogBrowser::new(SEARCH_DELAY);
    browser.set_models(catalog());

    assert!(browser.toggle_tier(Tier::Enterprise));
    assert!(browser.is_tier_collapsed(Tier::Enterprise));
    assert!(!browser.is_tier_collapsed(Tier::Pro));
    assert_eq!(browser.grouped().get(Tier::Enterprise).len(), 4);

    assert!(!browser.toggle_tier(Tier::Enterprise));
    assert!(!browser.is_tier_collapsed(Tier::Enterprise));
}
