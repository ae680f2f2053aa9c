//! Catalog browser state: the fetched snapshot plus everything the user can
//! toggle. Holds no rendering; the host reads [`CatalogBrowser::grouped`] and
//! [`CatalogBrowser::query_string`] after every change.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use prism_core::{Debounced, PrismConfig};

use crate::client::CatalogFetcher;
use crate::filter::{FilterState, IndexedModel, TierGroups, build_index, filter_models, group_by_tier};
use crate::types::{Feature, ModelCatalogEntry, ProviderRef, Tier};

/// Lifecycle of the catalog snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Done,
    Failed,
}

pub struct CatalogBrowser {
    models: Vec<IndexedModel>,
    status: FetchStatus,
    error: Option<String>,

    // Feature and provider toggles apply immediately. The search text lives
    // in `search` and is debounced; `toggles.search` stays empty.
    toggles: FilterState,
    search: Debounced<String>,

    collapsed_tiers: HashSet<Tier>,
}

impl CatalogBrowser {
    pub fn new(search_debounce: Duration) -> Self {
        Self::with_filters(FilterState::default(), search_debounce)
    }

    pub fn from_config(config: &PrismConfig) -> Self {
        Self::new(config.catalog_search_debounce())
    }

    /// Starts from a known filter state (e.g. parsed from the page URL). The
    /// initial search term is applied without waiting for the debounce.
    pub fn with_filters(mut initial: FilterState, search_debounce: Duration) -> Self {
        let search = std::mem::take(&mut initial.search);
        Self {
            models: Vec::new(),
            status: FetchStatus::Idle,
            error: None,
            toggles: initial,
            search: Debounced::new(search, search_debounce),
            collapsed_tiers: HashSet::new(),
        }
    }

    // -- Snapshot --

    /// Replaces the snapshot wholesale.
    pub fn set_models(&mut self, entries: Vec<ModelCatalogEntry>) {
        self.models = build_index(entries);
        self.status = FetchStatus::Done;
        self.error = None;
    }

    /// Fetches a snapshot. On failure the previous snapshot stays visible and
    /// [`error`](Self::error) holds a display-ready message.
    pub async fn load(&mut self, fetcher: &dyn CatalogFetcher) -> FetchStatus {
        self.status = FetchStatus::Loading;
        match fetcher.fetch_models().await {
            Ok(entries) => {
                info!("Catalog browser loaded {} models", entries.len());
                self.set_models(entries);
            }
            Err(e) => {
                warn!("Catalog browser load failed: {e}");
                self.status = FetchStatus::Failed;
                self.error = Some(e.user_message());
            }
        }
        self.status
    }

    /// Re-runs [`load`](Self::load); the retry affordance calls this.
    pub async fn retry(&mut self, fetcher: &dyn CatalogFetcher) -> FetchStatus {
        self.load(fetcher).await
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn models(&self) -> &[IndexedModel] {
        &self.models
    }

    /// Distinct providers in the snapshot, in first-seen order.
    pub fn available_providers(&self) -> Vec<ProviderRef> {
        let mut seen = HashSet::new();
        self.models
            .iter()
            .map(|m| &m.entry().provider)
            .filter(|p| seen.insert(p.slug.clone()))
            .cloned()
            .collect()
    }

    // -- Filters --

    /// Records search text; it takes effect once typing pauses.
    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.search.set(text.into());
    }

    /// The raw text in the search box.
    pub fn search_input(&self) -> &str {
        self.search.input()
    }

    /// Applies pending search text immediately (e.g. on Enter).
    pub fn flush_search(&mut self) {
        self.search.flush();
    }

    /// Fires whenever debounced search text is applied.
    pub fn search_updates(&self) -> watch::Receiver<String> {
        self.search.subscribe()
    }

    /// Flips a feature filter. Returns `true` if it is now selected.
    pub fn toggle_feature(&mut self, feature: Feature) -> bool {
        self.toggles.toggle_feature(feature)
    }

    /// Flips a provider filter. Returns `true` if it is now selected.
    pub fn toggle_provider(&mut self, slug: &str) -> bool {
        self.toggles.toggle_provider(slug)
    }

    pub fn clear_filters(&mut self) {
        self.toggles = FilterState::default();
        self.search.set_now(String::new());
    }

    /// The filters currently in effect (search as last applied).
    pub fn filter_state(&self) -> FilterState {
        FilterState {
            search: self.search.current(),
            ..self.toggles.clone()
        }
    }

    /// URL query string for the current filters.
    pub fn query_string(&self) -> String {
        self.filter_state().to_query_string()
    }

    pub fn filtered(&self) -> Vec<&IndexedModel> {
        filter_models(&self.models, &self.filter_state())
    }

    pub fn grouped(&self) -> TierGroups<'_> {
        group_by_tier(&self.filtered())
    }

    // -- Tier sections (display only, never filters) --

    /// Collapses or expands a tier section. Returns `true` if now collapsed.
    pub fn toggle_tier(&mut self, tier: Tier) -> bool {
        if !self.collapsed_tiers.remove(&tier) {
            self.collapsed_tiers.insert(tier);
            true
        } else {
            false
        }
    }

    pub fn is_tier_collapsed(&self, tier: Tier) -> bool {
        self.collapsed_tiers.contains(&tier)
    }
}
