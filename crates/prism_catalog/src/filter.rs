//! Catalog filter engine and tier grouping.
//!
//! Filtering is a pure, total function of the snapshot and a [`FilterState`]:
//! it never mutates the source and always preserves source order.

use std::collections::BTreeSet;

use crate::types::{Feature, ModelCatalogEntry, Tier};

// ---------------------------------------------------------------------------
// Search index
// ---------------------------------------------------------------------------

/// A catalog entry paired with its precomputed, lower-cased search text
/// (name, id, description and provider label).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedModel {
    entry: ModelCatalogEntry,
    search_index: String,
}

impl IndexedModel {
    pub fn new(entry: ModelCatalogEntry) -> Self {
        let search_index = [
            entry.name.as_str(),
            entry.id.as_str(),
            entry.description.as_str(),
            entry.provider.label.as_str(),
        ]
        .join(" ")
        .to_lowercase();
        Self {
            entry,
            search_index,
        }
    }

    pub fn entry(&self) -> &ModelCatalogEntry {
        &self.entry
    }

    pub fn search_index(&self) -> &str {
        &self.search_index
    }

    /// `term_lower` must already be trimmed and lower-cased.
    fn matches_term(&self, term_lower: &str) -> bool {
        term_lower.is_empty() || self.search_index.contains(term_lower)
    }
}

/// Indexes a freshly fetched snapshot, keeping source order.
pub fn build_index(entries: Vec<ModelCatalogEntry>) -> Vec<IndexedModel> {
    entries.into_iter().map(IndexedModel::new).collect()
}

// ---------------------------------------------------------------------------
// FilterState
// ---------------------------------------------------------------------------

/// The active catalog filters. Categories combine with AND; an empty category
/// imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub features: BTreeSet<Feature>,
    pub providers: BTreeSet<String>,
}

impl FilterState {
    /// `true` when no filter is active.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.features.is_empty() && self.providers.is_empty()
    }

    /// Flips `feature`. Returns `true` if it is now selected.
    pub fn toggle_feature(&mut self, feature: Feature) -> bool {
        if !self.features.remove(&feature) {
            self.features.insert(feature);
            true
        } else {
            false
        }
    }

    /// Flips `slug`. Returns `true` if it is now selected.
    pub fn toggle_provider(&mut self, slug: &str) -> bool {
        if !self.providers.remove(slug) {
            self.providers.insert(slug.to_string());
            true
        } else {
            false
        }
    }

    /// Evaluates every active filter against one model.
    pub fn matches(&self, model: &IndexedModel) -> bool {
        let term = self.search.trim().to_lowercase();
        self.matches_with_term(model, &term)
    }

    fn matches_with_term(&self, model: &IndexedModel, term_lower: &str) -> bool {
        let entry = model.entry();
        self.features.iter().all(|f| f.matches(entry))
            && (self.providers.is_empty() || self.providers.contains(&entry.provider.slug))
            && model.matches_term(term_lower)
    }
}

/// Returns the models that satisfy `state`, in source order.
pub fn filter_models<'a, I>(models: I, state: &FilterState) -> Vec<&'a IndexedModel>
where
    I: IntoIterator<Item = &'a IndexedModel>,
{
    let term = state.search.trim().to_lowercase();
    models
        .into_iter()
        .filter(|m| state.matches_with_term(m, &term))
        .collect()
}

// ---------------------------------------------------------------------------
// Tier grouping
// ---------------------------------------------------------------------------

/// Filtered models partitioned by tier. A model available in several tiers
/// appears in each of their groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierGroups<'a> {
    pub free: Vec<&'a IndexedModel>,
    pub pro: Vec<&'a IndexedModel>,
    pub enterprise: Vec<&'a IndexedModel>,
}

impl<'a> TierGroups<'a> {
    pub fn get(&self, tier: Tier) -> &[&'a IndexedModel] {
        match tier {
            Tier::Free => &self.free,
            Tier::Pro => &self.pro,
            Tier::Enterprise => &self.enterprise,
        }
    }

    /// Groups in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &[&'a IndexedModel])> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty() && self.pro.is_empty() && self.enterprise.is_empty()
    }
}

pub fn group_by_tier<'a>(models: &[&'a IndexedModel]) -> TierGroups<'a> {
    let mut groups = TierGroups::default();
    for &model in models {
        let tiers = model.entry().tiers;
        if tiers.free {
            groups.free.push(model);
        }
        if tiers.pro {
            groups.pro.push(model);
        }
        if tiers.enterprise {
            groups.enterprise.push(model);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Pricing, ProviderRef, TierFlags};

    fn entry(id: &str, provider: &str, description: &str) -> ModelCatalogEntry {
        ModelCatalogEntry {
            id: id.into(),
            name: id.to_uppercase(),
            description: description.into(),
            provider: ProviderRef {
                slug: provider.into(),
                label: format!("{provider} Inc"),
            },
            context_length: 8192,
            pricing: Pricing::default(),
            input_modalities: vec!["text".into()],
            output_modalities: vec!["text".into()],
            supported_parameters: Vec::new(),
            tiers: TierFlags::default(),
        }
    }

    fn ids<'a>(group: &[&'a IndexedModel]) -> Vec<&'a str> {
        group.iter().map(|m| m.entry().id.as_str()).collect()
    }

    #[test]
    fn search_index_is_lower_cased_concatenation() {
        let m = IndexedModel::new(entry("gpt-4o", "openai", "Flagship Model"));
        assert_eq!(m.search_index(), "gpt-4o gpt-4o flagship model openai inc");
    }

    #[test]
    fn search_matches_any_indexed_field() {
        let models = build_index(vec![
            entry("a", "openai", "Fast"),
            entry("b", "anthropic", "Careful"),
        ]);
        let mut state = FilterState {
            search: "careFUL".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_models(&models, &state)), ["b"]);

        // Provider label is indexed, slug only via label text.
        state.search = "openai inc".into();
        assert_eq!(filter_models(&models, &state).len(), 1);
    }

    #[test]
    fn whitespace_search_is_ignored() {
        let models = build_index(vec![entry("a", "x", ""), entry("b", "y", "")]);
        let state = FilterState {
            search: "   ".into(),
            ..Default::default()
        };
        assert!(state.is_empty());
        assert_eq!(filter_models(&models, &state).len(), 2);
    }

    #[test]
    fn toggles_report_new_state() {
        let mut state = FilterState::default();
        assert!(state.toggle_feature(Feature::Free));
        assert!(!state.toggle_feature(Feature::Free));
        assert!(state.features.is_empty());

        assert!(state.toggle_provider("openai"));
        assert!(!state.toggle_provider("openai"));
        assert!(state.providers.is_empty());
    }

    #[test]
    fn matches_agrees_with_filter_models() {
        let models = build_index(vec![entry("a", "x", "alpha"), entry("b", "y", "beta")]);
        let state = FilterState {
            search: "ALPHA".into(),
            ..Default::default()
        };
        assert!(state.matches(&models[0]));
        assert!(!state.matches(&models[1]));
    }

    #[test]
    fn grouping_allows_multiple_tiers_and_keeps_order() {
        let mut a = entry("a", "x", "");
        a.tiers = TierFlags {
            free: true,
            pro: true,
            enterprise: true,
        };
        let mut b = entry("b", "x", "");
        b.tiers.pro = true;
        let c = entry("c", "x", "");
        let mut d = entry("d", "x", "");
        d.tiers.pro = true;
        d.tiers.enterprise = true;

        let models = build_index(vec![a, b, c, d]);
        let filtered = filter_models(&models, &FilterState::default());
        let groups = group_by_tier(&filtered);

        assert_eq!(ids(groups.get(Tier::Free)), ["a"]);
        assert_eq!(ids(groups.get(Tier::Pro)), ["a", "b", "d"]);
        assert_eq!(ids(groups.get(Tier::Enterprise)), ["a", "d"]);

        let order: Vec<Tier> = groups.iter().map(|(t, _)| t).collect();
        assert_eq!(order, Tier::ALL);
    }

    #[test]
    fn empty_groups() {
        let groups = group_by_tier(&[]);
        assert!(groups.is_empty());
    }
}
