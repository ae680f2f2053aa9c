//! One-way URL sync of catalog filters (`q`, `providers`, `features`), plus
//! parsing the same keys back as initial state on load.
//!
//! Features are a closed set of comma-free names, so they share one
//! comma-joined pair. Provider slugs come from the catalog and may contain
//! anything, so each one gets its own `providers=` pair and is kept verbatim.

use url::form_urlencoded;

use crate::filter::FilterState;
use crate::types::Feature;

pub const KEY_SEARCH: &str = "q";
pub const KEY_PROVIDERS: &str = "providers";
pub const KEY_FEATURES: &str = "features";

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

impl FilterState {
    /// Serializes the state as a URL query string without the leading `?`.
    /// Empty categories are omitted, so the default state yields `""`.
    pub fn to_query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            query.append_pair(KEY_SEARCH, &self.search);
        }
        for slug in &self.providers {
            query.append_pair(KEY_PROVIDERS, slug);
        }
        if !self.features.is_empty() {
            let features: Vec<&str> = self.features.iter().map(|f| f.as_str()).collect();
            query.append_pair(KEY_FEATURES, &features.join(","));
        }
        query.finish()
    }

    /// Parses a query string (with or without a leading `?`). Unknown keys and
    /// unknown feature names are ignored.
    pub fn from_query_string(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = FilterState::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                KEY_SEARCH => state.search = value.into_owned(),
                KEY_PROVIDERS => {
                    state.providers.insert(value.into_owned());
                }
                KEY_FEATURES => {
                    state
                        .features
                        .extend(split_list(&value).filter_map(|f| f.parse::<Feature>().ok()));
                }
                _ => {}
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_empty_query() {
        assert_eq!(FilterState::default().to_query_string(), "");
        assert_eq!(FilterState::from_query_string(""), FilterState::default());
    }

    #[test]
    fn serializes_in_stable_order() {
        let mut state = FilterState {
            search: "gpt 4".into(),
            ..Default::default()
        };
        state.toggle_provider("openai");
        state.toggle_provider("anthropic");
        state.toggle_feature(Feature::Paid);
        state.toggle_feature(Feature::Multimodal);

        assert_eq!(
            state.to_query_string(),
            "q=gpt+4&providers=anthropic&providers=openai&features=multimodal%2Cpaid"
        );
    }

    #[test]
    fn round_trip_preserves_state() {
        let mut state = FilterState {
            search: "  Llama & friends ".into(),
            ..Default::default()
        };
        state.toggle_provider("meta-llama");
        state.toggle_provider("a,b");
        state.toggle_provider(" padded ");
        state.toggle_feature(Feature::Reasoning);
        state.toggle_feature(Feature::Free);

        let parsed = FilterState::from_query_string(&state.to_query_string());
        assert_eq!(parsed, state);
        assert_eq!(parsed.providers.len(), 3);
    }

    #[test]
    fn parse_tolerates_noise() {
        let state = FilterState::from_query_string(
            "?features=image,bogus,,FREE&providers=openai&providers=mistralai&page=3",
        );
        assert!(state.search.is_empty());
        assert_eq!(
            state.features.into_iter().collect::<Vec<_>>(),
            [Feature::Image, Feature::Free]
        );
        assert_eq!(
            state.providers.into_iter().collect::<Vec<_>>(),
            ["mistralai", "openai"]
        );
    }
}
