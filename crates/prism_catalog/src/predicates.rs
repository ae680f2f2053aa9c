//! Feature predicates: pure classifiers over a single catalog entry.

use crate::types::{Feature, ModelCatalogEntry};

/// Both prompt and completion prices are known and zero.
pub fn is_free(model: &ModelCatalogEntry) -> bool {
    model.pricing.prompt_price() == Some(0.0) && model.pricing.completion_price() == Some(0.0)
}

/// Either the prompt or the completion price is known and positive.
pub fn is_paid(model: &ModelCatalogEntry) -> bool {
    model.pricing.prompt_price().is_some_and(|p| p > 0.0)
        || model.pricing.completion_price().is_some_and(|p| p > 0.0)
}

/// More than one distinct modality across inputs and outputs.
pub fn is_multimodal(model: &ModelCatalogEntry) -> bool {
    let mut seen: Vec<String> = Vec::new();
    for modality in model.input_modalities.iter().chain(&model.output_modalities) {
        let key = modality.trim().to_lowercase();
        if !key.is_empty() && !seen.contains(&key) {
            seen.push(key);
            if seen.len() > 1 {
                return true;
            }
        }
    }
    false
}

pub fn supports_reasoning(model: &ModelCatalogEntry) -> bool {
    model
        .supported_parameters
        .iter()
        .any(|p| p.trim().eq_ignore_ascii_case("reasoning"))
}

pub fn generates_images(model: &ModelCatalogEntry) -> bool {
    model
        .output_modalities
        .iter()
        .any(|m| m.trim().eq_ignore_ascii_case("image"))
}

impl Feature {
    /// Evaluates this feature's predicate against `model`.
    pub fn matches(self, model: &ModelCatalogEntry) -> bool {
        match self {
            Feature::Multimodal => is_multimodal(model),
            Feature::Reasoning => supports_reasoning(model),
            Feature::Image => generates_images(model),
            Feature::Free => is_free(model),
            Feature::Paid => is_paid(model),
        }
    }
}
