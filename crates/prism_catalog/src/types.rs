use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Catalog entries
// ---------------------------------------------------------------------------

/// The provider that serves a model, e.g. `openai` / "OpenAI".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderRef {
    pub slug: String,
    pub label: String,
}

/// Per-token prices as decimal strings (`"0.000003"`). A missing price is
/// unknown, not zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl Pricing {
    pub fn prompt_price(&self) -> Option<f64> {
        parse_price(self.prompt.as_deref())
    }

    pub fn completion_price(&self) -> Option<f64> {
        parse_price(self.completion.as_deref())
    }
}

/// Which access tiers a model is available in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierFlags {
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub pro: bool,
    #[serde(default)]
    pub enterprise: bool,
}

impl TierFlags {
    pub fn contains(&self, tier: Tier) -> bool {
        match tier {
            Tier::Free => self.free,
            Tier::Pro => self.pro,
            Tier::Enterprise => self.enterprise,
        }
    }
}

/// A model record from the catalog endpoint, after boundary validation.
/// Read-only for the lifetime of a catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalogEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub provider: ProviderRef,
    pub context_length: u32,
    pub pricing: Pricing,
    pub input_modalities: Vec<String>,
    pub output_modalities: Vec<String>,
    pub supported_parameters: Vec<String>,
    pub tiers: TierFlags,
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
    Enterprise,
}

impl Tier {
    /// Display order of tier sections.
    pub const ALL: [Tier; 3] = [Tier::Free, Tier::Pro, Tier::Enterprise];
}

// ---------------------------------------------------------------------------
// Feature predicates
// ---------------------------------------------------------------------------

/// Capability/pricing classifiers the catalog can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Multimodal,
    Reasoning,
    Image,
    Free,
    Paid,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::Multimodal,
        Feature::Reasoning,
        Feature::Image,
        Feature::Free,
        Feature::Paid,
    ];

    /// Stable key used in URLs and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Multimodal => "multimodal",
            Self::Reasoning => "reasoning",
            Self::Image => "image",
            Self::Free => "free",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feature: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| UnknownFeature(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_parsing() {
        let pricing = Pricing {
            prompt: Some("0.000003".into()),
            completion: Some(" 0 ".into()),
            image: Some("n/a".into()),
        };
        assert_eq!(pricing.prompt_price(), Some(0.000003));
        assert_eq!(pricing.completion_price(), Some(0.0));
        assert_eq!(Pricing::default().prompt_price(), None);
    }

    #[test]
    fn non_finite_price_is_unknown() {
        let pricing = Pricing {
            prompt: Some("NaN".into()),
            completion: Some("inf".into()),
            image: None,
        };
        assert_eq!(pricing.prompt_price(), None);
        assert_eq!(pricing.completion_price(), None);
    }

    #[test]
    fn feature_from_str_round_trips() {
        for feature in Feature::ALL {
            assert_eq!(feature.as_str().parse::<Feature>(), Ok(feature));
            assert_eq!(feature.to_string(), feature.as_str());
        }
        assert_eq!("REASONING".parse::<Feature>(), Ok(Feature::Reasoning));
        assert!("vision".parse::<Feature>().is_err());
    }

    #[test]
    fn tier_flags_contains() {
        let flags = TierFlags {
            free: false,
            pro: true,
            enterprise: true,
        };
        assert!(!flags.contains(Tier::Free));
        assert!(flags.contains(Tier::Pro));
        assert!(flags.contains(Tier::Enterprise));
    }
}
