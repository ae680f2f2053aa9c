pub mod browser;
pub mod client;
pub mod filter;
pub mod predicates;
pub mod query;
pub mod types;

pub use browser::{CatalogBrowser, FetchStatus};
pub use client::{CatalogClient, CatalogError, CatalogFetcher, decode_catalog};
pub use filter::{FilterState, IndexedModel, TierGroups, build_index, filter_models, group_by_tier};
pub use types::*;
