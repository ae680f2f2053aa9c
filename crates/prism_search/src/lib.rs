pub mod backend;
pub mod local;
pub mod orchestrator;
pub mod state;

pub use backend::{HttpSearchBackend, SearchBackend, SearchError, decode_results};
pub use local::{matches_query, search_local};
pub use orchestrator::ConversationSearch;
pub use state::{ActiveMode, SearchMode, SearchPhase, SearchState};
