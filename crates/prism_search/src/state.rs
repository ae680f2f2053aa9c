use prism_core::Conversation;

/// Lookup strategy the user picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Substring scan over the chat store snapshot.
    #[default]
    Local,
    /// Full-text query against the search API.
    Server,
}

/// Mode as reported to the UI: `Inactive` whenever there is no query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveMode {
    #[default]
    Inactive,
    Local,
    Server,
}

impl From<SearchMode> for ActiveMode {
    fn from(mode: SearchMode) -> Self {
        match mode {
            SearchMode::Local => Self::Local,
            SearchMode::Server => Self::Server,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    /// No query.
    #[default]
    Inactive,
    /// Debounce timer pending or request in flight.
    Searching,
    /// Results or an error are present.
    Settled,
}

/// Everything the sidebar needs to render search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub mode: ActiveMode,
    pub phase: SearchPhase,
    pub results: Vec<Conversation>,
    pub loading: bool,
    /// Display-ready message from the last failed server search.
    pub error: Option<String>,
}

impl SearchState {
    pub fn is_active(&self) -> bool {
        self.phase != SearchPhase::Inactive
    }

    pub fn result_ids(&self) -> Vec<&str> {
        self.results.iter().map(|c| c.id.as_str()).collect()
    }
}
