pub mod config;
pub mod conversations;
pub mod debounce;
pub mod logging;

pub use config::{PrismConfig, SearchTiming};
pub use conversations::{
    ChatStore, Conversation, ConversationMessage, ConversationSource, MessageRole,
};
pub use debounce::{Debounced, Debouncer};
