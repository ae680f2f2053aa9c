use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types (camelCase JSON, matching the chat store and search API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    #[serde(other)]
    Other,
}

/// A single message inside a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A chat conversation as held by the chat store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawConversation")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<ConversationMessage>,
    pub last_message_timestamp: Option<DateTime<Utc>>,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_preview: Option<String>,
}

/// Wire shape with every field optional. Search responses often omit the
/// message list or the count, so both are filled in here.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConversation {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    messages: Vec<ConversationMessage>,
    #[serde(default)]
    last_message_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    message_count: Option<usize>,
    #[serde(default)]
    last_message_preview: Option<String>,
}

impl From<RawConversation> for Conversation {
    fn from(raw: RawConversation) -> Self {
        let message_count = raw.message_count.unwrap_or(raw.messages.len());
        Self {
            id: raw.id,
            title: raw.title,
            messages: raw.messages,
            last_message_timestamp: raw.last_message_timestamp,
            message_count,
            last_message_preview: raw.last_message_preview,
        }
    }
}

const PREVIEW_LEN: usize = 100;

fn make_preview(content: &str, max_len: usize) -> String {
    let trimmed = content.trim();
    if trimmed.len() <= max_len {
        trimmed.to_string()
    } else {
        let boundary = trimmed
            .char_indices()
            .take_while(|(i, c)| i + c.len_utf8() <= max_len)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(max_len);
        format!("{}...", &trimmed[..boundary])
    }
}

impl Conversation {
    /// Creates an empty conversation with a fresh UUID.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            messages: Vec::new(),
            last_message_timestamp: None,
            message_count: 0,
            last_message_preview: None,
        }
    }

    /// Fills in the sidebar preview from the last message when the source
    /// did not provide one.
    fn ensure_preview(&mut self) {
        if self.last_message_preview.is_none() {
            self.last_message_preview = self
                .messages
                .last()
                .map(|m| make_preview(&m.content, PREVIEW_LEN));
        }
    }
}

// ---------------------------------------------------------------------------
// ConversationSource
// ---------------------------------------------------------------------------

/// Read-only view of the user's conversations, newest first.
///
/// Search only ever reads a snapshot through this trait.
pub trait ConversationSource: Send + Sync {
    fn conversations(&self) -> Vec<Conversation>;
}

impl ConversationSource for Vec<Conversation> {
    fn conversations(&self) -> Vec<Conversation> {
        self.clone()
    }
}

// ---------------------------------------------------------------------------
// ChatStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreInner {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
}

/// In-memory chat store. Mutated only through its explicit actions.
#[derive(Debug, Default)]
pub struct ChatStore {
    inner: RwLock<StoreInner>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `conversations` (expected newest first).
    pub fn with_conversations(conversations: Vec<Conversation>) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                conversations,
                active_id: None,
            }),
        }
    }

    /// Inserts a conversation at the top, or replaces the one with the same ID
    /// in place.
    /// A missing preview is derived from the last message.
    pub fn upsert(&self, mut conversation: Conversation) {
        conversation.ensure_preview();
        let mut inner = self.inner.write();
        match inner
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation.id)
        {
            Some(existing) => *existing = conversation,
            None => inner.conversations.insert(0, conversation),
        }
    }

    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.inner
            .read()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub fn active_id(&self) -> Option<String> {
        self.inner.read().active_id.clone()
    }

    /// Makes `id` the active conversation. Returns `false` for unknown IDs.
    pub fn switch_to(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.conversations.iter().any(|c| c.id == id) {
            inner.active_id = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Removes a conversation. Clears the active selection if it pointed at it.
    pub fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        let before = inner.conversations.len();
        inner.conversations.retain(|c| c.id != id);
        let removed = inner.conversations.len() != before;
        if removed && inner.active_id.as_deref() == Some(id) {
            inner.active_id = None;
        }
        removed
    }

    /// Renames a conversation. Blank titles are rejected.
    pub fn rename(&self, id: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        let mut inner = self.inner.write();
        match inner.conversations.iter_mut().find(|c| c.id == id) {
            Some(conv) => {
                conv.title = title.to_string();
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&self) {
        let mut inner = self.inner.write();
        inner.conversations.clear();
        inner.active_id = None;
    }

    pub fn len(&self) -> usize {
        self.inner.read().conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConversationSource for ChatStore {
    fn conversations(&self) -> Vec<Conversation> {
        self.inner.read().conversations.clone()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
