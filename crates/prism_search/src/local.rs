//! In-memory conversation lookup.

use prism_core::Conversation;

/// Case-insensitive match against the title, message content and preview.
/// `query_lower` must already be trimmed and lower-cased.
pub fn matches_query(conversation: &Conversation, query_lower: &str) -> bool {
    // Short-circuit: title first, then stop at the first matching message.
    conversation.title.to_lowercase().contains(query_lower)
        || conversation
            .messages
            .iter()
            .any(|m| m.content.to_lowercase().contains(query_lower))
        || conversation
            .last_message_preview
            .as_deref()
            .is_some_and(|p| p.to_lowercase().contains(query_lower))
}

/// Returns the conversations matching `query`, in source order. A blank query
/// matches everything.
pub fn search_local(conversations: &[Conversation], query: &str) -> Vec<Conversation> {
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() {
        return conversations.to_vec();
    }
    conversations
        .iter()
        .filter(|c| matches_query(c, &query_lower))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::{ConversationMessage, MessageRole};

    fn conv(id: &str, title: &str, content: &str, preview: Option<&str>) -> Conversation {
        Conversation {
            id: id.into(),
            title: title.into(),
            messages: vec![ConversationMessage::new(MessageRole::User, content)],
            last_message_timestamp: None,
            message_count: 1,
            last_message_preview: preview.map(String::from),
        }
    }

    fn ids(results: &[Conversation]) -> Vec<&str> {
        results.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn matches_title_content_and_preview() {
        let convs = vec![
            conv("1", "Rust Programming", "How do I use cargo?", None),
            conv("2", "Cooking Tips", "Best pasta recipe?", None),
            conv("3", "More cooking", "Tell me about RUST safety", None),
            conv("4", "Untitled", "hi", Some("rustacean greetings")),
        ];
        assert_eq!(ids(&search_local(&convs, "rust")), ["1", "3", "4"]);
        assert_eq!(ids(&search_local(&convs, "PASTA")), ["2"]);
        assert!(search_local(&convs, "nonexistent").is_empty());
    }

    #[test]
    fn blank_query_returns_everything() {
        let convs = vec![conv("1", "a", "b", None), conv("2", "c", "d", None)];
        assert_eq!(search_local(&convs, "  ").len(), 2);
    }

    #[test]
    fn query_is_trimmed() {
        let convs = vec![conv("1", "Deploy notes", "", None)];
        assert_eq!(ids(&search_local(&convs, "  deploy ")), ["1"]);
    }

    #[test]
    fn source_is_not_mutated() {
        let convs = vec![conv("1", "a", "b", None)];
        let before = convs.clone();
        let _ = search_local(&convs, "a");
        assert_eq!(convs, before);
    }
}
