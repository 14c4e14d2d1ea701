//! In-process conversation memory

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::types::{AnswerMode, Message, SourceRef};

/// Conversations retain only this many most-recent messages
pub const MAX_MESSAGES: usize = 20;

/// One in-session conversation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

/// Per-session message history, keyed by conversation id.
/// Conversations are created lazily on first message.
#[derive(Default)]
pub struct ConversationStore {
    conversations: DashMap<String, Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the user message for a turn, creating the conversation if needed
    pub fn append_user(&self, id: &str, content: &str) {
        let mut entry = self
            .conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation {
                id: id.to_string(),
                messages: Vec::new(),
                created_at: Utc::now(),
            });
        entry.messages.push(Message::user(content));
        trim(&mut entry.messages);
    }

    /// Append the assistant answer produced for a turn
    pub fn append_assistant(
        &self,
        id: &str,
        content: &str,
        mode: AnswerMode,
        sources: &[SourceRef],
    ) {
        let mut entry = self
            .conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation {
                id: id.to_string(),
                messages: Vec::new(),
                created_at: Utc::now(),
            });
        entry
            .messages
            .push(Message::assistant(content, mode, sources.to_vec()));
        trim(&mut entry.messages);
    }

    /// The trailing `n` messages of a conversation, oldest first
    pub fn last_n(&self, id: &str, n: usize) -> Vec<Message> {
        self.conversations
            .get(id)
            .map(|c| {
                let tail = c.messages.len().saturating_sub(n);
                c.messages[tail..].to_vec()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<Conversation> {
        self.conversations.get(id).map(|c| c.clone())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.conversations.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

fn trim(messages: &mut Vec<Message>) {
    if messages.len() > MAX_MESSAGES {
        let excess = messages.len() - MAX_MESSAGES;
        messages.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversations_are_created_lazily() {
        let store = ConversationStore::new();
        assert!(store.get("missing").is_none());
        store.append_user("conv", "hello");
        assert_eq!(store.get("conv").unwrap().messages.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn retains_only_the_most_recent_twenty() {
        let store = ConversationStore::new();
        for i in 0..30 {
            store.append_user("conv", &format!("message {}", i));
        }
        let conv = store.get("conv").unwrap();
        assert_eq!(conv.messages.len(), MAX_MESSAGES);
        assert_eq!(conv.messages[0].content, "message 10");
        assert_eq!(conv.messages.last().unwrap().content, "message 29");
    }

    #[test]
    fn last_n_returns_the_tail_in_order() {
        let store = ConversationStore::new();
        for i in 0..10 {
            store.append_user("conv", &format!("m{}", i));
        }
        let tail = store.last_n("conv", 3);
        let contents: Vec<&str> = tail.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m7", "m8", "m9"]);
        assert!(store.last_n("missing", 3).is_empty());
    }

    #[test]
    fn conversations_are_independent() {
        let store = ConversationStore::new();
        store.append_user("a", "for a");
        store.append_user("b", "for b");
        assert_eq!(store.last_n("a", 10).len(), 1);
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert_eq!(store.last_n("b", 10).len(), 1);
    }
}
