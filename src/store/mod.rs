//! Ordered conversation log.
//!
//! The store owns the persisted chat history for one workspace session.
//! Messages are append-only; `reset` replaces the whole sequence and is the
//! only other mutation. Hosts persist the log as JSON records under their
//! own key and hand it back on restore.

use crate::model::{ChatMessage, Role};

#[derive(Debug, Default, Clone)]
pub struct ConversationStore {
    messages: Vec<ChatMessage>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a log from JSON records. A record that fails to parse is kept
    /// as assistant content rather than dropped.
    pub fn from_records<S: AsRef<str>>(records: &[S]) -> Self {
        let messages = records
            .iter()
            .map(|record| {
                serde_json::from_str::<ChatMessage>(record.as_ref()).unwrap_or_else(|_| {
                    ChatMessage::new(Role::Assistant, record.as_ref())
                })
            })
            .collect();
        Self { messages }
    }

    /// JSON-encoded records, one per message, for host persistence.
    pub fn records(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|message| {
                serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string())
            })
            .collect()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }
}
