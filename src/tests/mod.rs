//! Test helpers and end-to-end scenario tests for the orchestration loop.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use crate::model::{ChatMessage, CompletionClient, ModelError};



#[cfg(test)]
mod scenarios;

/// Create a temp directory serving as a throwaway workspace root.
pub fn temp_workspace() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Completion double that replays scripted results in order and captures
/// every outgoing message set. Clones share the same script and captures.
#[derive(Clone)]
pub struct ScriptedClient {
    replies: Arc<Mutex<VecDeque<Result<String, ModelError>>>>,
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedClient {
    pub fn new(replies: &[&str]) -> Self {
        Self::from_results(replies.iter().map(|reply| Ok(reply.to_string())).collect())
    }

    pub fn from_results(replies: Vec<Result<String, ModelError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Message sets captured from each `complete` call so far.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl CompletionClient for ScriptedClient {
    fn model_id(&self) -> String {
        "scripted".to_string()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(messages.to_vec());
        self.replies
            .lock()
            .expect("replies mutex poisoned")
            .pop_front()
            .expect("no scripted reply left")
    }
}
