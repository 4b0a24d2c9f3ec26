//! Traits for model clients.

use crate::model::types::{ChatMessage, ModelError};

/// Core trait for chat completion backends. The orchestrator only ever sees
/// this surface; the transport behind it is opaque.
#[allow(async_fn_in_trait)]
pub trait CompletionClient: Send + Sync {
    fn model_id(&self) -> String;

    /// Send the full ordered message set and return the assistant's reply
    /// text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError>;
}
