//! Client for OpenAI-compatible chat completion endpoints.

use serde::{Deserialize, Serialize};

use crate::model::traits::CompletionClient;
use crate::model::types::{ChatMessage, ModelError, Role};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const GEMINI_DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub struct OpenAiCompatClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
    provider_name: &'static str,
}

impl OpenAiCompatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>,
        provider_name: &'static str,
        default_model: &'static str,
        default_base_url: &'static str,
    ) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| default_model.to_string()),
            base_url: base_url.unwrap_or_else(|| default_base_url.to_string()),
            client: reqwest::Client::new(),
            provider_name,
        }
    }

    /// Gemini through its OpenAI-compatible endpoint.
    pub fn gemini(api_key: String, model: Option<String>) -> Self {
        Self::new(
            api_key,
            model,
            None,
            "gemini",
            GEMINI_DEFAULT_MODEL,
            GEMINI_BASE_URL,
        )
    }

    async fn run_chat(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        if self.api_key.trim().is_empty() {
            return Err(ModelError::Unauthorized(format!(
                "no {} API key configured",
                self.provider_name
            )));
        }

        let endpoint = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.model.clone(),
            messages: messages.iter().map(RequestMessage::from).collect(),
        };

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        tracing::debug!("{} API response: status={}", self.provider_name, status);

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Unauthorized(format!(
                "{} auth failed ({status}). Check API key and account access.",
                self.provider_name
            )));
        }
        if !status.is_success() {
            return Err(ModelError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            ModelError::InvalidResponse(format!("{} parse failed: {e}", self.provider_name))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ModelError::InvalidResponse(format!(
                    "missing choices[0].message.content from {} response",
                    self.provider_name
                ))
            })
    }
}

impl CompletionClient for OpenAiCompatClient {
    fn model_id(&self) -> String {
        self.model.clone()
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        self.run_chat(messages).await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<RequestMessage>,
}

#[derive(Debug, Serialize)]
struct RequestMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for RequestMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
