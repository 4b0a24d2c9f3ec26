//! Turn orchestration: the request/parse/tool cycle behind each prompt.
//!
//! A turn moves `Idle → AwaitingModel` and then, per reply, either ends
//! (plain answer), passes through `AwaitingToolResult` (file read injected
//! back into the outgoing message set, model resumed), or parks in
//! `AwaitingApproval` (file write held for the operator). Every transition
//! is published on the event bus, in order, for whatever surface is
//! watching.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use crate::bus::event_types::{
    CATEGORY_MODEL, CATEGORY_SESSION, CATEGORY_TOOL, CATEGORY_TURN, EVENT_MODEL_REPLY_RECEIVED,
    EVENT_MODEL_REQUEST_STARTED, EVENT_SESSION_RESET, EVENT_TOOL_APPROVAL_REQUIRED,
    EVENT_TOOL_APPROVAL_RESOLVED, EVENT_TOOL_READ_FINISHED, EVENT_TOOL_READ_STARTED,
    EVENT_TOOL_WRITE_APPLIED, EVENT_TURN_COMPLETED, EVENT_TURN_FAILED, EVENT_TURN_STARTED,
};
use crate::bus::{BusEvent, EventBus};
use crate::directive::{self, ToolRequest};
use crate::model::shared::{assistant_system_prompt, compose_user_message, CONTINUATION_PROMPT};
use crate::model::{ChatMessage, CompletionClient, ModelError, Role};
use crate::policy::PathGuard;
use crate::runtime::approval::ApprovalGate;
use crate::runtime::context::{workspace_tree, DEFAULT_TREE_DEPTH, DEFAULT_TREE_MAX_ENTRIES};
use crate::store::ConversationStore;
use crate::tools::{FileTools, ToolError};

pub const DEFAULT_MAX_TOOL_HOPS: usize = 5;
const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(120);

/// Where the current turn is suspended, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Idle,
    AwaitingModel,
    AwaitingToolResult,
    AwaitingApproval,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hard cap on file-read round trips within one turn.
    pub max_tool_hops: usize,
    /// Bound on each individual model call.
    pub model_timeout: Duration,
    /// Bound on the operator approval wait; `None` waits indefinitely.
    pub approval_timeout: Option<Duration>,
    pub tree_depth: usize,
    pub tree_max_entries: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_tool_hops: DEFAULT_MAX_TOOL_HOPS,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
            approval_timeout: None,
            tree_depth: DEFAULT_TREE_DEPTH,
            tree_max_entries: DEFAULT_TREE_MAX_ENTRIES,
        }
    }
}

/// How a completed turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Final natural-language answer. `inline_suggestion` carries the first
    /// fenced code block when no tool request fired.
    Answer {
        reply: String,
        inline_suggestion: Option<String>,
    },
    /// A proposed write was approved and applied.
    WriteApplied { path: String },
    /// A proposed write was rejected; nothing was persisted.
    WriteRejected { path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("a turn is already in flight")]
    Busy,
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("tool-call limit of {0} read hops exceeded")]
    RecursionLimitExceeded(usize),
    #[error(transparent)]
    Write(#[from] ToolError),
}

/// Drives one workspace session: owns the conversation log, the file tools,
/// and the approval gate, and runs one turn at a time.
pub struct Orchestrator<C: CompletionClient> {
    client: C,
    tools: FileTools,
    store: Mutex<ConversationStore>,
    approvals: ApprovalGate,
    bus: Arc<EventBus>,
    config: SessionConfig,
    state: Arc<Mutex<TurnState>>,
}

/// Restores `Idle` even when the turn future is dropped mid-await.
struct TurnGuard {
    state: Arc<Mutex<TurnState>>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        *self.state.lock().expect("turn state mutex poisoned") = TurnState::Idle;
    }
}

impl<C: CompletionClient> Orchestrator<C> {
    pub fn new(client: C, workspace_root: impl Into<PathBuf>, bus: Arc<EventBus>) -> Self {
        Self::with_config(client, workspace_root, bus, SessionConfig::default())
    }

    pub fn with_config(
        client: C,
        workspace_root: impl Into<PathBuf>,
        bus: Arc<EventBus>,
        config: SessionConfig,
    ) -> Self {
        Self {
            client,
            tools: FileTools::new(PathGuard::new(workspace_root)),
            store: Mutex::new(ConversationStore::new()),
            approvals: ApprovalGate::default(),
            bus,
            config,
            state: Arc::new(Mutex::new(TurnState::Idle)),
        }
    }

    pub fn state(&self) -> TurnState {
        *self.state.lock().expect("turn state mutex poisoned")
    }

    /// Handle for the surface that lists and resolves pending writes.
    pub fn approvals(&self) -> ApprovalGate {
        self.approvals.clone()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<BusEvent> {
        self.bus.subscribe()
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.store
            .lock()
            .expect("store mutex poisoned")
            .messages()
            .to_vec()
    }

    /// JSON records of the log, for host persistence.
    pub fn history_records(&self) -> Vec<String> {
        self.store.lock().expect("store mutex poisoned").records()
    }

    /// Replace the log with a previously persisted one. Refused mid-turn.
    pub fn load_history<S: AsRef<str>>(&self, records: &[S]) -> Result<(), TurnError> {
        if self.state() != TurnState::Idle {
            return Err(TurnError::Busy);
        }
        *self.store.lock().expect("store mutex poisoned") =
            ConversationStore::from_records(records);
        Ok(())
    }

    /// Start a fresh chat: reject any pending writes and clear the log.
    pub fn reset(&self) {
        self.approvals.reject_all();
        self.store.lock().expect("store mutex poisoned").reset();
        self.bus
            .emit(CATEGORY_SESSION, EVENT_SESSION_RESET, None, json!({}));
    }

    /// Run one user turn to its terminal point: a final answer, an applied
    /// or rejected write, or a failure. `editor_context` carries the active
    /// selection (or whole document) supplied by the host. Rejected with
    /// [`TurnError::Busy`] while another turn is in flight.
    pub async fn send(&self, prompt: &str, editor_context: &str) -> Result<TurnOutcome, TurnError> {
        let _guard = self.enter_turn()?;
        let turn_id = Uuid::new_v4().to_string();

        self.bus.emit(
            CATEGORY_TURN,
            EVENT_TURN_STARTED,
            Some(turn_id.clone()),
            json!({ "prompt": prompt }),
        );

        let result = self.run_turn(&turn_id, prompt, editor_context).await;

        match &result {
            Ok(outcome) => {
                self.bus.emit(
                    CATEGORY_TURN,
                    EVENT_TURN_COMPLETED,
                    Some(turn_id),
                    json!({ "outcome": outcome_label(outcome) }),
                );
            }
            Err(err) => {
                self.bus.emit(
                    CATEGORY_TURN,
                    EVENT_TURN_FAILED,
                    Some(turn_id),
                    json!({ "error": err.to_string() }),
                );
            }
        }

        result
    }

    fn enter_turn(&self) -> Result<TurnGuard, TurnError> {
        let mut state = self.state.lock().expect("turn state mutex poisoned");
        if *state != TurnState::Idle {
            return Err(TurnError::Busy);
        }
        *state = TurnState::AwaitingModel;
        Ok(TurnGuard {
            state: Arc::clone(&self.state),
        })
    }

    fn set_state(&self, next: TurnState) {
        *self.state.lock().expect("turn state mutex poisoned") = next;
    }

    async fn run_turn(
        &self,
        turn_id: &str,
        prompt: &str,
        editor_context: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let tree = workspace_tree(
            self.tools.root(),
            self.config.tree_depth,
            self.config.tree_max_entries,
        );

        // Snapshot the log before this prompt; tool hops extend the snapshot
        // without touching the persisted log.
        let mut outgoing: Vec<ChatMessage> = {
            let mut store = self.store.lock().expect("store mutex poisoned");
            let snapshot = store.messages().to_vec();
            store.push(Role::User, prompt);
            snapshot
        };

        let mut user_message = compose_user_message(prompt, editor_context, &tree);
        let mut hops = 0;

        loop {
            let reply = self.call_model(turn_id, &outgoing, &user_message).await?;

            match directive::parse_reply(&reply) {
                None => {
                    let inline_suggestion = directive::code_blocks(&reply)
                        .into_iter()
                        .next()
                        .map(|block| block.trim().to_string())
                        .filter(|block| !block.is_empty());

                    self.store
                        .lock()
                        .expect("store mutex poisoned")
                        .push(Role::Assistant, reply.as_str());
                    return Ok(TurnOutcome::Answer {
                        reply,
                        inline_suggestion,
                    });
                }
                Some(ToolRequest::RunCommand { command }) => {
                    // Recognized but inert; the reply stands as the answer
                    // and the suggestion channel stays quiet.
                    tracing::debug!(command = %command, "ignoring command directive");
                    self.store
                        .lock()
                        .expect("store mutex poisoned")
                        .push(Role::Assistant, reply.as_str());
                    return Ok(TurnOutcome::Answer {
                        reply,
                        inline_suggestion: None,
                    });
                }
                Some(ToolRequest::ReadFile { path }) => {
                    if hops == self.config.max_tool_hops {
                        return Err(TurnError::RecursionLimitExceeded(hops));
                    }
                    hops += 1;

                    self.set_state(TurnState::AwaitingToolResult);
                    self.bus.emit(
                        CATEGORY_TOOL,
                        EVENT_TOOL_READ_STARTED,
                        Some(turn_id.to_string()),
                        json!({ "path": path, "hop": hops }),
                    );

                    let observation = self.tools.read_observation(&path);

                    self.bus.emit(
                        CATEGORY_TOOL,
                        EVENT_TOOL_READ_FINISHED,
                        Some(turn_id.to_string()),
                        json!({ "path": path, "chars": observation.len() }),
                    );

                    outgoing.push(ChatMessage::new(Role::Assistant, reply));
                    outgoing.push(ChatMessage::new(Role::System, observation));
                    user_message = CONTINUATION_PROMPT.to_string();
                }
                Some(ToolRequest::WriteFile { path, content }) => {
                    return self.await_write_approval(turn_id, path, content).await;
                }
            }
        }
    }

    async fn call_model(
        &self,
        turn_id: &str,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<String, ModelError> {
        self.set_state(TurnState::AwaitingModel);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::new(Role::System, assistant_system_prompt()));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::new(Role::User, user_message));

        self.bus.emit(
            CATEGORY_MODEL,
            EVENT_MODEL_REQUEST_STARTED,
            Some(turn_id.to_string()),
            json!({ "model": self.client.model_id(), "messages": messages.len() }),
        );

        let completion = self.client.complete(&messages);
        let reply = match tokio::time::timeout(self.config.model_timeout, completion).await {
            Ok(result) => result?,
            Err(_) => return Err(ModelError::Timeout(self.config.model_timeout)),
        };

        tracing::debug!(chars = reply.len(), "model reply received");
        self.bus.emit(
            CATEGORY_MODEL,
            EVENT_MODEL_REPLY_RECEIVED,
            Some(turn_id.to_string()),
            json!({ "chars": reply.len() }),
        );

        Ok(reply)
    }

    async fn await_write_approval(
        &self,
        turn_id: &str,
        path: String,
        content: String,
    ) -> Result<TurnOutcome, TurnError> {
        self.set_state(TurnState::AwaitingApproval);

        let (request, receiver) = self.approvals.request(&path, &content);
        self.bus.emit(
            CATEGORY_TOOL,
            EVENT_TOOL_APPROVAL_REQUIRED,
            Some(turn_id.to_string()),
            json!({ "approval_id": request.id, "path": path, "content": content }),
        );

        let approved = match self.config.approval_timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(Ok(value)) => value,
                _ => false,
            },
            None => receiver.await.unwrap_or(false),
        };

        if !approved {
            // A timed-out request may still sit in the gate; drop it so a
            // late resolution cannot fire into a finished turn.
            let _ = self.approvals.resolve(&request.id, false);
        }

        self.bus.emit(
            CATEGORY_TOOL,
            EVENT_TOOL_APPROVAL_RESOLVED,
            Some(turn_id.to_string()),
            json!({ "approval_id": request.id, "approved": approved }),
        );

        if !approved {
            return Ok(TurnOutcome::WriteRejected { path });
        }

        self.tools.write(&path, &content)?;
        self.bus.emit(
            CATEGORY_TOOL,
            EVENT_TOOL_WRITE_APPLIED,
            Some(turn_id.to_string()),
            json!({ "path": path }),
        );
        self.store
            .lock()
            .expect("store mutex poisoned")
            .push(Role::Assistant, format!("File written: {path}"));

        Ok(TurnOutcome::WriteApplied { path })
    }
}

fn outcome_label(outcome: &TurnOutcome) -> &'static str {
    match outcome {
        TurnOutcome::Answer { .. } => "answer",
        TurnOutcome::WriteApplied { .. } => "write_applied",
        TurnOutcome::WriteRejected { .. } => "write_rejected",
    }
}
