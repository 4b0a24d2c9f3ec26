//! Assistant loop with sandboxed file tools.
//!
//! Turns a user prompt plus local file context into a multi-step
//! conversation with a language model. The model can ask to read files
//! inside a single workspace root (the result is fed straight back to it)
//! or to write one (held until a human operator approves); anything else is
//! a final answer.
//!
//! # Architecture
//!
//! - `runtime`: turn orchestration, write approvals, workspace context
//! - `directive`: parsing model replies into tool requests
//! - `tools`: file read/write under the path guard
//! - `policy`: workspace path containment
//! - `model`: message types, prompts, and LLM API clients
//! - `store`: ordered conversation log
//! - `bus`: ordered event stream for presentation layers

pub mod bus;
pub mod directive;
pub mod model;
pub mod policy;
pub mod runtime;
pub mod store;
pub mod tools;

#[cfg(test)]
mod tests;

pub use bus::{BusEvent, EventBus};
pub use directive::ToolRequest;
pub use model::{ChatMessage, CompletionClient, ModelError, OpenAiCompatClient, Role};
pub use policy::PathGuard;
pub use runtime::approval::{ApprovalGate, WriteApprovalRequest};
pub use runtime::orchestrator::{Orchestrator, SessionConfig, TurnError, TurnOutcome, TurnState};
pub use store::ConversationStore;

/// Initialize tracing output for hosts that don't install their own
/// subscriber.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sidekick=debug,info".parse().expect("valid env filter")),
        )
        .init();
}
