//! Sandboxed file tools available to the model.
//!
//! Two effects exist: reading a file back into the conversation and writing
//! a file after operator approval. Both resolve their paths through
//! [`PathGuard`](crate::policy::PathGuard) and refuse anything outside the
//! workspace root.

mod fs;

pub use fs::FileTools;

use crate::policy::AccessDenied;

/// Errors raised by file tool execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("access denied: {0} is outside the workspace")]
    AccessDenied(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    ReadFailure {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        source: std::io::Error,
    },
}

impl From<AccessDenied> for ToolError {
    fn from(err: AccessDenied) -> Self {
        ToolError::AccessDenied(err.path)
    }
}
