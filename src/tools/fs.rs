//! File read/write under the workspace path guard.

use std::path::Path;

use crate::policy::PathGuard;
use crate::tools::ToolError;

pub struct FileTools {
    guard: PathGuard,
}

impl FileTools {
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }

    /// Read a workspace file as UTF-8 text.
    pub fn read(&self, path: &str) -> Result<String, ToolError> {
        let full = self.guard.resolve(path)?;
        if !full.exists() {
            return Err(ToolError::NotFound(path.to_string()));
        }
        std::fs::read_to_string(&full).map_err(|source| ToolError::ReadFailure {
            path: path.to_string(),
            source,
        })
    }

    /// Render a read as the system note injected back into the conversation.
    /// Failures become explanatory text instead of hard errors so the model
    /// can correct itself on the next hop.
    pub fn read_observation(&self, path: &str) -> String {
        match self.read(path) {
            Ok(content) => {
                let mut note = format!("[SYSTEM] Content of {path}:\n```\n{content}");
                if !note.ends_with('\n') {
                    note.push('\n');
                }
                note.push_str("```");
                note
            }
            Err(err) => {
                tracing::debug!(path, %err, "file read failed");
                format!("[SYSTEM] Error reading {path}: {err}")
            }
        }
    }

    /// Write a workspace file, creating parent directories as needed and
    /// replacing any existing content. Approval-agnostic: callers gate the
    /// invocation, the executor only enforces the path boundary.
    pub fn write(&self, path: &str, content: &str) -> Result<(), ToolError> {
        let full = self.guard.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ToolError::WriteFailure {
                path: path.to_string(),
                source,
            })?;
        }
        std::fs::write(&full, content).map_err(|source| ToolError::WriteFailure {
            path: path.to_string(),
            source,
        })
    }
}
