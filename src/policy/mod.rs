//! Workspace path containment.
//!
//! Every file path the model supplies is resolved against a single workspace
//! root before any filesystem access happens. The check is lexical: the
//! candidate is joined to the root, `.` and `..` components are folded away
//! without touching the filesystem, and the result must still have the root
//! as a prefix. Symlinks are not resolved, so a link inside the workspace
//! can still point outside it; this is a minimum bar, not a full sandbox.

use std::path::{Component, Path, PathBuf};

/// A path that resolves (lexically) outside the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("access denied: {path} is outside the workspace")]
pub struct AccessDenied {
    pub path: String,
}

/// Resolves workspace-relative paths and rejects escapes.
#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a workspace-relative path to an absolute one, failing closed
    /// when the candidate escapes the root via `..` segments or an absolute
    /// override.
    pub fn resolve(&self, candidate: &str) -> Result<PathBuf, AccessDenied> {
        let resolved = normalize(&self.root.join(candidate));
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(AccessDenied {
                path: candidate.to_string(),
            })
        }
    }
}

/// Fold `.` and `..` components without consulting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests;
