//! Workspace context gathered once per turn.

use std::path::Path;

/// Directory and file names excluded from the tree listing.
const IGNORED_ENTRIES: &[&str] = &[
    "node_modules",
    ".git",
    "target",
    "out",
    "dist",
    ".vscode",
    ".DS_Store",
    "package-lock.json",
    "yarn.lock",
];

pub const DEFAULT_TREE_DEPTH: usize = 5;
pub const DEFAULT_TREE_MAX_ENTRIES: usize = 500;

/// Indented textual listing of the workspace, traversal bounded by depth and
/// entry count. Unreadable directories are skipped; an empty or missing root
/// yields an empty string so no context section is emitted at all.
pub fn workspace_tree(root: &Path, max_depth: usize, max_entries: usize) -> String {
    let mut tree = String::from("Current workspace files:\n");
    let mut remaining = max_entries;
    let truncated = walk(root, 0, max_depth, &mut remaining, &mut tree);

    if remaining == max_entries {
        return String::new();
    }
    if truncated {
        tree.push_str("… (listing truncated)\n");
    }
    tree
}

/// Returns true when the entry budget ran out mid-walk.
fn walk(
    dir: &Path,
    depth: usize,
    max_depth: usize,
    remaining: &mut usize,
    tree: &mut String,
) -> bool {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return false;
    };

    let mut entries: Vec<_> = read_dir.filter_map(Result::ok).collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if IGNORED_ENTRIES.contains(&name.as_ref()) {
            continue;
        }

        if *remaining == 0 {
            return true;
        }
        *remaining -= 1;

        let indent = "  ".repeat(depth);
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            tree.push_str(&format!("{indent}{name}/\n"));
            if depth + 1 < max_depth && walk(&entry.path(), depth + 1, max_depth, remaining, tree) {
                return true;
            }
        } else {
            tree.push_str(&format!("{indent}{name}\n"));
        }
    }

    false
}
