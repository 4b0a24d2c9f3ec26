//! Prompt text shared by every provider.
//!
//! The tool directive protocol lives here: the system prompt is the contract
//! that tells the model how to ask for file access, and the continuation
//! prompt resumes it after a read result is injected.

/// Fixed prompt used to resume the model after a file read.
pub const CONTINUATION_PROMPT: &str = "Continue based on the file content.";

/// System prompt documenting the tool directive protocol to the model.
pub fn assistant_system_prompt() -> &'static str {
    r#"You are a helpful coding assistant that edits and improves code.
You have access to the following tools:

1. READ_FILE: <path>
   - Use this to read the content of a file when you need more context.
   - Example: READ_FILE: src/utils.rs

2. WRITE_FILE: <path>
   - Use this to create or update a file.
   - Follow this line immediately with a code block containing the new content.
   - Example:
     WRITE_FILE: src/utils.rs
     ```rust
     pub fn add(a: i32, b: i32) -> i32 { a + b }
     ```

If you need to read a file, output ONLY the READ_FILE command.
If you need to write a file, output the WRITE_FILE command and the code block.
Otherwise, just answer the user's question."#
}

/// Compose the outgoing user message for a top-level turn: the prompt, the
/// editor context (selection or whole document), and the workspace tree.
pub fn compose_user_message(prompt: &str, editor_context: &str, workspace_tree: &str) -> String {
    let mut message = prompt.to_string();

    if !editor_context.is_empty() {
        message.push_str("\n\nThe following is the relevant code context:\n```\n");
        message.push_str(editor_context);
        message.push_str("\n```");
    }

    if !workspace_tree.is_empty() {
        message.push_str("\n\n");
        message.push_str(workspace_tree);
    }

    message.push_str("\n\nPlease respond with an improved or modified version as appropriate.");
    message
}
