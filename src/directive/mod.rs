//! Parsing of model replies into structured tool requests.
//!
//! A reply requests at most one tool action. Detection runs in strict
//! priority order (write, then read, then command), and only the first
//! occurrence of the winning directive counts; everything else in the reply
//! is plain prose as far as the tool loop is concerned.

mod parser;

pub use parser::{code_blocks, parse_reply, ToolRequest};
