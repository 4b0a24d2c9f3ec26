//! Event type and category constants.
//!
//! Single source of truth for the event names a presentation layer can
//! subscribe to. One event per orchestrator transition, in emission order.

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub const CATEGORY_TURN: &str = "turn";
pub const CATEGORY_MODEL: &str = "model";
pub const CATEGORY_TOOL: &str = "tool";
pub const CATEGORY_SESSION: &str = "session";

// ---------------------------------------------------------------------------
// Turn lifecycle
// ---------------------------------------------------------------------------

pub const EVENT_TURN_STARTED: &str = "turn.started";
pub const EVENT_TURN_COMPLETED: &str = "turn.completed";
pub const EVENT_TURN_FAILED: &str = "turn.failed";

// ---------------------------------------------------------------------------
// Model round trips
// ---------------------------------------------------------------------------

pub const EVENT_MODEL_REQUEST_STARTED: &str = "model.request_started";
pub const EVENT_MODEL_REPLY_RECEIVED: &str = "model.reply_received";

// ---------------------------------------------------------------------------
// Tool effects
// ---------------------------------------------------------------------------

pub const EVENT_TOOL_READ_STARTED: &str = "tool.read_started";
pub const EVENT_TOOL_READ_FINISHED: &str = "tool.read_finished";
pub const EVENT_TOOL_APPROVAL_REQUIRED: &str = "tool.approval_required";
pub const EVENT_TOOL_APPROVAL_RESOLVED: &str = "tool.approval_resolved";
pub const EVENT_TOOL_WRITE_APPLIED: &str = "tool.write_applied";

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

pub const EVENT_SESSION_RESET: &str = "session.reset";
