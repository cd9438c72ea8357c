//! Filesystem actions
//!
//! Request types, the per-action handlers and their result messages.

pub mod commands;
pub mod handlers;
pub mod results;

pub use commands::{ActionKind, ActionRequest, EntryKind, UnknownAction, UploadedFile};
pub use handlers::{ActionContext, ActionHandler, handle_action, handler_for};
pub use results::Messages;
