//! Action result types
//!
//! Ordered, human-readable outcome messages for one request.

use crate::error::ActionError;
use crate::error::handlers::handle_error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Messages {
    entries: Vec<String>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    /// Log the error and record its message
    pub fn push_error(&mut self, err: ActionError) {
        handle_error(&err);
        self.entries.push(err.to_string());
    }

    /// Record the outcome of a single-item operation
    pub fn record(&mut self, outcome: Result<String, ActionError>) {
        match outcome {
            Ok(message) => self.push(message),
            Err(err) => self.push_error(err),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}

impl From<Messages> for Vec<String> {
    fn from(messages: Messages) -> Self {
        messages.into_vec()
    }
}
