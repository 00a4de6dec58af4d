//! Diagnostic messages and the diagnostics-carrying result type
//!
//! Every analysis step reports through a [`Messenger`]: a value (or a failure) together with
//! the messages produced while computing it. Chaining steps concatenates their messages in
//! order, so a late failure never discards earlier warnings.

mod messenger;

pub use messenger::{Messenger, MessengerList};

use derive_more::Display;
use qss_span::{Location, Range};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source tag attached to every message
pub const SOURCE: &str = "qss";

/// How serious a message is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
pub enum Severity {
    /// The code is invalid
    #[display("error")]
    Error,
    /// The code is valid but probably wrong
    #[display("warning")]
    Warning,
    /// Informational message
    #[display("info")]
    Information,
    /// A hint, usually rendered subtly by editors
    #[display("hint")]
    Hint,
}

/// A cross-reference attached to a message, e.g. "previously defined here"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedInformation {
    /// Where the related code is
    pub location: Location,
    /// What the related code has to do with the message
    pub message: String,
}

/// A single diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Range in the analyzed script the message applies to
    pub range: Range,
    /// Severity level
    pub severity: Severity,
    /// Human-readable text
    pub message: String,
    /// Tool that produced the message
    pub source: String,
    /// Cross-references to other code
    pub related: Vec<RelatedInformation>,
}

impl Message {
    /// Create a message with no related information
    #[must_use]
    pub fn new(range: Range, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            range,
            severity,
            message: message.into(),
            source: SOURCE.to_string(),
            related: Vec::new(),
        }
    }

    /// Create an error message
    #[must_use]
    pub fn error(range: Range, message: impl Into<String>) -> Self {
        Self::new(range, Severity::Error, message)
    }

    /// Create a warning message
    #[must_use]
    pub fn warning(range: Range, message: impl Into<String>) -> Self {
        Self::new(range, Severity::Warning, message)
    }

    /// Attach a related-information entry
    #[must_use]
    pub fn with_related(mut self, location: Location, message: impl Into<String>) -> Self {
        self.related.push(RelatedInformation {
            location,
            message: message.into(),
        });
        self
    }

    /// Whether this message is an error
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Message {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {}: {}", self.severity, self.range, self.message)?;
        for related in &self.related {
            write!(formatter, "\n  note {}: {}", related.location, related.message)?;
        }
        Ok(())
    }
}

/// Render messages one per line, for logs and snapshot tests
#[must_use]
pub fn render(messages: &[Message]) -> String {
    messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
