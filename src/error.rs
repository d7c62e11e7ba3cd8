//! # Error Types
//!
//! Crate-wide structured error handling using thiserror instead of
//! `Box<dyn Error>` patterns. Every failure carries enough context
//! (operation, recipient, stage) to reconstruct a run after the fact.

use thiserror::Error;

/// Errors surfaced by the orchestration core.
#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Database error: {operation}: {message}")]
    Database { operation: String, message: String },

    #[error("Configuration error: {key}: {message}")]
    Configuration { key: String, message: String },

    #[error("Template error: {template}: {message}")]
    Template { template: String, message: String },

    #[error("Transport error sending to {recipient}: {message}")]
    Transport { recipient: String, message: String },

    #[error("Lock error at {path}: {message}")]
    Lock { path: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReminderError {
    /// Create a database error for a named operation
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error for a named key
    pub fn configuration(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Template {
            template: template.into(),
            message: message.into(),
        }
    }

    /// Create a transport error for one recipient
    pub fn transport(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            recipient: recipient.into(),
            message: message.into(),
        }
    }

    /// Map the error class onto the process exit status.
    ///
    /// 2 = configuration/template failure (no retry), 3 = store
    /// connectivity, 1 = any other fatal condition. Success and the
    /// "already running" short-circuit exit 0 and never reach here.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } | Self::Template { .. } => 2,
            Self::Database { .. } => 3,
            Self::Transport { .. } | Self::Lock { .. } | Self::Internal(_) => 1,
        }
    }
}

impl From<sqlx::Error> for ReminderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            operation: "query".to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReminderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(
            ReminderError::configuration("WISHLIST_URL", "missing").exit_code(),
            2
        );
        assert_eq!(ReminderError::template("t.html", "not found").exit_code(), 2);
        assert_eq!(ReminderError::database("select", "down").exit_code(), 3);
        assert_eq!(ReminderError::transport("a@b.mx", "refused").exit_code(), 1);
    }
}
