//! # Message Templates
//!
//! Minimal key/value substitution over a file-loaded HTML body. Both
//! `{{KEY}}` and `${KEY}` placeholder syntaxes are honored; there are no
//! conditionals or loops.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{ReminderError, Result};

/// A loaded message body template.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    source: String,
    body: String,
}

impl MessageTemplate {
    /// Load a template from disk. A missing or unreadable file is a
    /// configuration-class failure (exit code 2), not a retryable one.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ReminderError::template(path.display().to_string(), e.to_string()))?;

        Ok(Self {
            source: path.display().to_string(),
            body,
        })
    }

    /// Build a template from an in-memory body.
    pub fn from_body(source: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            body: body.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute every `{{KEY}}` / `${KEY}` occurrence. Unknown
    /// placeholders are left in place.
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        let mut html = self.body.clone();
        for (key, value) in values {
            html = html.replace(&format!("{{{{{key}}}}}"), value);
            html = html.replace(&format!("${{{key}}}"), value);
        }
        html
    }
}
