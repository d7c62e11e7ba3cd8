//! # Outbound Mail Transport
//!
//! The delivery channel is an external collaborator; the core only needs
//! `send(recipient, subject, body) -> delivery id`. [`HttpMailTransport`]
//! posts to an HTTP relay; tests substitute recording fakes.

pub mod http;

use async_trait::async_trait;

use crate::error::Result;

pub use http::HttpMailTransport;

/// One outbound message, fully rendered.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Transport capability: dispatch one message and report the
/// channel-assigned delivery id on confirmed acceptance.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<String>;
}
