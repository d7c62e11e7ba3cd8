//! HTTP mail relay transport: posts the rendered message as JSON and
//! expects the relay to answer with the assigned message id.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::MailerConfig;
use crate::error::{ReminderError, Result};
use crate::mailer::{MailTransport, OutboundMessage};

#[derive(Debug, Deserialize)]
struct RelayResponse {
    message_id: String,
}

/// Transport over an HTTP mail relay endpoint.
#[derive(Debug, Clone)]
pub struct HttpMailTransport {
    client: reqwest::Client,
    config: MailerConfig,
}

impl HttpMailTransport {
    pub fn new(config: MailerConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(ReminderError::configuration(
                "MAIL_ENDPOINT",
                "live sending enabled but no relay endpoint configured",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ReminderError::Internal(format!("building http client: {e}")))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<String> {
        let payload = json!({
            "from": {
                "email": self.config.from_email,
                "name": self.config.from_name,
            },
            "reply_to": self.config.reply_to,
            "to": message.to,
            "subject": message.subject,
            "html": message.html_body,
        });

        let mut request = self.client.post(&self.config.endpoint).json(&payload);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReminderError::transport(&message.to, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReminderError::transport(
                &message.to,
                format!("relay returned {status}: {body}"),
            ));
        }

        let relay: RelayResponse = response
            .json()
            .await
            .map_err(|e| ReminderError::transport(&message.to, format!("bad relay response: {e}")))?;

        debug!(to = %message.to, message_id = %relay.message_id, "Relay accepted message");
        Ok(relay.message_id)
    }
}
