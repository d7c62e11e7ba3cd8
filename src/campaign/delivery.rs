//! # Delivery Attempt
//!
//! Renders and dispatches one message to one candidate: fetches the
//! wishlist's live product content, builds the card grid and deep links,
//! substitutes the template, sends through the transport, and records the
//! sent-ledger entry. In preview mode both dispatch and ledger write are
//! suppressed so a run can be validated without side effects.

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use tracing::{debug, info};

use crate::campaign::stage::Stage;
use crate::config::CampaignConfig;
use crate::error::Result;
use crate::mailer::{MailTransport, OutboundMessage};
use crate::store::{CampaignStore, Candidate, ProductCard};
use crate::template::MessageTemplate;

/// Items rendered into the product grid per message.
const GRID_ITEM_LIMIT: i64 = 6;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// Transport accepted the message and the ledger entry was written
    Sent { message_id: String },
    /// Preview mode: rendered only, nothing dispatched or recorded
    Preview,
}

/// One-candidate renderer/dispatcher shared by a stage run.
pub struct DeliveryAttempt<'a> {
    store: &'a dyn CampaignStore,
    transport: &'a dyn MailTransport,
    campaign: &'a CampaignConfig,
    live_send: bool,
}

impl<'a> DeliveryAttempt<'a> {
    pub fn new(
        store: &'a dyn CampaignStore,
        transport: &'a dyn MailTransport,
        campaign: &'a CampaignConfig,
        live_send: bool,
    ) -> Self {
        Self {
            store,
            transport,
            campaign,
            live_send,
        }
    }

    /// Render and deliver to one candidate. Errors here are per-recipient:
    /// the caller logs and skips, and with no ledger entry written the
    /// candidate stays eligible for the next run.
    pub async fn deliver(
        &self,
        candidate: &Candidate,
        stage: &Stage,
        template: &MessageTemplate,
    ) -> Result<DeliveryResult> {
        let email = candidate.email.trim().to_lowercase();

        // Content is fetched fresh at render time, never cached.
        let products = self
            .store
            .wishlist_products(candidate.wishlist_id, GRID_ITEM_LIMIT)
            .await?;

        let mut values = HashMap::new();
        values.insert(
            "PRODUCTS",
            render_product_grid(&products, &self.campaign.base_url, &self.campaign.placeholder_image),
        );
        values.insert("WISHLIST_LINK", wishlist_link(&self.campaign.base_url, candidate.wishlist_id));
        values.insert("YEAR", Utc::now().year().to_string());
        values.insert("LOGO_URL", self.campaign.logo_url.clone());

        let html = template.render(&values);

        if !self.live_send {
            info!(
                recipient = %email,
                wishlist_id = candidate.wishlist_id,
                stage = %stage.label,
                "Preview mode, message rendered but not dispatched"
            );
            return Ok(DeliveryResult::Preview);
        }

        let message_id = self
            .transport
            .send(&OutboundMessage {
                to: email.clone(),
                subject: stage.subject.clone(),
                html_body: html,
            })
            .await?;

        self.store
            .record_sent(&email, candidate.wishlist_id, &stage.campaign_key)
            .await?;

        debug!(
            recipient = %email,
            wishlist_id = candidate.wishlist_id,
            stage = %stage.label,
            message_id = %message_id,
            "Delivered and recorded"
        );

        Ok(DeliveryResult::Sent { message_id })
    }
}

/// Deep link to a wishlist page.
pub fn wishlist_link(base_url: &str, wishlist_id: i64) -> String {
    format!("{}/lista-de-deseos/?wl={wishlist_id}", base_url.trim_end_matches('/'))
}

/// Deep link to a single product.
pub fn product_link(base_url: &str, product_id: i64) -> String {
    format!("{}/?post_type=product&p={product_id}", base_url.trim_end_matches('/'))
}

/// Two-column email-safe card grid for the wishlist's products. Empty
/// wishlists render as an empty string (they are never candidates anyway).
pub fn render_product_grid(products: &[ProductCard], base_url: &str, placeholder: &str) -> String {
    if products.is_empty() {
        return String::new();
    }

    let cards: Vec<String> = products
        .iter()
        .map(|p| {
            let url = product_link(base_url, p.product_id);
            let img = p.image_url.as_deref().unwrap_or(placeholder);
            format!(
                r#"<td align="left" valign="top" width="50%" style="width:50%; padding:12px;">
  <table role="presentation" cellpadding="0" cellspacing="0" border="0" width="100%" style="border:1px solid #e5e7eb; border-radius:8px;">
    <tr><td align="center" style="padding:16px 16px 8px 16px;">
      <a href="{url}" target="_blank"><img src="{img}" alt="{title}" width="240" style="display:block; width:100%; max-width:240px; height:auto; border:0;"/></a>
    </td></tr>
    <tr><td style="padding:0 16px 12px 16px; color:#111; font-size:14px;">{title}</td></tr>
    <tr><td style="padding:0 16px 16px 16px;">
      <a href="{url}" target="_blank" style="display:inline-block; padding:8px 12px; border-radius:6px; background:#111827; color:#ffffff; font-size:13px; text-decoration:none;">Ver producto</a>
    </td></tr>
  </table>
</td>"#,
                title = p.title,
            )
        })
        .collect();

    let mut rows = Vec::new();
    for pair in cards.chunks(2) {
        let left = &pair[0];
        let right = pair
            .get(1)
            .cloned()
            .unwrap_or_else(|| r#"<td width="50%" style="width:50%; padding:12px;"></td>"#.to_string());
        rows.push(format!("<tr>{left}{right}</tr>"));
    }

    format!(
        r#"<table role="presentation" cellpadding="0" cellspacing="0" border="0" width="100%">{}</table>"#,
        rows.join("")
    )
}
