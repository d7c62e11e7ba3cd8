//! Shared fixtures: an in-memory campaign store, a recording transport,
//! and configuration builders for exercising stage runs without Postgres
//! or a mail relay.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use reminder_core::campaign::stage::Stage;
use reminder_core::config::{
    CampaignConfig, DatabaseConfig, MailerConfig, OrchestratorConfig, ReminderConfig,
};
use reminder_core::error::{ReminderError, Result};
use reminder_core::mailer::{MailTransport, OutboundMessage};
use reminder_core::store::{CampaignStore, Candidate, ProductCard};

#[derive(Debug, Clone)]
pub struct Subscriber {
    pub email: String,
    pub wishlist_id: i64,
    /// Qualifying event time in local wall-clock time, as stored
    pub created_at_local: NaiveDateTime,
}

/// In-memory stand-in for the relational store.
#[derive(Default)]
pub struct InMemoryStore {
    subscribers: Mutex<Vec<Subscriber>>,
    products: Mutex<HashMap<i64, Vec<ProductCard>>>,
    sent: Mutex<HashSet<(String, i64, String)>>,
    pub fail_selection: AtomicBool,
}

impl InMemoryStore {
    pub fn add_subscriber(&self, email: &str, wishlist_id: i64, created_at_local: NaiveDateTime) {
        self.subscribers.lock().unwrap().push(Subscriber {
            email: email.to_string(),
            wishlist_id,
            created_at_local,
        });
    }

    pub fn add_product(&self, wishlist_id: i64, product_id: i64, title: &str) {
        self.products
            .lock()
            .unwrap()
            .entry(wishlist_id)
            .or_default()
            .push(ProductCard {
                product_id,
                title: title.to_string(),
                image_url: None,
            });
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn was_sent(&self, email: &str, wishlist_id: i64, campaign_key: &str) -> bool {
        self.sent.lock().unwrap().contains(&(
            email.to_string(),
            wishlist_id,
            campaign_key.to_string(),
        ))
    }
}

#[async_trait]
impl CampaignStore for InMemoryStore {
    async fn find_candidates(
        &self,
        start_local: NaiveDateTime,
        end_local: NaiveDateTime,
        campaign_key: &str,
        max_batch: i64,
    ) -> Result<Vec<Candidate>> {
        if self.fail_selection.load(Ordering::SeqCst) {
            return Err(ReminderError::database("find_candidates", "store down"));
        }

        let sent = self.sent.lock().unwrap();
        let products = self.products.lock().unwrap();

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for sub in self.subscribers.lock().unwrap().iter() {
            if sub.created_at_local < start_local || sub.created_at_local > end_local {
                continue;
            }
            if products.get(&sub.wishlist_id).map_or(true, Vec::is_empty) {
                continue;
            }
            // The ledger holds normalized addresses; compare the stored
            // address the same way, like the SQL selection does.
            let email = sub.email.trim().to_lowercase();
            let key = (email.clone(), sub.wishlist_id, campaign_key.to_string());
            if sent.contains(&key) {
                continue;
            }
            if !seen.insert((email.clone(), sub.wishlist_id)) {
                continue;
            }
            out.push(Candidate {
                email,
                wishlist_id: sub.wishlist_id,
            });
            if out.len() as i64 >= max_batch {
                break;
            }
        }
        Ok(out)
    }

    async fn wishlist_products(&self, wishlist_id: i64, limit: i64) -> Result<Vec<ProductCard>> {
        let products = self.products.lock().unwrap();
        Ok(products
            .get(&wishlist_id)
            .map(|v| v.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn record_sent(&self, email: &str, wishlist_id: i64, campaign_key: &str) -> Result<()> {
        self.sent.lock().unwrap().insert((
            email.trim().to_lowercase(),
            wishlist_id,
            campaign_key.to_string(),
        ));
        Ok(())
    }
}

/// Transport fake that records accepted messages and can be told to
/// reject specific recipients.
#[derive(Default)]
pub struct RecordingTransport {
    pub accepted: Mutex<Vec<OutboundMessage>>,
    pub reject: Mutex<HashSet<String>>,
}

impl RecordingTransport {
    pub fn reject_recipient(&self, email: &str) {
        self.reject.lock().unwrap().insert(email.to_string());
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<String> {
        if self.reject.lock().unwrap().contains(&message.to) {
            return Err(ReminderError::transport(&message.to, "rejected by relay"));
        }
        let mut accepted = self.accepted.lock().unwrap();
        accepted.push(message.clone());
        Ok(format!("msg-{}", accepted.len()))
    }
}

/// Single-stage configuration over a template file on disk. Offset +00:00
/// keeps local and UTC timestamps identical in fixtures.
pub fn test_config(stage: Stage, live_send: bool, lock_path: &Path) -> ReminderConfig {
    ReminderConfig {
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            table_prefix: "wp_".to_string(),
            max_connections: 1,
            connect_timeout_seconds: 1,
        },
        mailer: MailerConfig {
            endpoint: "https://relay.example/send".to_string(),
            api_token: None,
            from_email: "no-reply@shop.example".to_string(),
            from_name: "Shop".to_string(),
            reply_to: "no-reply@shop.example".to_string(),
            send_enabled: live_send,
            timeout_seconds: 5,
        },
        campaign: CampaignConfig {
            base_url: "https://shop.example".to_string(),
            logo_url: "https://shop.example/logo.png".to_string(),
            placeholder_image: "https://shop.example/ph.png".to_string(),
            local_tz_offset: "+00:00".to_string(),
            fixed_day_mode: false,
            max_batch: 300,
            stages: vec![stage],
        },
        orchestrator: OrchestratorConfig {
            max_retries: 0,
            backoff_seconds: vec![0],
            lock_path: lock_path.to_path_buf(),
            local_test_mode: false,
            test_delay_min: None,
        },
    }
}

/// A 24h stage pointing at `template_file`.
pub fn stage_24h(template_file: &Path) -> Stage {
    Stage {
        label: "24".to_string(),
        target_hours: 24,
        tolerance_hours: 6,
        campaign_key: "wishlist_v1_24h".to_string(),
        template_file: template_file.display().to_string(),
        subject: "Tu reloj favorito te espera".to_string(),
        delay_after_min: 0,
    }
}

/// Write a minimal HTML template into `dir` and return its path.
pub fn write_template(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("stage.html");
    std::fs::write(
        &path,
        "<html><body>{{PRODUCTS}}<a href=\"{{WISHLIST_LINK}}\">wl</a> {{YEAR}}</body></html>",
    )
    .unwrap();
    path
}
