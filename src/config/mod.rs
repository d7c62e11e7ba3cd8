//! # Configuration System
//!
//! Explicit, immutable configuration built once at process start and passed
//! by reference into each component — no component reads ambient environment
//! state. The loader layers `.env`-style key/value overrides over built-in
//! defaults and validates everything that would otherwise fail mid-run
//! (storefront URL, timezone offset, backoff table).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reminder_core::config::ReminderConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReminderConfig::from_env()?;
//! println!("batch cap: {}", config.campaign.max_batch);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::campaign::stage::Stage;
use crate::error::Result;

/// Root configuration for one orchestrator run.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Database connection and table naming
    pub database: DatabaseConfig,

    /// Outbound mail transport settings
    pub mailer: MailerConfig,

    /// Campaign content and windowing settings
    pub campaign: CampaignConfig,

    /// Pipeline-level retry, locking and test-mode settings
    pub orchestrator: OrchestratorConfig,
}

impl ReminderConfig {
    /// Build the configuration from the process environment (plus `.env`).
    pub fn from_env() -> Result<Self> {
        loader::load()
    }
}

/// Database connection and pooling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// Prefix shared by all campaign tables (e.g. `wp_`)
    pub table_prefix: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Outbound mail relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailerConfig {
    /// HTTP mail relay endpoint; required only when `send_enabled` is true
    pub endpoint: String,
    pub api_token: Option<String>,
    pub from_email: String,
    pub from_name: String,
    pub reply_to: String,
    /// Live-send toggle; false means preview mode (no dispatch, no ledger write)
    pub send_enabled: bool,
    pub timeout_seconds: u64,
}

impl MailerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Campaign content and time-window configuration
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Absolute storefront base URL, used for wishlist and product deep links
    pub base_url: String,
    pub logo_url: String,
    pub placeholder_image: String,
    /// Static local offset (e.g. `-06:00`); event timestamps are stored in
    /// this local wall-clock time
    pub local_tz_offset: String,
    /// Fixed-local-day window mode instead of sliding relative windows
    pub fixed_day_mode: bool,
    /// Hard per-run candidate cap per stage
    pub max_batch: i64,
    /// Ordered, immutable stage sequence
    pub stages: Vec<Stage>,
}

/// Pipeline-level retry, locking and test-mode configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Retries per stage beyond the first attempt
    pub max_retries: u32,
    /// Ascending backoff table in seconds, clamped at the last entry
    pub backoff_seconds: Vec<u64>,
    pub lock_path: PathBuf,
    /// When true, inter-stage pauses apply; never set in production
    pub local_test_mode: bool,
    /// Global override (minutes) for every per-stage pause
    pub test_delay_min: Option<u64>,
}
