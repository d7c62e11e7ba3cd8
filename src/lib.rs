#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Reminder Core
//!
//! Orchestration core for a multi-stage, time-windowed wishlist reminder
//! campaign: each delay stage (24h/48h/72h after the qualifying event)
//! selects recipients whose event time falls in a stage-specific window,
//! guarantees at most one message per (recipient, wishlist, campaign key)
//! ever, renders the message from live wishlist content, and dispatches it
//! through an external transport.
//!
//! ## Architecture
//!
//! - [`campaign`] — window arithmetic, stages, per-stage runner, delivery,
//!   and the top-level pipeline
//! - [`resilience`] — retry-with-backoff launcher and the singleton lock
//! - [`store`] — campaign store trait + Postgres implementation (candidate
//!   selection and the permanent sent-ledger)
//! - [`mailer`] — outbound transport trait + HTTP relay implementation
//! - [`template`] — minimal `{{KEY}}` / `${KEY}` body substitution
//! - [`config`] — immutable startup configuration from env overrides
//! - [`error`] — structured error handling with exit-code mapping
//! - [`logging`] — console + JSON file tracing setup
//!
//! ## Delivery guarantees
//!
//! Exactly-once per (recipient, wishlist, campaign key) comes from the
//! durable sent-ledger: candidate selection anti-joins it, and the ledger
//! write is an idempotent upsert, so crashes and stage retries can at worst
//! re-attempt a recipient whose acknowledgment was lost — never re-select
//! one whose record landed. Windows themselves slide (relative mode), so
//! infrequent runs can miss recipients entirely; that gap is accepted and
//! documented, not silently patched.

pub mod campaign;
pub mod config;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod resilience;
pub mod store;
pub mod template;

pub use campaign::{
    CampaignPipeline, CampaignWindow, DeliveryResult, Stage, StageOutcome, StageRunner,
    StageStatus, WindowMode,
};
pub use config::ReminderConfig;
pub use error::{ReminderError, Result};
pub use mailer::{HttpMailTransport, MailTransport, OutboundMessage};
pub use resilience::{RetryingLauncher, SingletonGuard, WorkUnit};
pub use store::{CampaignStore, Candidate, PgCampaignStore, ProductCard};
pub use template::MessageTemplate;
