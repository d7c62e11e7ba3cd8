//! # Campaign Store
//!
//! The relational store behind the campaign: recipients, wishlist
//! contents, and the permanent sent-ledger. The core consumes it through
//! the [`CampaignStore`] trait so stage logic is testable without a
//! database; [`PgCampaignStore`] is the production implementation.

pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::Result;

pub use postgres::PgCampaignStore;

/// A recipient + wishlist pair eligible for the current stage run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct Candidate {
    pub email: String,
    pub wishlist_id: i64,
}

/// Live product content for rendering one wishlist card.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductCard {
    pub product_id: i64,
    pub title: String,
    pub image_url: Option<String>,
}

/// Store operations the orchestration core needs.
///
/// Event timestamps are stored in local wall-clock time, so the window is
/// handed over already converted to local bounds with the same static
/// offset used to compute it.
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Distinct candidate pairs whose qualifying event time lies in
    /// `[start_local, end_local]`, whose wishlist holds at least one item,
    /// and for which no sent record exists under `campaign_key`.
    ///
    /// `max_batch` is a hard cap, not a cursor; leftovers are picked up by
    /// the next scheduled run of the same stage.
    async fn find_candidates(
        &self,
        start_local: NaiveDateTime,
        end_local: NaiveDateTime,
        campaign_key: &str,
        max_batch: i64,
    ) -> Result<Vec<Candidate>>;

    /// Up to `limit` most recently added wishlist items, fetched fresh at
    /// render time.
    async fn wishlist_products(&self, wishlist_id: i64, limit: i64) -> Result<Vec<ProductCard>>;

    /// Idempotent sent-ledger upsert keyed by (email, wishlist, campaign).
    /// A retried stage may re-record a delivery whose acknowledgment was
    /// lost; the upsert makes that harmless.
    async fn record_sent(&self, email: &str, wishlist_id: i64, campaign_key: &str) -> Result<()>;
}
