//! Postgres implementation of [`CampaignStore`] against the storefront
//! schema (configurable table prefix). Table names are interpolated from
//! config, so queries use runtime-checked `query_as` with bound values.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{ReminderError, Result};
use crate::store::{CampaignStore, Candidate, ProductCard};

/// Campaign store backed by the storefront's Postgres database.
#[derive(Debug, Clone)]
pub struct PgCampaignStore {
    pool: PgPool,
    table_prefix: String,
}

impl PgCampaignStore {
    /// Connect a pool using the database configuration. Connectivity
    /// failure here is the store-unreachable case (exit code 3).
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| ReminderError::database("connect", e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            table_prefix = %config.table_prefix,
            "Connected campaign store pool"
        );

        Ok(Self {
            pool,
            table_prefix: config.table_prefix.clone(),
        })
    }

    /// Wrap an existing pool (tests, shared pools).
    pub fn with_pool(pool: PgPool, table_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            table_prefix: table_prefix.into(),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }
}

#[async_trait]
impl CampaignStore for PgCampaignStore {
    async fn find_candidates(
        &self,
        start_local: NaiveDateTime,
        end_local: NaiveDateTime,
        campaign_key: &str,
        max_batch: i64,
    ) -> Result<Vec<Candidate>> {
        // Anti-join on the ledger enforces the permanent per-campaign-key
        // block; the items join drops empty wishlists. The ledger stores
        // normalized addresses, so the stored address is normalized the
        // same way before comparing (Postgres TEXT equality is
        // case-sensitive, unlike the MySQL collation this schema grew in).
        let sql = format!(
            r"
            SELECT DISTINCT LOWER(TRIM(e.email)) AS email, wl.id AS wishlist_id
            FROM {emails} e
            JOIN {lists} wl ON wl.id = e.wishlist_id
            JOIN {items} it ON it.wishlist_id = wl.id
            LEFT JOIN {log} sent
              ON  sent.email        = LOWER(TRIM(e.email))
              AND sent.wishlist_id  = wl.id
              AND sent.campaign_key = $1
            WHERE e.created_at BETWEEN $2 AND $3
              AND sent.wishlist_id IS NULL
            LIMIT $4
            ",
            emails = self.table("wishlist_guest_emails"),
            lists = self.table("tinvwl_lists"),
            items = self.table("tinvwl_items"),
            log = self.table("wishlist_email_log"),
        );

        let candidates = sqlx::query_as::<_, Candidate>(&sql)
            .bind(campaign_key)
            .bind(start_local)
            .bind(end_local)
            .bind(max_batch)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ReminderError::database("find_candidates", e.to_string()))?;

        debug!(
            campaign_key = campaign_key,
            count = candidates.len(),
            "Selected candidates in window"
        );

        Ok(candidates)
    }

    async fn wishlist_products(&self, wishlist_id: i64, limit: i64) -> Result<Vec<ProductCard>> {
        // Thumbnail ids live in postmeta as text; the CASE keeps the cast
        // off non-numeric values.
        let sql = format!(
            r"
            SELECT it.product_id,
                   COALESCE(p.post_title, 'Producto ' || it.product_id) AS title,
                   img.guid AS image_url
            FROM {items} it
            LEFT JOIN {posts} p ON p.id = it.product_id
            LEFT JOIN {postmeta} pm
              ON pm.post_id = it.product_id AND pm.meta_key = '_thumbnail_id'
            LEFT JOIN {posts} img
              ON img.id = CASE WHEN pm.meta_value ~ '^[0-9]+$'
                               THEN pm.meta_value::bigint END
            WHERE it.wishlist_id = $1
            ORDER BY it.id DESC
            LIMIT $2
            ",
            items = self.table("tinvwl_items"),
            posts = self.table("posts"),
            postmeta = self.table("postmeta"),
        );

        sqlx::query_as::<_, ProductCard>(&sql)
            .bind(wishlist_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ReminderError::database("wishlist_products", e.to_string()))
    }

    async fn record_sent(&self, email: &str, wishlist_id: i64, campaign_key: &str) -> Result<()> {
        let sql = format!(
            r"
            INSERT INTO {log} (email, wishlist_id, campaign_key, sent_at)
            VALUES ($1, $2, $3, NOW() AT TIME ZONE 'utc')
            ON CONFLICT (email, wishlist_id, campaign_key)
            DO UPDATE SET sent_at = EXCLUDED.sent_at
            ",
            log = self.table("wishlist_email_log"),
        );

        sqlx::query(&sql)
            .bind(email.trim().to_lowercase())
            .bind(wishlist_id)
            .bind(campaign_key)
            .execute(&self.pool)
            .await
            .map_err(|e| ReminderError::database("record_sent", e.to_string()))?;

        Ok(())
    }
}
