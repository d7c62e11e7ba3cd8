//! # Stage Runner
//!
//! Drives one stage to completion: computes the window, selects candidates,
//! attempts delivery for each in sequence, and reports the aggregate
//! outcome. Only selection failure (store connectivity) is a hard failure
//! that bubbles out for stage-level retry; per-recipient render or dispatch
//! failures are logged and skipped in-line, leaving the candidate eligible
//! on the next run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::campaign::delivery::{DeliveryAttempt, DeliveryResult};
use crate::campaign::stage::{Stage, StageOutcome, StageStatus};
use crate::campaign::window::{compute_window, parse_tz_offset};
use crate::config::ReminderConfig;
use crate::error::Result;
use crate::mailer::MailTransport;
use crate::store::CampaignStore;
use crate::template::MessageTemplate;

pub struct StageRunner {
    config: Arc<ReminderConfig>,
    store: Arc<dyn CampaignStore>,
    transport: Arc<dyn MailTransport>,
}

impl StageRunner {
    pub fn new(
        config: Arc<ReminderConfig>,
        store: Arc<dyn CampaignStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
        }
    }

    /// Run one stage against the current clock.
    pub async fn run_stage(&self, stage: &Stage) -> Result<StageOutcome> {
        self.run_stage_at(stage, Utc::now()).await
    }

    /// Run one stage against an explicit `now` (injectable for tests).
    pub async fn run_stage_at(&self, stage: &Stage, now: DateTime<Utc>) -> Result<StageOutcome> {
        let campaign = &self.config.campaign;

        let window = compute_window(
            now,
            stage.target_hours,
            stage.tolerance_hours,
            campaign.fixed_day_mode,
            &campaign.local_tz_offset,
        )?;

        info!(
            stage = %stage.label,
            campaign_key = %stage.campaign_key,
            mode = ?window.mode,
            window_start = %window.start,
            window_end = %window.end,
            "Computed stage window"
        );

        // Template problems are configuration-class: fatal, not retried.
        let template = MessageTemplate::load(&stage.template_file).await?;

        // Event timestamps are stored in local wall-clock time; compare in
        // local space using the same static offset as the window.
        let offset = parse_tz_offset(&campaign.local_tz_offset)?;
        let (start_local, end_local) = window.local_bounds(offset);

        let candidates = self
            .store
            .find_candidates(start_local, end_local, &stage.campaign_key, campaign.max_batch)
            .await?;

        if candidates.is_empty() {
            info!(stage = %stage.label, "No recipients in this stage's window");
            return Ok(StageOutcome {
                stage_label: stage.label.clone(),
                campaign_key: stage.campaign_key.clone(),
                candidates: 0,
                delivered: 0,
                previewed: 0,
                failed: 0,
                status: StageStatus::Success,
            });
        }

        let attempt = DeliveryAttempt::new(
            self.store.as_ref(),
            self.transport.as_ref(),
            campaign,
            self.config.mailer.send_enabled,
        );

        let mut delivered = 0usize;
        let mut previewed = 0usize;
        let mut failed = 0usize;

        for candidate in &candidates {
            match attempt.deliver(candidate, stage, &template).await {
                Ok(DeliveryResult::Sent { .. }) => delivered += 1,
                Ok(DeliveryResult::Preview) => previewed += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        stage = %stage.label,
                        recipient = %candidate.email,
                        wishlist_id = candidate.wishlist_id,
                        error = %e,
                        "Delivery failed, skipping recipient"
                    );
                }
            }
        }

        let status = if failed > 0 {
            StageStatus::PartialFailure
        } else {
            StageStatus::Success
        };

        info!(
            stage = %stage.label,
            candidates = candidates.len(),
            delivered,
            previewed,
            failed,
            status = ?status,
            "Stage run complete"
        );

        Ok(StageOutcome {
            stage_label: stage.label.clone(),
            campaign_key: stage.campaign_key.clone(),
            candidates: candidates.len(),
            delivered,
            previewed,
            failed,
            status,
        })
    }
}
