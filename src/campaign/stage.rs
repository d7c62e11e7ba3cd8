//! # Campaign Stages
//!
//! A stage is one wave of the campaign (the 24h reminder, the 48h
//! reminder, ...). Stages form an ordered, immutable sequence fixed at
//! process start; each carries its own campaign key, which scopes the
//! permanent dedup ledger.

use serde::{Deserialize, Serialize};

/// One wave of the reminder campaign.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Stage {
    /// Short label used in logs (e.g. `24`)
    pub label: String,
    /// Hours since the qualifying event this stage targets
    pub target_hours: i64,
    /// Window half-width in hours (relative mode)
    pub tolerance_hours: i64,
    /// Permanent dedup scope, unique per stage+version
    pub campaign_key: String,
    /// Path to the HTML body template
    pub template_file: String,
    /// Message subject line
    pub subject: String,
    /// Pause after this stage in minutes; only honored in local test mode
    pub delay_after_min: u64,
}

/// The built-in three-wave sequence: 24h, 48h and 72h after the qualifying
/// event, each under its own v1 campaign key.
pub fn default_stages(tolerance_hours: i64) -> Vec<Stage> {
    vec![
        Stage {
            label: "24".to_string(),
            target_hours: 24,
            tolerance_hours,
            campaign_key: "wishlist_v1_24h".to_string(),
            template_file: "templates/wishlist_email_24h.html".to_string(),
            subject: "Tu reloj favorito te espera".to_string(),
            delay_after_min: 2,
        },
        Stage {
            label: "48".to_string(),
            target_hours: 48,
            tolerance_hours,
            campaign_key: "wishlist_v1_48h".to_string(),
            template_file: "templates/wishlist_email_48h.html".to_string(),
            subject: "Aún estás a tiempo — 10% OFF termina pronto".to_string(),
            delay_after_min: 2,
        },
        Stage {
            label: "72".to_string(),
            target_hours: 72,
            tolerance_hours,
            campaign_key: "wishlist_v1_72h".to_string(),
            template_file: "templates/wishlist_email_72h.html".to_string(),
            subject: "Última oportunidad, se están agotando".to_string(),
            delay_after_min: 0,
        },
    ]
}

/// Terminal status of one stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    /// Selection completed; zero candidates still counts as success
    Success,
    /// Selection completed but some deliveries failed and were skipped
    PartialFailure,
    /// Selection itself failed (store connectivity); triggers stage retry
    HardFailure,
}

/// Aggregate result of one stage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    pub stage_label: String,
    pub campaign_key: String,
    pub candidates: usize,
    /// Messages handed to the transport (live sends only)
    pub delivered: usize,
    /// Messages rendered but not dispatched (sending disabled)
    pub previewed: usize,
    pub failed: usize,
    pub status: StageStatus,
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self.status, StageStatus::HardFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sequence_is_ordered_with_distinct_campaign_keys() {
        let stages = default_stages(6);
        assert_eq!(stages.len(), 3);
        let hours: Vec<i64> = stages.iter().map(|s| s.target_hours).collect();
        assert_eq!(hours, vec![24, 48, 72]);

        let mut keys: Vec<&str> = stages.iter().map(|s| s.campaign_key.as_str()).collect();
        keys.dedup();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn partial_failure_is_still_a_successful_stage() {
        let outcome = StageOutcome {
            stage_label: "24".to_string(),
            campaign_key: "wishlist_v1_24h".to_string(),
            candidates: 5,
            delivered: 3,
            previewed: 0,
            failed: 2,
            status: StageStatus::PartialFailure,
        };
        assert!(outcome.is_success());
    }
}
