//! # Campaign Pipeline
//!
//! Top-level driver: acquires the singleton guard, walks the ordered stage
//! list through the retrying launcher, optionally pauses between stages in
//! local test mode, and releases the guard no matter how the loop ends.
//! The return value is the process exit status: 0 on full success or the
//! clean "already running" short-circuit, otherwise the failing stage's
//! mapped code.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::campaign::stage::Stage;
use crate::campaign::stage_runner::StageRunner;
use crate::config::ReminderConfig;
use crate::error::Result;
use crate::mailer::MailTransport;
use crate::resilience::{RetryingLauncher, SingletonGuard, WorkUnit};
use crate::store::CampaignStore;

pub struct CampaignPipeline {
    config: Arc<ReminderConfig>,
    runner: StageRunner,
    launcher: RetryingLauncher,
}

/// One stage wrapped as a retryable unit of work.
struct StageWorkUnit<'a> {
    runner: &'a StageRunner,
    stage: &'a Stage,
}

#[async_trait]
impl WorkUnit for StageWorkUnit<'_> {
    fn name(&self) -> String {
        format!("stage-{}", self.stage.label)
    }

    async fn execute(&self) -> Result<()> {
        let outcome = self.runner.run_stage(self.stage).await?;
        info!(
            stage = %outcome.stage_label,
            candidates = outcome.candidates,
            delivered = outcome.delivered,
            previewed = outcome.previewed,
            failed = outcome.failed,
            "Stage outcome"
        );
        Ok(())
    }
}

impl CampaignPipeline {
    pub fn new(
        config: Arc<ReminderConfig>,
        store: Arc<dyn CampaignStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let launcher = RetryingLauncher::new(
            config.orchestrator.max_retries,
            config.orchestrator.backoff_seconds.clone(),
        );
        let runner = StageRunner::new(config.clone(), store, transport);
        Self {
            config,
            runner,
            launcher,
        }
    }

    /// Run the whole campaign; returns the process exit code.
    pub async fn run(&self) -> i32 {
        let guard = match SingletonGuard::acquire(&self.config.orchestrator.lock_path) {
            Ok(Some(guard)) => guard,
            Ok(None) => {
                info!("Another orchestrator instance is running, exiting cleanly");
                return 0;
            }
            Err(e) => {
                error!(error = %e, "Could not acquire singleton lock");
                return e.exit_code();
            }
        };

        let code = self.run_stages().await;

        // Unconditional: runs on success and on fatal stage failure alike.
        guard.release();
        code
    }

    async fn run_stages(&self) -> i32 {
        let orchestrator = &self.config.orchestrator;

        if orchestrator.local_test_mode {
            info!("Local test mode active, inter-stage pauses will apply");
        }

        for stage in &self.config.campaign.stages {
            // Subject lines can carry customer-facing promos; keep them
            // out of the logs like credentials.
            info!(
                stage = %stage.label,
                target_hours = stage.target_hours,
                tolerance_hours = stage.tolerance_hours,
                campaign_key = %stage.campaign_key,
                template = %stage.template_file,
                subject = "***redacted***",
                "Launching stage"
            );

            let unit = StageWorkUnit {
                runner: &self.runner,
                stage,
            };

            if let Err(e) = self.launcher.launch(&unit).await {
                error!(stage = %stage.label, error = %e, "Fatal stage failure, aborting remaining stages");
                return e.exit_code();
            }

            if orchestrator.local_test_mode {
                self.pause_after(stage).await;
            }
        }

        0
    }

    async fn pause_after(&self, stage: &Stage) {
        let minutes = self
            .config
            .orchestrator
            .test_delay_min
            .unwrap_or(stage.delay_after_min);
        if minutes == 0 {
            return;
        }

        info!(stage = %stage.label, minutes, "Pausing before next stage");
        for remaining in (1..=minutes).rev() {
            tokio::time::sleep(Duration::from_secs(60)).await;
            info!(minutes_remaining = remaining - 1, "Inter-stage pause");
        }
    }
}
