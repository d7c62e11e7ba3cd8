//! Campaign orchestrator entry point.
//!
//! Exit status: 0 on full success or the clean "already running"
//! short-circuit, 2 on configuration/template failure, 3 when the store is
//! unreachable, 1 on any other fatal condition.

use std::sync::Arc;

use tracing::{error, info};

use reminder_core::campaign::CampaignPipeline;
use reminder_core::config::ReminderConfig;
use reminder_core::logging::init_structured_logging;
use reminder_core::mailer::{HttpMailTransport, MailTransport, OutboundMessage};
use reminder_core::store::PgCampaignStore;
use reminder_core::Result;

#[tokio::main]
async fn main() {
    init_structured_logging();
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let config = match ReminderConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, "Configuration failure");
            return e.exit_code();
        }
    };

    info!(
        stages = config.campaign.stages.len(),
        max_batch = config.campaign.max_batch,
        live_send = config.mailer.send_enabled,
        fixed_day_mode = config.campaign.fixed_day_mode,
        test_mode = config.orchestrator.local_test_mode,
        "Starting campaign orchestrator"
    );

    let store = match PgCampaignStore::connect(&config.database).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "Campaign store unreachable");
            return e.exit_code();
        }
    };

    let transport: Arc<dyn MailTransport> = if config.mailer.send_enabled {
        match HttpMailTransport::new(config.mailer.clone()) {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                error!(error = %e, "Transport setup failed");
                return e.exit_code();
            }
        }
    } else {
        // Preview mode never dispatches; the delivery path short-circuits
        // before the transport, so this stand-in is never called.
        Arc::new(NullTransport)
    };

    let pipeline = CampaignPipeline::new(config, store, transport);
    let code = pipeline.run().await;
    info!(exit_code = code, "Campaign orchestrator finished");
    code
}

struct NullTransport;

#[async_trait::async_trait]
impl MailTransport for NullTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<String> {
        Err(reminder_core::ReminderError::transport(
            &message.to,
            "live sending is disabled (SEND_EMAILS=false)",
        ))
    }
}
