//! # Campaign Orchestration
//!
//! The orchestration core: window arithmetic, stage definitions, the
//! per-stage runner, per-candidate delivery, and the top-level pipeline.
//!
//! Flow per run: [`pipeline::CampaignPipeline`] acquires the singleton
//! guard, then per stage hands a [`stage_runner::StageRunner`] execution to
//! the retrying launcher; the runner computes the window, selects
//! candidates from the store, and delivers sequentially.

pub mod delivery;
pub mod pipeline;
pub mod stage;
pub mod stage_runner;
pub mod window;

pub use delivery::{DeliveryAttempt, DeliveryResult};
pub use pipeline::CampaignPipeline;
pub use stage::{Stage, StageOutcome, StageStatus};
pub use stage_runner::StageRunner;
pub use window::{CampaignWindow, WindowMode};
