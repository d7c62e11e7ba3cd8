//! # Resilience Module
//!
//! Fault-tolerance building blocks for the pipeline: retry-with-backoff
//! around a unit of work, and the single-instance lock that keeps two
//! orchestration runs from overlapping.

pub mod retry;
pub mod singleton;

pub use retry::{RetryingLauncher, WorkUnit};
pub use singleton::SingletonGuard;
