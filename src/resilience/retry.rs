//! # Retrying Launcher
//!
//! Executes a retryable unit of work with a fixed attempt budget and an
//! ascending backoff lookup table clamped at its last entry (not
//! exponential). The unit is a capability trait so the same launcher works
//! for an in-process stage run, a spawned process, or a task.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::{ReminderError, Result};

/// A retryable unit of work; conceptually a subordinate task that can
/// fail independently of the orchestrator.
#[async_trait]
pub trait WorkUnit: Send + Sync {
    /// Name used in retry/fatal log lines
    fn name(&self) -> String;

    async fn execute(&self) -> Result<()>;
}

/// Retry wrapper: `max_retries` retries beyond the first attempt, with
/// `backoff_seconds[min(failure_number - 1, len - 1)]` seconds between
/// attempts.
#[derive(Debug, Clone)]
pub struct RetryingLauncher {
    max_retries: u32,
    backoff_seconds: Vec<u64>,
}

impl RetryingLauncher {
    pub fn new(max_retries: u32, backoff_seconds: Vec<u64>) -> Self {
        Self {
            max_retries,
            backoff_seconds,
        }
    }

    /// Drive the unit to success or exhaust the budget. The last failure
    /// is returned unchanged so its error class (and exit code) propagates
    /// to the process boundary.
    pub async fn launch(&self, unit: &dyn WorkUnit) -> Result<()> {
        let total_attempts = self.max_retries + 1;

        for attempt in 1..=total_attempts {
            match unit.execute().await {
                Ok(()) => {
                    info!(unit = %unit.name(), attempt, "Unit of work completed");
                    return Ok(());
                }
                // Configuration-class failures cannot heal by waiting.
                Err(e) if !is_retryable(&e) => {
                    error!(
                        unit = %unit.name(),
                        error = %e,
                        "Unit of work failed with a non-retryable error"
                    );
                    return Err(e);
                }
                Err(e) if attempt == total_attempts => {
                    error!(
                        unit = %unit.name(),
                        max_retries = self.max_retries,
                        error = %e,
                        "Unit of work failed after exhausting retry budget"
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        unit = %unit.name(),
                        attempt,
                        max_retries = self.max_retries,
                        retry_in_seconds = delay,
                        error = %e,
                        "Unit of work failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                }
            }
        }

        unreachable!("loop returns on the final attempt")
    }

    fn backoff_for(&self, failure_number: u32) -> u64 {
        if self.backoff_seconds.is_empty() {
            return 0;
        }
        let idx = (failure_number as usize - 1).min(self.backoff_seconds.len() - 1);
        self.backoff_seconds[idx]
    }
}

fn is_retryable(error: &ReminderError) -> bool {
    !matches!(
        error,
        ReminderError::Configuration { .. } | ReminderError::Template { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` executions, then succeeds.
    struct FlakyUnit {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyUnit {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WorkUnit for FlakyUnit {
        fn name(&self) -> String {
            "flaky".to_string()
        }

        async fn execute(&self) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Err(ReminderError::database("select", format!("boom {n}")))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn two_failures_then_success_takes_three_attempts_with_backoff() {
        let launcher = RetryingLauncher::new(2, vec![10, 30]);
        let unit = FlakyUnit::new(2);

        let started = tokio::time::Instant::now();
        launcher.launch(&unit).await.unwrap();

        assert_eq!(unit.calls(), 3);
        // Slept 10s after the first failure, 30s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_unit_is_fatal_after_budget() {
        let launcher = RetryingLauncher::new(2, vec![10, 30]);
        let unit = FlakyUnit::new(u32::MAX);

        let err = launcher.launch(&unit).await.unwrap_err();
        assert_eq!(unit.calls(), 3);
        // The underlying failure class survives for exit-code mapping.
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_clamps_at_the_last_entry() {
        let launcher = RetryingLauncher::new(4, vec![10, 30]);
        let unit = FlakyUnit::new(u32::MAX);

        let started = tokio::time::Instant::now();
        let _ = launcher.launch(&unit).await;

        assert_eq!(unit.calls(), 5);
        // 10 + 30 + 30 + 30
        assert_eq!(started.elapsed(), Duration::from_secs(100));
    }

    #[tokio::test(start_paused = true)]
    async fn configuration_failures_are_not_retried() {
        struct BrokenTemplateUnit {
            calls: AtomicU32,
        }

        #[async_trait]
        impl WorkUnit for BrokenTemplateUnit {
            fn name(&self) -> String {
                "broken-template".to_string()
            }

            async fn execute(&self) -> Result<()> {
                self.calls.fetch_add(1, Ordering::SeqCst);
                Err(ReminderError::template("missing.html", "no such file"))
            }
        }

        let launcher = RetryingLauncher::new(2, vec![10, 30]);
        let unit = BrokenTemplateUnit {
            calls: AtomicU32::new(0),
        };

        let started = tokio::time::Instant::now();
        let err = launcher.launch(&unit).await.unwrap_err();

        assert_eq!(unit.calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(0));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn first_try_success_never_sleeps() {
        let launcher = RetryingLauncher::new(2, vec![10, 30]);
        let unit = FlakyUnit::new(0);
        launcher.launch(&unit).await.unwrap();
        assert_eq!(unit.calls(), 1);
    }
}
