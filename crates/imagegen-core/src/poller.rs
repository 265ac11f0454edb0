//! Task-handle polling loop.
//!
//! Probes the provider on a fixed cadence until a terminal outcome, the
//! attempt budget, or cancellation. Probe-level errors never abort the loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::classify::{classify_status, PollOutcome};
use crate::clock::Clock;
use crate::config::PollConfig;
use crate::obs;
use crate::provider::ProviderClient;

/// Result of one polling run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    /// Number of probes actually issued
    pub attempts: u32,
}

/// Drives status probes for a single task handle.
pub struct Poller {
    client: Arc<dyn ProviderClient>,
    clock: Arc<dyn Clock>,
    config: PollConfig,
}

impl Poller {
    pub fn new(client: Arc<dyn ProviderClient>, clock: Arc<dyn Clock>, config: PollConfig) -> Self {
        Self {
            client,
            clock,
            config,
        }
    }

    /// Poll `task_id` until terminal.
    ///
    /// Each attempt suspends for `interval` and then probes once. The token
    /// is checked at the top of every attempt and raced against the
    /// suspension; an in-flight probe always runs to completion.
    pub async fn poll(&self, task_id: &str, cancel: &CancellationToken) -> PollReport {
        let mut attempts = 0;

        while attempts < self.config.max_attempts {
            if cancel.is_cancelled() {
                return self.finish(task_id, PollOutcome::Cancelled, attempts);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return self.finish(task_id, PollOutcome::Cancelled, attempts);
                }
                _ = self.clock.sleep(self.config.interval) => {}
            }

            attempts += 1;
            match self.client.check_status(task_id).await {
                Ok(response) => {
                    if let Some(outcome) = classify_status(&response) {
                        return self.finish(task_id, outcome, attempts);
                    }
                }
                Err(e) => obs::emit_probe_failed(task_id, attempts, &e),
            }
        }

        self.finish(task_id, PollOutcome::TimedOut, attempts)
    }

    fn finish(&self, task_id: &str, outcome: PollOutcome, attempts: u32) -> PollReport {
        let label = match &outcome {
            PollOutcome::Completed { .. } => "completed",
            PollOutcome::Failed => "failed",
            PollOutcome::TimedOut => "timed_out",
            PollOutcome::Cancelled => "cancelled",
        };
        obs::emit_poll_finished(task_id, attempts, label);
        PollReport { outcome, attempts }
    }
}
