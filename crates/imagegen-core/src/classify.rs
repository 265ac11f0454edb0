//! Outcome classification for provider responses.
//!
//! Both functions are pure: the same raw response always maps to the same
//! result.

use serde::{Deserialize, Serialize};

use crate::provider::{RawCreateResponse, RawStatusResponse};

/// Provider status marking a finished job.
pub const STATUS_COMPLETED: &str = "completed";
/// Provider status marking a failed job.
pub const STATUS_FAILED: &str = "failed";

/// Classified result of a creation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderResult {
    /// Output available right away
    Immediate { image_url: String },
    /// Job accepted; poll the task handle
    Pending { task_id: String },
    /// Nothing usable came back
    Failed { reason: String },
}

/// Terminal result of the polling loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollOutcome {
    Completed { image_url: String },
    Failed,
    TimedOut,
    /// Cancellation was observed before a terminal state
    Cancelled,
}

impl PollOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PollOutcome::Completed { .. })
    }
}

/// Classify a creation response.
///
/// Outputs take precedence over a task id; neither yields `Failed`.
pub fn classify_create(response: &RawCreateResponse) -> ProviderResult {
    if let Some(first) = response.outputs().first() {
        return ProviderResult::Immediate {
            image_url: first.clone(),
        };
    }
    if let Some(task_id) = response.task_id() {
        return ProviderResult::Pending {
            task_id: task_id.to_string(),
        };
    }
    ProviderResult::Failed {
        reason: "no output or task id present".to_string(),
    }
}

/// Classify a status probe. `None` means not yet terminal.
///
/// A `completed` status without outputs is deliberately non-terminal:
/// there is nothing to return yet, so polling continues.
pub fn classify_status(response: &RawStatusResponse) -> Option<PollOutcome> {
    match response.status() {
        Some(STATUS_COMPLETED) => response
            .outputs()
            .first()
            .map(|url| PollOutcome::Completed {
                image_url: url.clone(),
            }),
        Some(STATUS_FAILED) => Some(PollOutcome::Failed),
        _ => None,
    }
}
