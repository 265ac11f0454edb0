//! Generation orchestrator.
//!
//! One invocation walks:
//!
//! ```text
//! Validating → Creating → { Succeeded | Polling → { Succeeded | Failed | TimedOut } }
//!            → Recorded → Responding
//! ```
//!
//! with `Errored` reachable from anywhere via a panic. Whatever the path,
//! exactly one audit write is attempted before the result is returned.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use imagegen_state::{AuditId, AuditLog, AuditStatus, NewAuditRecord};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::classify::{classify_create, PollOutcome, ProviderResult};
use crate::clock::Clock;
use crate::config::PollConfig;
use crate::error::GenerationError;
use crate::identity::RequesterIdentity;
use crate::obs;
use crate::poller::Poller;
use crate::provider::ProviderClient;
use crate::recorder::AuditRecorder;

/// Orchestrator states, as reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    Validating,
    Creating,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
    Errored,
    Recorded,
    Responding,
}

impl GenerationState {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationState::Validating => "validating",
            GenerationState::Creating => "creating",
            GenerationState::Polling => "polling",
            GenerationState::Succeeded => "succeeded",
            GenerationState::Failed => "failed",
            GenerationState::TimedOut => "timed_out",
            GenerationState::Errored => "errored",
            GenerationState::Recorded => "recorded",
            GenerationState::Responding => "responding",
        }
    }
}

fn enter(state: GenerationState) {
    obs::emit_state(state.as_str());
}

/// One call to generate an image.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub requester: RequesterIdentity,
    /// `None` when the caller sent no prompt or a non-string one
    pub prompt: Option<String>,
}

impl GenerationRequest {
    pub fn new(requester: RequesterIdentity, prompt: impl Into<String>) -> Self {
        Self {
            requester,
            prompt: Some(prompt.into()),
        }
    }
}

/// A generated image.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSuccess {
    pub image_url: String,
    pub generation_time_seconds: f64,
    /// Id of the audit row, `None` if the audit write failed
    pub audit_id: Option<AuditId>,
}

fn validate_prompt(prompt: Option<&str>) -> Result<&str, GenerationError> {
    match prompt {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(GenerationError::InvalidPrompt),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: <non-string payload>".to_string()
    }
}

/// Composes provider client, classifier, poller and audit recorder.
pub struct Orchestrator {
    client: Arc<dyn ProviderClient>,
    poller: Poller,
    recorder: AuditRecorder,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn ProviderClient>,
        audit_log: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
        poll: PollConfig,
    ) -> Self {
        Self {
            poller: Poller::new(client.clone(), clock.clone(), poll),
            recorder: AuditRecorder::new(audit_log),
            client,
            clock,
        }
    }

    /// Generate without an external cancellation signal.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationSuccess, GenerationError> {
        self.generate_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Generate, aborting polling promptly once `cancel` fires.
    pub async fn generate_with_cancel(
        &self,
        request: GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationSuccess, GenerationError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = obs::span(&request_id, request.requester.as_str());

        async {
            let started = self.clock.now();
            obs::emit_generation_started(request.prompt.as_deref().map_or(0, str::len));

            let outcome = AssertUnwindSafe(self.run(&request, cancel, started))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(GenerationError::Internal {
                        detail: panic_message(payload),
                    })
                });

            match &outcome {
                Ok(_) => enter(GenerationState::Succeeded),
                Err(e) => {
                    obs::emit_state(e.terminal_state());
                    debug!(error = %e.audit_message(), "generation did not succeed");
                }
            }

            let audit_id = self.record(&request, &outcome).await;
            enter(GenerationState::Recorded);

            let status = match &outcome {
                Ok(_) => AuditStatus::Success,
                Err(e) => e.audit_status(),
            };
            obs::emit_generation_finished(
                status.as_str(),
                self.clock.now().saturating_duration_since(started),
            );
            enter(GenerationState::Responding);

            outcome.map(|success| GenerationSuccess {
                audit_id,
                ..success
            })
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<GenerationSuccess, GenerationError> {
        enter(GenerationState::Validating);
        let prompt = validate_prompt(request.prompt.as_deref())?;

        enter(GenerationState::Creating);
        let raw = self
            .client
            .create(prompt)
            .await
            .map_err(GenerationError::from_create)?;

        match classify_create(&raw) {
            ProviderResult::Immediate { image_url } => Ok(self.succeeded(image_url, started)),
            ProviderResult::Pending { task_id } => {
                obs::emit_task_pending(&task_id);
                enter(GenerationState::Polling);
                let report = self.poller.poll(&task_id, cancel).await;
                match report.outcome {
                    PollOutcome::Completed { image_url } => Ok(self.succeeded(image_url, started)),
                    PollOutcome::Failed => Err(GenerationError::GenerationFailed),
                    PollOutcome::TimedOut => Err(GenerationError::TimedOut),
                    PollOutcome::Cancelled => Err(GenerationError::Cancelled),
                }
            }
            ProviderResult::Failed { reason } => {
                debug!(reason = %reason, "provider returned nothing usable");
                Err(GenerationError::NoOutput)
            }
        }
    }

    fn succeeded(&self, image_url: String, started: Instant) -> GenerationSuccess {
        let elapsed = self.clock.now().saturating_duration_since(started);
        GenerationSuccess {
            image_url,
            generation_time_seconds: elapsed.as_secs_f64(),
            audit_id: None,
        }
    }

    /// Best-effort audit write; failures are logged and swallowed.
    async fn record(
        &self,
        request: &GenerationRequest,
        outcome: &Result<GenerationSuccess, GenerationError>,
    ) -> Option<AuditId> {
        let requester = request.requester.as_str();
        let prompt = request.prompt.as_deref();
        let entry = match outcome {
            Ok(s) => NewAuditRecord::success(
                requester,
                prompt,
                s.image_url.as_str(),
                s.generation_time_seconds,
            ),
            Err(e) => match e.audit_status() {
                AuditStatus::Failed => NewAuditRecord::failed(requester, prompt, e.audit_message()),
                _ => NewAuditRecord::error(requester, prompt, e.audit_message()),
            },
        };

        match self.recorder.record(entry).await {
            Ok(stored) => Some(stored.id),
            Err(e) => {
                obs::emit_audit_write_failed(&e);
                None
            }
        }
    }
}
