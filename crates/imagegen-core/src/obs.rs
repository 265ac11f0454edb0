//! Structured observability hooks for generation invocations.
//!
//! This module provides:
//! - An invocation-scoped tracing span, attached with `Instrument`
//! - Emission functions for lifecycle events: start, state change, probe
//!   failure, audit failure, finish
//!
//! Events are emitted at `info!` level unless noted (filter with `RUST_LOG`).

use std::time::Duration;

use tracing::{info, warn};

/// Span for one generation invocation, for use with `Instrument`.
pub fn span(request_id: &str, requester: &str) -> tracing::Span {
    tracing::info_span!("imagegen.generate", request_id = %request_id, requester = %requester)
}

/// Emit event: generation started.
pub fn emit_generation_started(prompt_len: usize) {
    info!(event = "generation.started", prompt_len = prompt_len);
}

/// Emit event: orchestrator entered a new state.
pub fn emit_state(state: &str) {
    info!(event = "generation.state", state = %state);
}

/// Emit event: provider accepted the job asynchronously.
pub fn emit_task_pending(task_id: &str) {
    info!(event = "generation.pending", task_id = %task_id);
}

/// Emit event: a single status probe failed; polling continues (warning level).
pub fn emit_probe_failed(task_id: &str, attempt: u32, error: &dyn std::fmt::Display) {
    warn!(event = "poll.probe_failed", task_id = %task_id, attempt = attempt, error = %error);
}

/// Emit event: polling finished.
pub fn emit_poll_finished(task_id: &str, attempts: u32, outcome: &str) {
    info!(event = "poll.finished", task_id = %task_id, attempts = attempts, outcome = %outcome);
}

/// Emit event: audit write failed and was swallowed (warning level).
pub fn emit_audit_write_failed(error: &dyn std::fmt::Display) {
    warn!(event = "audit.write_failed", error = %error);
}

/// Emit event: generation finished with its audit status and duration.
pub fn emit_generation_finished(status: &str, elapsed: Duration) {
    info!(
        event = "generation.finished",
        status = %status,
        elapsed_ms = elapsed.as_millis() as u64,
    );
}
