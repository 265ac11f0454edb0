//! Caller-facing error taxonomy for generation invocations.

use imagegen_state::AuditStatus;

use crate::provider::ProviderError;

/// Why a generation invocation did not produce an image.
///
/// `Display` is the message safe to show callers. Internal detail is kept
/// in separate fields and only reaches logs and the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("Prompt is required")]
    InvalidPrompt,

    /// Provider rejected the creation call with a non-2xx status
    #[error("API error: {status} - {body}")]
    Provider { status: u16, body: String },

    /// Creation call never got a response
    #[error("Provider request failed")]
    ProviderUnavailable { detail: String },

    /// Creation response was not a valid envelope
    #[error("Invalid API response")]
    InvalidProviderResponse { detail: String },

    /// Provider returned neither outputs nor a task handle
    #[error("Failed to generate image - no output received")]
    NoOutput,

    /// Provider reported the job as failed while polling
    #[error("Image generation failed")]
    GenerationFailed,

    #[error("Image generation timed out")]
    TimedOut,

    #[error("Image generation cancelled")]
    Cancelled,

    /// Unexpected crash inside the orchestrator
    #[error("Internal server error")]
    Internal { detail: String },
}

impl GenerationError {
    /// Map a creation-call failure.
    pub fn from_create(err: ProviderError) -> Self {
        match err {
            ProviderError::Status { status, body } => GenerationError::Provider { status, body },
            ProviderError::Transport(detail) => GenerationError::ProviderUnavailable { detail },
            ProviderError::Decode(detail) => GenerationError::InvalidProviderResponse { detail },
        }
    }

    /// HTTP status equivalent for the caller.
    pub fn http_status(&self) -> u16 {
        match self {
            GenerationError::InvalidPrompt => 400,
            GenerationError::Provider { status, .. } => *status,
            GenerationError::ProviderUnavailable { .. } => 502,
            GenerationError::TimedOut => 408,
            GenerationError::Cancelled => 503,
            GenerationError::InvalidProviderResponse { .. }
            | GenerationError::NoOutput
            | GenerationError::GenerationFailed
            | GenerationError::Internal { .. } => 500,
        }
    }

    /// Audit class: `failed` for well-formed negative outcomes, `error`
    /// for everything exceptional.
    pub fn audit_status(&self) -> AuditStatus {
        match self {
            GenerationError::InvalidPrompt
            | GenerationError::NoOutput
            | GenerationError::GenerationFailed => AuditStatus::Failed,
            GenerationError::Provider { .. }
            | GenerationError::ProviderUnavailable { .. }
            | GenerationError::InvalidProviderResponse { .. }
            | GenerationError::TimedOut
            | GenerationError::Cancelled
            | GenerationError::Internal { .. } => AuditStatus::Error,
        }
    }

    /// Message written to the audit row, including internal detail.
    pub fn audit_message(&self) -> String {
        match self {
            GenerationError::ProviderUnavailable { detail }
            | GenerationError::InvalidProviderResponse { detail } => format!("{self}: {detail}"),
            GenerationError::Internal { detail } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Terminal state name used in logs.
    pub fn terminal_state(&self) -> &'static str {
        match self {
            GenerationError::TimedOut => "timed_out",
            GenerationError::Internal { .. } => "errored",
            _ => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_messages_match_gateway_contract() {
        assert_eq!(GenerationError::InvalidPrompt.to_string(), "Prompt is required");
        assert_eq!(GenerationError::TimedOut.to_string(), "Image generation timed out");
        assert_eq!(
            GenerationError::NoOutput.to_string(),
            "Failed to generate image - no output received"
        );
        assert_eq!(
            GenerationError::Provider {
                status: 429,
                body: "slow down".to_string()
            }
            .to_string(),
            "API error: 429 - slow down"
        );
    }

    #[test]
    fn http_statuses() {
        assert_eq!(GenerationError::InvalidPrompt.http_status(), 400);
        assert_eq!(GenerationError::TimedOut.http_status(), 408);
        assert_eq!(
            GenerationError::Provider {
                status: 401,
                body: String::new()
            }
            .http_status(),
            401
        );
        assert_eq!(
            GenerationError::Internal {
                detail: "x".to_string()
            }
            .http_status(),
            500
        );
    }

    #[test]
    fn internal_detail_stays_out_of_display() {
        let err = GenerationError::Internal {
            detail: "index out of bounds".to_string(),
        };
        assert_eq!(err.to_string(), "Internal server error");
        assert_eq!(err.audit_message(), "index out of bounds");
        assert_eq!(err.audit_status(), AuditStatus::Error);
    }

    #[test]
    fn create_failures_map_by_kind() {
        assert!(matches!(
            GenerationError::from_create(ProviderError::Decode("eof".to_string())),
            GenerationError::InvalidProviderResponse { .. }
        ));
        assert!(matches!(
            GenerationError::from_create(ProviderError::Transport("reset".to_string())),
            GenerationError::ProviderUnavailable { .. }
        ));
    }
}
