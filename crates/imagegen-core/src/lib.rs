//! Imagegen Core Library
//!
//! Prompt-to-image orchestration against an asynchronous inference
//! provider, with one audit record per invocation.
//!
//! ## Components
//!
//! - [`provider`]: `ProviderClient` trait and the reqwest-backed `WavespeedClient`
//! - [`classify`]: pure mapping of raw responses to outcomes
//! - [`poller`]: bounded, cancellable status polling
//! - [`recorder`]: audit writes
//! - [`orchestrator`]: the state machine tying them together

pub mod classify;
pub mod clock;
pub mod config;
pub mod error;
pub mod fakes;
pub mod identity;
pub mod obs;
pub mod orchestrator;
pub mod poller;
pub mod provider;
pub mod recorder;
pub mod reporting;
pub mod telemetry;

pub use classify::{classify_create, classify_status, PollOutcome, ProviderResult};
pub use clock::{Clock, SteppingClock, TokioClock};
pub use config::{ConfigError, GenerationParams, PollConfig, ProviderConfig};
pub use error::GenerationError;
pub use identity::{IdentityResolver, RequesterIdentity, TokenDigestResolver};
pub use orchestrator::{GenerationRequest, GenerationState, GenerationSuccess, Orchestrator};
pub use poller::{PollReport, Poller};
pub use provider::{
    PredictionData, PredictionEnvelope, ProviderClient, ProviderError, RawCreateResponse,
    RawStatusResponse, WavespeedClient,
};
pub use recorder::AuditRecorder;
pub use reporting::{logs_report, LogsReport};

pub use imagegen_state::{
    AuditId, AuditLog, AuditQuery, AuditRecord, AuditStatus, StatusCounts, SurrealAuditLog,
};
