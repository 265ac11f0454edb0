//! Storage trait definitions for the audit trail
//!
//! `AuditLog` is the single storage abstraction: an append-only log of
//! generation invocations plus the two reads used by reporting.
//!
//! The trait is async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Prompt stored when the caller supplied none.
pub const MISSING_PROMPT_PLACEHOLDER: &str = "<missing>";

/// Default page size for [`AuditQuery`].
pub const DEFAULT_LIST_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Identifiers and status
// ---------------------------------------------------------------------------

/// Unique identifier for an audit record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditId(pub String);

impl AuditId {
    /// Generate a new random AuditId
    pub fn new() -> Self {
        AuditId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for AuditId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AuditId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome class of a generation invocation.
///
/// - `Success`: an image URL was obtained.
/// - `Failed`: a well-formed negative outcome (bad input, provider said no).
/// - `Error`: an exceptional condition (timeout, transport, crash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failed,
    Error,
}

impl AuditStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditStatus::Success => "success",
            AuditStatus::Failed => "failed",
            AuditStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "success" => Ok(AuditStatus::Success),
            "failed" => Ok(AuditStatus::Failed),
            "error" => Ok(AuditStatus::Error),
            other => Err(StorageError::InvalidRecord(format!(
                "unknown audit status: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An audit entry that has not been persisted yet.
///
/// Fields are private so the status-dependent invariants hold by
/// construction: only `success` entries carry an image URL and a
/// generation time, and every other status carries an error message.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditRecord {
    requester_identity: String,
    prompt: String,
    status: AuditStatus,
    image_url: Option<String>,
    error_message: Option<String>,
    generation_time_seconds: Option<f64>,
}

impl NewAuditRecord {
    /// A successful generation. Negative durations are clamped to zero.
    pub fn success(
        requester_identity: impl Into<String>,
        prompt: Option<&str>,
        image_url: impl Into<String>,
        generation_time_seconds: f64,
    ) -> Self {
        Self {
            requester_identity: requester_identity.into(),
            prompt: prompt_or_placeholder(prompt),
            status: AuditStatus::Success,
            image_url: Some(image_url.into()),
            error_message: None,
            generation_time_seconds: Some(generation_time_seconds.max(0.0)),
        }
    }

    /// A well-formed negative outcome.
    pub fn failed(
        requester_identity: impl Into<String>,
        prompt: Option<&str>,
        error_message: impl Into<String>,
    ) -> Self {
        Self::negative(requester_identity, prompt, AuditStatus::Failed, error_message)
    }

    /// An exceptional outcome.
    pub fn error(
        requester_identity: impl Into<String>,
        prompt: Option<&str>,
        error_message: impl Into<String>,
    ) -> Self {
        Self::negative(requester_identity, prompt, AuditStatus::Error, error_message)
    }

    fn negative(
        requester_identity: impl Into<String>,
        prompt: Option<&str>,
        status: AuditStatus,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            requester_identity: requester_identity.into(),
            prompt: prompt_or_placeholder(prompt),
            status,
            image_url: None,
            error_message: Some(error_message.into()),
            generation_time_seconds: None,
        }
    }

    pub fn requester_identity(&self) -> &str {
        &self.requester_identity
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn status(&self) -> AuditStatus {
        self.status
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn generation_time_seconds(&self) -> Option<f64> {
        self.generation_time_seconds
    }

    /// Stamp an id and creation time, producing the persisted form.
    pub fn into_record(self, id: AuditId, created_at: DateTime<Utc>) -> AuditRecord {
        AuditRecord {
            id,
            requester_identity: self.requester_identity,
            prompt: self.prompt,
            image_url: self.image_url,
            status: self.status,
            error_message: self.error_message,
            generation_time_seconds: self.generation_time_seconds,
            created_at,
        }
    }
}

fn prompt_or_placeholder(prompt: Option<&str>) -> String {
    match prompt {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => MISSING_PROMPT_PLACEHOLDER.to_string(),
    }
}

/// A persisted, immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: AuditId,
    pub requester_identity: String,
    pub prompt: String,
    pub image_url: Option<String>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
    pub generation_time_seconds: Option<f64>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Filter for [`AuditLog::list_recent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    /// Maximum number of records returned
    pub limit: usize,
    /// Only records of this requester, when set
    pub requester: Option<String>,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            requester: None,
        }
    }
}

impl AuditQuery {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn for_requester(mut self, requester: impl Into<String>) -> Self {
        self.requester = Some(requester.into());
        self
    }

    /// Whether `record` passes the requester filter.
    pub fn matches(&self, record: &AuditRecord) -> bool {
        self.requester
            .as_deref()
            .map_or(true, |r| r == record.requester_identity)
    }
}

/// Record counts grouped by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub success: u64,
    pub failed: u64,
    pub error: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: AuditStatus, n: u64) {
        match status {
            AuditStatus::Success => self.success += n,
            AuditStatus::Failed => self.failed += n,
            AuditStatus::Error => self.error += n,
        }
    }

    pub fn get(&self, status: AuditStatus) -> u64 {
        match status {
            AuditStatus::Success => self.success,
            AuditStatus::Failed => self.failed,
            AuditStatus::Error => self.error,
        }
    }

    pub fn total(&self) -> u64 {
        self.success + self.failed + self.error
    }

    /// Status name → count, omitting statuses with no records.
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        [AuditStatus::Success, AuditStatus::Failed, AuditStatus::Error]
            .into_iter()
            .filter(|s| self.get(*s) > 0)
            .map(|s| (s.as_str().to_string(), self.get(s)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// AuditLog
// ---------------------------------------------------------------------------

/// Append-only audit log.
///
/// Guarantees:
/// - `append` writes exactly one new record and never touches existing ones.
/// - `id` and `created_at` are assigned by the log at persistence time.
/// - Reads return records newest first.
/// - Safe for concurrent writers; there are no cross-record invariants.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Persist one record, returning it with its assigned id and timestamp.
    async fn append(&self, record: NewAuditRecord) -> StorageResult<AuditRecord>;

    /// Most recent records, optionally filtered by requester.
    async fn list_recent(&self, query: &AuditQuery) -> StorageResult<Vec<AuditRecord>>;

    /// Count of all records grouped by status.
    async fn count_by_status(&self) -> StorageResult<StatusCounts>;

    /// Count of records, optionally filtered by requester.
    async fn count(&self, requester: Option<&str>) -> StorageResult<u64>;
}
