//! Schema definitions for the audit SurrealDB table
//!
//! Tables:
//! - prompt_logs: one row per generation invocation (append-only)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::{AuditId, AuditRecord, AuditStatus, NewAuditRecord};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Name of the audit table.
pub const AUDIT_TABLE: &str = "prompt_logs";

/// Audit row as stored in `prompt_logs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Application-level audit ID (UUID string)
    pub audit_id: String,
    pub requester_identity: String,
    pub prompt: String,
    pub image_url: Option<String>,
    /// "success" | "failed" | "error"
    pub status: String,
    pub error_message: Option<String>,
    pub generation_time_seconds: Option<f64>,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
}

impl AuditRow {
    /// Build a row for a new record, stamping id and creation time.
    pub fn from_new(record: &NewAuditRecord) -> Self {
        AuditRow {
            id: None,
            audit_id: AuditId::new().0,
            requester_identity: record.requester_identity().to_string(),
            prompt: record.prompt().to_string(),
            image_url: record.image_url().map(str::to_string),
            status: record.status().as_str().to_string(),
            error_message: record.error_message().map(str::to_string),
            generation_time_seconds: record.generation_time_seconds(),
            created_at: Utc::now(),
        }
    }

    /// Convert the DB row into the public record type.
    pub fn into_record(self) -> Result<AuditRecord, StorageError> {
        let status: AuditStatus =
            self.status
                .parse()
                .map_err(|_| StorageError::CorruptRecord {
                    id: self.audit_id.clone(),
                    reason: format!("unknown status {:?}", self.status),
                })?;

        Ok(AuditRecord {
            id: AuditId(self.audit_id),
            requester_identity: self.requester_identity,
            prompt: self.prompt,
            image_url: self.image_url,
            status,
            error_message: self.error_message,
            generation_time_seconds: self.generation_time_seconds,
            created_at: self.created_at,
        })
    }
}
