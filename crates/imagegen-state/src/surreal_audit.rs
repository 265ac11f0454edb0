//! SurrealDB-backed AuditLog implementation
//!
//! Uses `schema::AuditRow` for persistence, converting to/from
//! `storage_traits` types at the boundary.

use async_trait::async_trait;
use serde::Deserialize;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::debug;

use crate::error::StorageError;
use crate::handle::StoreConfig;
use crate::schema::{AuditRow, AUDIT_TABLE};
use crate::storage_traits::{
    AuditLog, AuditQuery, AuditRecord, AuditStatus, NewAuditRecord, StatusCounts, StorageResult,
};

#[derive(Debug, Deserialize)]
struct StatusCountRow {
    status: String,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

fn backend(e: surrealdb::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

/// SurrealDB-backed implementation of [`AuditLog`].
#[derive(Clone)]
pub struct SurrealAuditLog {
    db: Surreal<Any>,
}

impl SurrealAuditLog {
    /// Wrap an already-initialized connection.
    pub fn new(db: Surreal<Any>) -> Self {
        Self { db }
    }

    /// Connect according to `config` and initialize the schema.
    pub async fn connect(config: &StoreConfig) -> crate::Result<Self> {
        Ok(Self::new(config.connect().await?))
    }

    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> crate::Result<Self> {
        Self::connect(&StoreConfig::Memory).await
    }

    /// Create from environment variables (see [`StoreConfig::from_env`]).
    pub async fn from_env() -> crate::Result<Self> {
        Self::connect(&StoreConfig::from_env()).await
    }

    fn rows_to_records(rows: Vec<AuditRow>) -> StorageResult<Vec<AuditRecord>> {
        rows.into_iter().map(AuditRow::into_record).collect()
    }
}

#[async_trait]
impl AuditLog for SurrealAuditLog {
    async fn append(&self, record: NewAuditRecord) -> StorageResult<AuditRecord> {
        let row = AuditRow::from_new(&record);
        debug!(audit_id = %row.audit_id, status = %row.status, "appending audit row");

        let created: Option<AuditRow> = self
            .db
            .create(AUDIT_TABLE)
            .content(row)
            .await
            .map_err(backend)?;

        created
            .ok_or_else(|| StorageError::Backend("create returned no row".to_string()))?
            .into_record()
    }

    async fn list_recent(&self, query: &AuditQuery) -> StorageResult<Vec<AuditRecord>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows: Vec<AuditRow> = if let Some(requester) = &query.requester {
            let requester = requester.clone();
            let mut res = self
                .db
                .query(
                    "SELECT * FROM prompt_logs WHERE requester_identity = $requester \
                     ORDER BY created_at DESC LIMIT $limit",
                )
                .bind(("requester", requester))
                .bind(("limit", limit))
                .await
                .map_err(backend)?;
            res.take(0).map_err(backend)?
        } else {
            let mut res = self
                .db
                .query("SELECT * FROM prompt_logs ORDER BY created_at DESC LIMIT $limit")
                .bind(("limit", limit))
                .await
                .map_err(backend)?;
            res.take(0).map_err(backend)?
        };

        Self::rows_to_records(rows)
    }

    async fn count_by_status(&self) -> StorageResult<StatusCounts> {
        let mut res = self
            .db
            .query("SELECT status, count() AS total FROM prompt_logs GROUP BY status")
            .await
            .map_err(backend)?;
        let rows: Vec<StatusCountRow> = res.take(0).map_err(backend)?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let status: AuditStatus = row.status.parse()?;
            counts.add(status, row.total);
        }
        Ok(counts)
    }

    async fn count(&self, requester: Option<&str>) -> StorageResult<u64> {
        let rows: Vec<CountRow> = if let Some(requester) = requester {
            let requester = requester.to_string();
            let mut res = self
                .db
                .query(
                    "SELECT count() AS total FROM prompt_logs \
                     WHERE requester_identity = $requester GROUP ALL",
                )
                .bind(("requester", requester))
                .await
                .map_err(backend)?;
            res.take(0).map_err(backend)?
        } else {
            let mut res = self
                .db
                .query("SELECT count() AS total FROM prompt_logs GROUP ALL")
                .await
                .map_err(backend)?;
            res.take(0).map_err(backend)?
        };

        Ok(rows.first().map_or(0, |r| r.total))
    }
}
