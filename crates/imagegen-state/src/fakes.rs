//! In-memory fakes for the audit log (testing only)
//!
//! Provides `MemoryAuditLog`, which satisfies the `AuditLog` contract
//! without any external dependencies, and `FailingAuditLog`, which rejects
//! every write so callers can exercise their best-effort paths.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

// ---------------------------------------------------------------------------
// MemoryAuditLog
// ---------------------------------------------------------------------------

/// In-memory audit log backed by a `Vec` in insertion order.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record, oldest first.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, record: NewAuditRecord) -> StorageResult<AuditRecord> {
        let stored = record.into_record(AuditId::new(), Utc::now());
        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_recent(&self, query: &AuditQuery) -> StorageResult<Vec<AuditRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .rev()
            .filter(|r| query.matches(r))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn count_by_status(&self) -> StorageResult<StatusCounts> {
        let records = self.records.lock().unwrap();
        let mut counts = StatusCounts::default();
        for r in records.iter() {
            counts.add(r.status, 1);
        }
        Ok(counts)
    }

    async fn count(&self, requester: Option<&str>) -> StorageResult<u64> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| requester.map_or(true, |q| q == r.requester_identity))
            .count() as u64)
    }
}

// ---------------------------------------------------------------------------
// FailingAuditLog
// ---------------------------------------------------------------------------

/// Audit log whose every operation fails with a backend error.
///
/// Counts attempted appends so tests can assert a write was still tried.
#[derive(Debug, Default)]
pub struct FailingAuditLog {
    attempts: Mutex<u64>,
}

impl FailingAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u64 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl AuditLog for FailingAuditLog {
    async fn append(&self, _record: NewAuditRecord) -> StorageResult<AuditRecord> {
        *self.attempts.lock().unwrap() += 1;
        Err(StorageError::Backend("audit store unavailable".to_string()))
    }

    async fn list_recent(&self, _query: &AuditQuery) -> StorageResult<Vec<AuditRecord>> {
        Err(StorageError::Backend("audit store unavailable".to_string()))
    }

    async fn count_by_status(&self) -> StorageResult<StatusCounts> {
        Err(StorageError::Backend("audit store unavailable".to_string()))
    }

    async fn count(&self, _requester: Option<&str>) -> StorageResult<u64> {
        Err(StorageError::Backend("audit store unavailable".to_string()))
    }
}
