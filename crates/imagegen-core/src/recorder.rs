//! Audit recorder: writes the single audit row of each invocation.

use std::sync::Arc;

use imagegen_state::{AuditLog, AuditRecord, NewAuditRecord, StorageResult};
use tracing::debug;

/// Thin adapter over an [`AuditLog`].
///
/// `record` returns the storage result; callers that must not fail on
/// audit errors log and discard it explicitly.
#[derive(Clone)]
pub struct AuditRecorder {
    log: Arc<dyn AuditLog>,
}

impl AuditRecorder {
    pub fn new(log: Arc<dyn AuditLog>) -> Self {
        Self { log }
    }

    /// Append one record.
    pub async fn record(&self, record: NewAuditRecord) -> StorageResult<AuditRecord> {
        let stored = self.log.append(record).await?;
        debug!(audit_id = %stored.id, status = %stored.status, "audit record written");
        Ok(stored)
    }
}
