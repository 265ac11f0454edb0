//! SurrealDB schema initialization for the audit store
//!
//! Sets up the `prompt_logs` table with append-only permissions and the
//! indexes used by the reporting reads.

use crate::schema::AUDIT_TABLE;
use crate::{Result, StateError};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

/// Initialize all audit tables in SurrealDB
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing imagegen audit schema");
    init_prompt_logs_table(db).await?;
    info!("Audit schema initialization complete");
    Ok(())
}

/// Initialize `prompt_logs` table with constraints and indexes
///
/// Schema:
/// ```text
/// TABLE prompt_logs {
///   audit_id:                 STRING (unique)
///   requester_identity:       STRING (indexed)
///   prompt:                   STRING
///   image_url:                STRING?
///   status:                   STRING (enum: success | failed | error, indexed)
///   error_message:            STRING?
///   generation_time_seconds:  FLOAT?
///   created_at:               DATETIME (indexed)
/// }
/// ```
///
/// Rows are never updated or deleted.
async fn init_prompt_logs_table(db: &Surreal<Any>) -> Result<()> {
    debug!(table = AUDIT_TABLE, "Initializing audit table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS prompt_logs
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update NONE
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_audit_id ON TABLE prompt_logs COLUMNS audit_id UNIQUE;

        -- Per-requester listing
        DEFINE INDEX IF NOT EXISTS idx_requester ON TABLE prompt_logs COLUMNS requester_identity;

        -- Grouped counts
        DEFINE INDEX IF NOT EXISTS idx_status ON TABLE prompt_logs COLUMNS status;

        DEFINE INDEX IF NOT EXISTS idx_created_at ON TABLE prompt_logs COLUMNS created_at;
    "#;

    db.query(sql)
        .await?
        .check()
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
    info!("✓ prompt_logs table initialized");
    Ok(())
}
