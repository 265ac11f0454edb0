//! On-disk persistence tests for the SurrealKV-backed audit store.

use imagegen_state::storage_traits::{AuditLog, AuditQuery, NewAuditRecord};
use imagegen_state::{StoreConfig, SurrealAuditLog};

#[tokio::test]
async fn records_survive_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::Local(dir.path().join("db"));

    {
        let log = SurrealAuditLog::connect(&config).await.unwrap();
        log.append(NewAuditRecord::success("alice", Some("a lighthouse"), "http://x/l.png", 7.0))
            .await
            .unwrap();
    }

    let reopened = SurrealAuditLog::connect(&config).await.unwrap();
    let records = reopened.list_recent(&AuditQuery::default()).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].prompt, "a lighthouse");
}
