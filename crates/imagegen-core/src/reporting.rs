//! Read-side summary of the audit trail.

use std::collections::BTreeMap;

use imagegen_state::{AuditLog, AuditQuery, AuditRecord, StorageResult};
use serde::{Deserialize, Serialize};

/// Recent records plus aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsReport {
    pub logs: Vec<AuditRecord>,
    /// Status → count over the whole log
    pub stats: BTreeMap<String, u64>,
    /// Records matching the query's requester filter
    pub total_logs: u64,
}

/// Build a report for `query`.
pub async fn logs_report(log: &dyn AuditLog, query: &AuditQuery) -> StorageResult<LogsReport> {
    let logs = log.list_recent(query).await?;
    let stats = log.count_by_status().await?.to_map();
    let total_logs = log.count(query.requester.as_deref()).await?;

    Ok(LogsReport {
        logs,
        stats,
        total_logs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagegen_state::fakes::MemoryAuditLog;
    use imagegen_state::NewAuditRecord;

    #[tokio::test]
    async fn report_combines_listing_stats_and_total() {
        let log = MemoryAuditLog::new();
        for r in [
            NewAuditRecord::success("alice", Some("p1"), "http://x/1", 1.0),
            NewAuditRecord::failed("alice", None, "Prompt is required"),
            NewAuditRecord::error("bob", Some("p2"), "Image generation timed out"),
        ] {
            log.append(r).await.unwrap();
        }

        let report = logs_report(&log, &AuditQuery::default().for_requester("alice").with_limit(1))
            .await
            .unwrap();

        assert_eq!(report.logs.len(), 1);
        assert_eq!(report.total_logs, 2);
        assert_eq!(report.stats.get("success"), Some(&1));
        assert_eq!(report.stats.get("failed"), Some(&1));
        assert_eq!(report.stats.get("error"), Some(&1));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("totalLogs").is_some());
    }
}
