use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One invocation of `clean`, as recorded in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupRun {
    pub id: i64,
    pub label: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub fetched: usize,
    pub kept: usize,
    pub to_delete: usize,
    pub deleted: usize,
    pub failed: usize,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionOutcome {
    pub id: i64,
    pub run_id: i64,
    pub resource_name: String,
    pub succeeded: bool,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_runs: usize,
    pub dry_runs: usize,
    pub contacts_kept: usize,
    pub contacts_deleted: usize,
    pub deletions_failed: usize,
}
