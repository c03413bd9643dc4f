use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::{
    cleanup::{CleanupPlan, DeletionSummary},
    error::Result,
    storage::models::{CleanupRun, DeletionOutcome, LedgerStats},
};

pub struct Database {
    conn: Connection,
}

fn parse_time(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<CleanupRun> {
    Ok(CleanupRun {
        id: row.get(0)?,
        label: row.get(1)?,
        started_at: parse_time(2, row.get(2)?)?,
        finished_at: row
            .get::<_, Option<String>>(3)?
            .map(|raw| parse_time(3, raw))
            .transpose()?,
        fetched: row.get(4)?,
        kept: row.get(5)?,
        to_delete: row.get(6)?,
        deleted: row.get(7)?,
        failed: row.get(8)?,
        dry_run: row.get(9)?,
    })
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS cleanup_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                fetched INTEGER NOT NULL,
                kept INTEGER NOT NULL,
                to_delete INTEGER NOT NULL,
                deleted INTEGER NOT NULL DEFAULT 0,
                failed INTEGER NOT NULL DEFAULT 0,
                dry_run INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS deletion_outcomes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id INTEGER NOT NULL,
                resource_name TEXT NOT NULL,
                succeeded INTEGER NOT NULL,
                error TEXT,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (run_id) REFERENCES cleanup_runs(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_outcomes_run ON deletion_outcomes(run_id)",
            [],
        )?;

        Ok(())
    }

    /// Record a planned run and return its id.
    pub fn start_run(&self, plan: &CleanupPlan, dry_run: bool) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO cleanup_runs (label, started_at, fetched, kept, to_delete, dry_run)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                plan.label,
                Utc::now().to_rfc3339(),
                plan.fetched,
                plan.partition.kept.len(),
                plan.partition.to_delete.len(),
                dry_run,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Store every per-contact outcome and the final counts in one transaction.
    pub fn finish_run(&mut self, run_id: i64, summary: &DeletionSummary) -> Result<()> {
        let tx = self.conn.transaction()?;
        for (resource_name, result) in &summary.results {
            let error = result.as_ref().err().map(|e| e.to_string());
            tx.execute(
                "INSERT INTO deletion_outcomes (run_id, resource_name, succeeded, error, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![run_id, resource_name, error.is_none(), error, Utc::now().to_rfc3339()],
            )?;
        }
        tx.execute(
            "UPDATE cleanup_runs SET finished_at = ?1, deleted = ?2, failed = ?3 WHERE id = ?4",
            params![Utc::now().to_rfc3339(), summary.successful, summary.failed, run_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn recent_runs(&self, limit: usize) -> Result<Vec<CleanupRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, label, started_at, finished_at, fetched, kept, to_delete, deleted, failed, dry_run
             FROM cleanup_runs
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let runs = stmt
            .query_map([limit], run_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    pub fn deletion_outcomes(&self, run_id: i64) -> Result<Vec<DeletionOutcome>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, resource_name, succeeded, error, timestamp
             FROM deletion_outcomes
             WHERE run_id = ?1
             ORDER BY id",
        )?;

        let outcomes = stmt
            .query_map([run_id], |row| {
                Ok(DeletionOutcome {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    resource_name: row.get(2)?,
                    succeeded: row.get(3)?,
                    error: row.get(4)?,
                    timestamp: parse_time(5, row.get(5)?)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(outcomes)
    }

    pub fn get_stats(&self) -> Result<LedgerStats> {
        let stats = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(dry_run), 0),
                    COALESCE(SUM(kept), 0),
                    COALESCE(SUM(CASE WHEN dry_run = 0 THEN deleted ELSE 0 END), 0),
                    COALESCE(SUM(failed), 0)
             FROM cleanup_runs",
            [],
            |row| {
                Ok(LedgerStats {
                    total_runs: row.get(0)?,
                    dry_runs: row.get(1)?,
                    contacts_kept: row.get(2)?,
                    contacts_deleted: row.get(3)?,
                    deletions_failed: row.get(4)?,
                })
            },
        )?;
        Ok(stats)
    }
}
