//! Sync ledger persistence
//!
//! One `sync_runs` row per batch and one `sync_failures` row per failed
//! item. Failed items keep their original input as JSON for manual retry.

use bridge_common::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{SyncFailure, SyncMode, SyncReport};

/// Stored summary of one sync/import run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunSummary {
    pub run_id: Uuid,
    pub mode: SyncMode,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub created: usize,
    pub updated: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Persist a finished run and its failed items in one transaction
pub async fn record_sync_run(pool: &SqlitePool, report: &SyncReport) -> Result<()> {
    let run_id = report.run_id.to_string();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO sync_runs (
            run_id, mode, total, succeeded, failed, created, updated,
            started_at, completed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&run_id)
    .bind(report.mode.as_str())
    .bind(report.total as i64)
    .bind(report.succeeded.len() as i64)
    .bind(report.failed.len() as i64)
    .bind(report.created_count() as i64)
    .bind(report.updated_count() as i64)
    .bind(stored_timestamp(report.started_at))
    .bind(stored_timestamp(report.completed_at))
    .execute(&mut *tx)
    .await?;

    for failure in &report.failed {
        let contact = failure.contact.to_string();
        sqlx::query(
            r#"
            INSERT INTO sync_failures (run_id, item_index, email, reason, contact)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run_id)
        .bind(failure.index as i64)
        .bind(failure.email())
        .bind(&failure.reason)
        .bind(contact)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(run_id = %report.run_id, failures = report.failed.len(), "Recorded sync run");
    Ok(())
}

/// Most recently completed run, if any
pub async fn last_sync(pool: &SqlitePool) -> Result<Option<SyncRunSummary>> {
    let row = sqlx::query(
        r#"
        SELECT run_id, mode, total, succeeded, failed, created, updated,
               started_at, completed_at
        FROM sync_runs
        ORDER BY completed_at DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let run_id: String = row.get("run_id");
    let mode: String = row.get("mode");

    Ok(Some(SyncRunSummary {
        run_id: parse_run_id(&run_id)?,
        mode: SyncMode::parse(&mode)
            .ok_or_else(|| Error::CorruptRecord(format!("unknown sync mode '{}'", mode)))?,
        total: row.get::<i64, _>("total") as usize,
        succeeded: row.get::<i64, _>("succeeded") as usize,
        failed: row.get::<i64, _>("failed") as usize,
        created: row.get::<i64, _>("created") as usize,
        updated: row.get::<i64, _>("updated") as usize,
        started_at: parse_timestamp(row.get("started_at"))?,
        completed_at: parse_timestamp(row.get("completed_at"))?,
    }))
}

/// Failed items of one run, in batch order
///
/// `NotFound` when no run has that id; an empty list when the run had no
/// failures.
pub async fn failures_for_run(pool: &SqlitePool, run_id: Uuid) -> Result<Vec<SyncFailure>> {
    let run_id_str = run_id.to_string();

    let exists: Option<String> = sqlx::query_scalar("SELECT run_id FROM sync_runs WHERE run_id = ?")
        .bind(&run_id_str)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(Error::NotFound(format!("Sync run {}", run_id)));
    }

    let rows = sqlx::query(
        r#"
        SELECT item_index, reason, contact
        FROM sync_failures
        WHERE run_id = ?
        ORDER BY item_index
        "#,
    )
    .bind(&run_id_str)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let contact: String = row.get("contact");
            let contact: serde_json::Value = serde_json::from_str(&contact)
                .map_err(|e| Error::CorruptRecord(format!("failed item contact: {}", e)))?;
            Ok(SyncFailure {
                index: row.get::<i64, _>("item_index") as usize,
                contact,
                reason: row.get("reason"),
            })
        })
        .collect()
}

fn parse_run_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::CorruptRecord(format!("run id: {}", e)))
}

/// Fixed-width RFC 3339 so text ordering matches time ordering
fn stored_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRecord(format!("timestamp: {}", e)))
}
