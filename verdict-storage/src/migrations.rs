//! Schema migrations, versioned through `PRAGMA user_version`.

use rusqlite::Connection;

use verdict_core::errors::{StoreError, VerdictResult};

use crate::to_store_err;

const SCHEMA_VERSION: u32 = 1;

pub fn run_migrations(conn: &Connection) -> VerdictResult<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| to_store_err(e.to_string()))?;

    let version: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| to_store_err(e.to_string()))?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    if version < SCHEMA_VERSION {
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|e| to_store_err(e.to_string()))?;
    }
    Ok(())
}

/// v1: decision_runs, decision_results, audit_events.
fn migrate_v1(conn: &Connection) -> VerdictResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS decision_runs (
            run_id          TEXT PRIMARY KEY,
            case_id         TEXT NOT NULL,
            policy_id       TEXT NOT NULL,
            policy_version  TEXT NOT NULL,
            run_status      TEXT NOT NULL,
            input_hash      TEXT NOT NULL,
            inputs_snapshot TEXT NOT NULL DEFAULT '{}',
            decision        TEXT,
            risk_level      TEXT,
            confidence      REAL,
            summary         TEXT,
            created_by      TEXT NOT NULL DEFAULT 'system',
            created_at      TEXT NOT NULL,
            completed_at    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_runs_case ON decision_runs(case_id);
        CREATE INDEX IF NOT EXISTS idx_runs_status ON decision_runs(run_status);
        CREATE INDEX IF NOT EXISTS idx_runs_hash ON decision_runs(input_hash);

        CREATE TABLE IF NOT EXISTS decision_results (
            result_id       TEXT PRIMARY KEY,
            run_id          TEXT NOT NULL REFERENCES decision_runs(run_id),
            group_id        TEXT NOT NULL,
            decision_status TEXT NOT NULL,
            risk_level      TEXT NOT NULL,
            confidence      REAL NOT NULL,
            reason_codes    TEXT NOT NULL DEFAULT '[]',
            fail_actions    TEXT NOT NULL DEFAULT '[]',
            trace           TEXT NOT NULL DEFAULT '{}',
            evidence_refs   TEXT NOT NULL DEFAULT '{}',
            created_by      TEXT NOT NULL DEFAULT 'system',
            created_at      TEXT NOT NULL,
            UNIQUE (run_id, group_id)
        );

        CREATE INDEX IF NOT EXISTS idx_results_run ON decision_results(run_id);

        CREATE TABLE IF NOT EXISTS audit_events (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            case_id     TEXT NOT NULL,
            event_type  TEXT NOT NULL,
            actor       TEXT NOT NULL DEFAULT 'system',
            run_id      TEXT,
            payload     TEXT NOT NULL DEFAULT '{}',
            occurred_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_case ON audit_events(case_id);
        CREATE INDEX IF NOT EXISTS idx_audit_run ON audit_events(run_id);
        CREATE INDEX IF NOT EXISTS idx_audit_type ON audit_events(event_type);
        ",
    )
    .map_err(|e| StoreError::MigrationFailed {
        version: 1,
        reason: e.to_string(),
    })?;
    Ok(())
}
