//! The SQLite-backed store implementing the run, result, and audit traits.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use verdict_core::errors::{StoreError, VerdictResult};
use verdict_core::models::{AuditEvent, DecisionResult, DecisionRun, RunDecision, RunStatus};
use verdict_core::policy::Severity;
use verdict_core::traits::{AuditSink, DecisionResultStore, DecisionRunStore};

use crate::{migrations, to_store_err};

/// Single-writer SQLite store. All three persistence traits land here so one
/// file (or one in-memory database) holds the complete run record.
pub struct SqliteDecisionStore {
    conn: Mutex<Connection>,
}

impl SqliteDecisionStore {
    pub fn open(path: &Path) -> VerdictResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_store_err(e.to_string()))?;
        Self::initialize(conn)
    }

    /// In-memory database, for tests.
    pub fn open_in_memory() -> VerdictResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_store_err(e.to_string()))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> VerdictResult<Self> {
        migrations::run_migrations(&conn)?;
        Ok(SqliteDecisionStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> VerdictResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| to_store_err("connection mutex poisoned"))
    }
}

// ── serde column helpers ──────────────────────────────────────────────

fn json_str<T: Serialize>(value: &T) -> VerdictResult<String> {
    serde_json::to_string(value).map_err(|e| {
        StoreError::SerializationFailed {
            reason: e.to_string(),
        }
        .into()
    })
}

fn from_json<T: DeserializeOwned>(s: &str) -> VerdictResult<T> {
    serde_json::from_str(s).map_err(|e| {
        StoreError::SerializationFailed {
            reason: e.to_string(),
        }
        .into()
    })
}

/// Enums serialize to bare TEXT columns (e.g. `COMPLETED`, not `"COMPLETED"`).
fn enum_str<T: Serialize>(value: &T) -> VerdictResult<String> {
    json_str(value).map(|s| s.trim_matches('"').to_string())
}

fn enum_parse<T: DeserializeOwned>(s: &str) -> VerdictResult<T> {
    serde_json::from_value(Value::String(s.to_string())).map_err(|e| {
        StoreError::SerializationFailed {
            reason: e.to_string(),
        }
        .into()
    })
}

fn parse_timestamp(s: &str) -> VerdictResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::SerializationFailed {
                reason: format!("bad timestamp {s:?}: {e}"),
            }
            .into()
        })
}

// ── row shapes ────────────────────────────────────────────────────────

struct RawRun {
    run_id: String,
    case_id: String,
    policy_id: String,
    policy_version: String,
    run_status: String,
    input_hash: String,
    inputs_snapshot: String,
    decision: Option<String>,
    risk_level: Option<String>,
    confidence: Option<f64>,
    summary: Option<String>,
    created_by: String,
    created_at: String,
    completed_at: Option<String>,
}

impl RawRun {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawRun {
            run_id: row.get(0)?,
            case_id: row.get(1)?,
            policy_id: row.get(2)?,
            policy_version: row.get(3)?,
            run_status: row.get(4)?,
            input_hash: row.get(5)?,
            inputs_snapshot: row.get(6)?,
            decision: row.get(7)?,
            risk_level: row.get(8)?,
            confidence: row.get(9)?,
            summary: row.get(10)?,
            created_by: row.get(11)?,
            created_at: row.get(12)?,
            completed_at: row.get(13)?,
        })
    }

    fn into_run(self) -> VerdictResult<DecisionRun> {
        Ok(DecisionRun {
            run_status: enum_parse::<RunStatus>(&self.run_status)?,
            inputs_snapshot: from_json(&self.inputs_snapshot)?,
            decision: self
                .decision
                .as_deref()
                .map(enum_parse::<RunDecision>)
                .transpose()?,
            risk_level: self
                .risk_level
                .as_deref()
                .map(enum_parse::<Severity>)
                .transpose()?,
            summary: self.summary.as_deref().map(from_json).transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
            completed_at: self
                .completed_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            run_id: self.run_id,
            case_id: self.case_id,
            policy_id: self.policy_id,
            policy_version: self.policy_version,
            input_hash: self.input_hash,
            confidence: self.confidence,
            created_by: self.created_by,
        })
    }
}

const RUN_COLUMNS: &str = "run_id, case_id, policy_id, policy_version, run_status, input_hash, \
     inputs_snapshot, decision, risk_level, confidence, summary, created_by, created_at, \
     completed_at";

// ── trait impls ───────────────────────────────────────────────────────

impl DecisionRunStore for SqliteDecisionStore {
    fn create_run(&self, run: &DecisionRun) -> VerdictResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO decision_runs (
                run_id, case_id, policy_id, policy_version, run_status, input_hash,
                inputs_snapshot, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.run_id,
                run.case_id,
                run.policy_id,
                run.policy_version,
                enum_str(&run.run_status)?,
                run.input_hash,
                json_str(&run.inputs_snapshot)?,
                run.created_by,
                run.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| to_store_err(e.to_string()))?;
        debug!(run_id = %run.run_id, case_id = %run.case_id, "decision run created");
        Ok(())
    }

    fn complete_run(
        &self,
        run_id: &str,
        decision: RunDecision,
        risk_level: Severity,
        confidence: f64,
        summary: &Value,
    ) -> VerdictResult<()> {
        let conn = self.conn()?;
        self.guarded_transition(&conn, run_id, RunStatus::Completed, |conn| {
            conn.execute(
                "UPDATE decision_runs
                 SET run_status = 'COMPLETED', decision = ?2, risk_level = ?3,
                     confidence = ?4, summary = ?5, completed_at = ?6
                 WHERE run_id = ?1 AND run_status = 'STARTED'",
                params![
                    run_id,
                    decision.as_str(),
                    risk_level.as_str(),
                    confidence,
                    json_str(summary)?,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| to_store_err(e.to_string()))
        })
    }

    fn fail_run(&self, run_id: &str, error: &str) -> VerdictResult<()> {
        let conn = self.conn()?;
        let summary = serde_json::json!({ "error": error });
        self.guarded_transition(&conn, run_id, RunStatus::Failed, |conn| {
            conn.execute(
                "UPDATE decision_runs
                 SET run_status = 'FAILED', summary = ?2, completed_at = ?3
                 WHERE run_id = ?1 AND run_status = 'STARTED'",
                params![run_id, json_str(&summary)?, Utc::now().to_rfc3339()],
            )
            .map_err(|e| to_store_err(e.to_string()))
        })
    }

    fn get_run(&self, run_id: &str) -> VerdictResult<Option<DecisionRun>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM decision_runs WHERE run_id = ?1"),
                params![run_id],
                RawRun::from_row,
            )
            .optional()
            .map_err(|e| to_store_err(e.to_string()))?;
        raw.map(RawRun::into_run).transpose()
    }

    fn get_latest_completed(&self, case_id: &str) -> VerdictResult<Option<DecisionRun>> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {RUN_COLUMNS} FROM decision_runs
                     WHERE case_id = ?1 AND run_status = 'COMPLETED'
                     ORDER BY completed_at DESC LIMIT 1"
                ),
                params![case_id],
                RawRun::from_row,
            )
            .optional()
            .map_err(|e| to_store_err(e.to_string()))?;
        raw.map(RawRun::into_run).transpose()
    }
}

impl SqliteDecisionStore {
    /// Run a transition UPDATE that is guarded on `run_status = 'STARTED'`.
    /// Zero affected rows means the run is missing or already terminal.
    fn guarded_transition(
        &self,
        conn: &Connection,
        run_id: &str,
        to: RunStatus,
        update: impl FnOnce(&Connection) -> VerdictResult<usize>,
    ) -> VerdictResult<()> {
        let affected = update(conn)?;
        if affected == 1 {
            return Ok(());
        }

        let current: Option<String> = conn
            .query_row(
                "SELECT run_status FROM decision_runs WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| to_store_err(e.to_string()))?;

        match current {
            None => Err(StoreError::RunNotFound {
                run_id: run_id.to_string(),
            }
            .into()),
            Some(from) => Err(StoreError::InvalidTransition {
                run_id: run_id.to_string(),
                from,
                to: to.as_str().to_string(),
            }
            .into()),
        }
    }
}

impl DecisionResultStore for SqliteDecisionStore {
    fn upsert_result(&self, result: &DecisionResult) -> VerdictResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO decision_results (
                result_id, run_id, group_id, decision_status, risk_level, confidence,
                reason_codes, fail_actions, trace, evidence_refs, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (run_id, group_id) DO UPDATE SET
                decision_status = excluded.decision_status,
                risk_level = excluded.risk_level,
                confidence = excluded.confidence,
                reason_codes = excluded.reason_codes,
                fail_actions = excluded.fail_actions,
                trace = excluded.trace,
                evidence_refs = excluded.evidence_refs,
                created_at = excluded.created_at",
            params![
                result.result_id,
                result.run_id,
                result.group_id,
                enum_str(&result.decision_status)?,
                result.risk_level.as_str(),
                result.confidence,
                json_str(&result.reason_codes)?,
                json_str(&result.fail_actions)?,
                json_str(&result.trace)?,
                json_str(&result.evidence_refs)?,
                result.created_by,
                result.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| to_store_err(e.to_string()))?;
        Ok(())
    }

    fn list_by_run(&self, run_id: &str) -> VerdictResult<Vec<DecisionResult>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT result_id, run_id, group_id, decision_status, risk_level, confidence,
                        reason_codes, fail_actions, trace, evidence_refs, created_by, created_at
                 FROM decision_results WHERE run_id = ?1 ORDER BY group_id",
            )
            .map_err(|e| to_store_err(e.to_string()))?;

        let raw_rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                    row.get::<_, String>(11)?,
                ))
            })
            .map_err(|e| to_store_err(e.to_string()))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| to_store_err(e.to_string()))?;

        let mut results = Vec::with_capacity(raw_rows.len());
        for row in raw_rows {
            results.push(DecisionResult {
                result_id: row.0,
                run_id: row.1,
                group_id: row.2,
                decision_status: enum_parse(&row.3)?,
                risk_level: enum_parse(&row.4)?,
                confidence: row.5,
                reason_codes: from_json(&row.6)?,
                fail_actions: from_json(&row.7)?,
                trace: from_json(&row.8)?,
                evidence_refs: from_json(&row.9)?,
                created_by: row.10,
                created_at: parse_timestamp(&row.11)?,
            });
        }
        Ok(results)
    }
}

impl AuditSink for SqliteDecisionStore {
    fn emit(&self, event: &AuditEvent) -> VerdictResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO audit_events (case_id, event_type, actor, run_id, payload, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.case_id,
                event.event_type.as_str(),
                event.actor,
                event.run_id,
                json_str(&event.payload)?,
                event.occurred_at.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::AuditUnavailable {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}
