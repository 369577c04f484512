//! SQLite-backed durable state.
//!
//! Stores:
//! - Recurring schedules
//! - The completed-focus log
//! - A key-value table holding the master-password record and the
//!   serialized engine state
//!
//! Schedule times are stored as `HH:MM` text and weekday sets as
//! comma-joined short names, with lenient row parsing: a malformed
//! column falls back to a neutral value rather than poisoning the list.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveTime, Weekday};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;
use crate::schedule::{format_weekday, parse_weekday, RecurringSchedule};
use crate::session::{ActiveSession, SessionType};

use super::data_dir;

// === Helper Functions ===

fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Parse a stored `HH:MM` with fallback to midnight.
fn parse_time_fallback(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap_or_else(|_| NaiveTime::MIN)
}

fn format_days(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| format_weekday(*d))
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_days(s: &str) -> Vec<Weekday> {
    s.split(',').filter_map(parse_weekday).collect()
}

fn format_session_type(session_type: SessionType) -> &'static str {
    match session_type {
        SessionType::Manual => "manual",
        SessionType::Scheduled => "scheduled",
        SessionType::Pomodoro => "pomodoro",
    }
}

fn parse_session_type(s: &str) -> SessionType {
    match s {
        "scheduled" => SessionType::Scheduled,
        "pomodoro" => SessionType::Pomodoro,
        _ => SessionType::Manual,
    }
}

/// Parse a stored RFC3339 datetime with fallback to the current time.
fn parse_datetime_fallback(s: &str) -> DateTime<Local> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Local))
        .unwrap_or_else(|_| Local::now())
}

fn row_to_schedule(row: &rusqlite::Row) -> Result<RecurringSchedule, rusqlite::Error> {
    let start_str: String = row.get(2)?;
    let end_str: String = row.get(3)?;
    let days_str: String = row.get(4)?;
    let created_str: String = row.get(7)?;
    Ok(RecurringSchedule {
        id: row.get(0)?,
        name: row.get(1)?,
        start: parse_time_fallback(&start_str),
        end: parse_time_fallback(&end_str),
        days: parse_days(&days_str),
        hardcore: row.get(5)?,
        enabled: row.get(6)?,
        created_at: parse_datetime_fallback(&created_str),
    })
}

/// A durable record of a completed focus interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusLogEntry {
    pub id: i64,
    pub session_id: String,
    pub name: String,
    pub session_type: SessionType,
    pub hardcore: bool,
    pub duration_min: i64,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}

/// SQLite database for schedules, the focus log, and key-value state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/redoubt/redoubt.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let dir = data_dir().map_err(|e| DatabaseError::DataDir(e.to_string()))?;
        Self::open_at(dir.join("redoubt.db"))
    }

    /// Open a database at an explicit path. Integration tests point this
    /// at a temporary directory.
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();
        let conn =
            Connection::open(&path).map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schedules (
                    id          TEXT PRIMARY KEY,
                    name        TEXT NOT NULL,
                    start_time  TEXT NOT NULL,
                    end_time    TEXT NOT NULL,
                    days        TEXT NOT NULL,
                    hardcore    INTEGER NOT NULL DEFAULT 0,
                    enabled     INTEGER NOT NULL DEFAULT 1,
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS focus_log (
                    id           INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id   TEXT NOT NULL,
                    name         TEXT NOT NULL,
                    session_type TEXT NOT NULL,
                    hardcore     INTEGER NOT NULL DEFAULT 0,
                    duration_min INTEGER NOT NULL,
                    started_at   TEXT NOT NULL,
                    ended_at     TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                -- Indexes for the common query patterns
                CREATE INDEX IF NOT EXISTS idx_focus_log_ended_at ON focus_log(ended_at);
                CREATE INDEX IF NOT EXISTS idx_schedules_enabled ON schedules(enabled);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Schedules ────────────────────────────────────────────────────

    pub fn insert_schedule(&self, schedule: &RecurringSchedule) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO schedules (id, name, start_time, end_time, days, hardcore, enabled, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                schedule.id,
                schedule.name,
                format_time(schedule.start),
                format_time(schedule.end),
                format_days(&schedule.days),
                schedule.hardcore,
                schedule.enabled,
                schedule.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_schedules(&self) -> Result<Vec<RecurringSchedule>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, start_time, end_time, days, hardcore, enabled, created_at
             FROM schedules ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], row_to_schedule)?;
        let mut schedules = Vec::new();
        for row in rows {
            schedules.push(row?);
        }
        Ok(schedules)
    }

    pub fn get_schedule(&self, id: &str) -> Result<Option<RecurringSchedule>, DatabaseError> {
        let schedule = self
            .conn
            .query_row(
                "SELECT id, name, start_time, end_time, days, hardcore, enabled, created_at
                 FROM schedules WHERE id = ?1",
                params![id],
                row_to_schedule,
            )
            .optional()?;
        Ok(schedule)
    }

    /// Returns `false` when the id is unknown.
    pub fn update_schedule(&self, schedule: &RecurringSchedule) -> Result<bool, DatabaseError> {
        let rows = self.conn.execute(
            "UPDATE schedules
             SET name = ?2, start_time = ?3, end_time = ?4, days = ?5, hardcore = ?6, enabled = ?7
             WHERE id = ?1",
            params![
                schedule.id,
                schedule.name,
                format_time(schedule.start),
                format_time(schedule.end),
                format_days(&schedule.days),
                schedule.hardcore,
                schedule.enabled,
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_schedule(&self, id: &str) -> Result<bool, DatabaseError> {
        let rows = self
            .conn
            .execute("DELETE FROM schedules WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn set_schedule_enabled(&self, id: &str, enabled: bool) -> Result<bool, DatabaseError> {
        let rows = self.conn.execute(
            "UPDATE schedules SET enabled = ?2 WHERE id = ?1",
            params![id, enabled],
        )?;
        Ok(rows > 0)
    }

    // ── Focus log ────────────────────────────────────────────────────

    /// Record a finished focus interval. `ended_at` is the actual end,
    /// which for a cancelled session precedes the captured end instant.
    pub fn record_focus_interval(
        &self,
        session: &ActiveSession,
        ended_at: DateTime<Local>,
    ) -> Result<i64, DatabaseError> {
        let duration_min = (ended_at - session.started_at).num_minutes().max(0);
        self.conn.execute(
            "INSERT INTO focus_log (session_id, name, session_type, hardcore, duration_min, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id,
                session.name,
                format_session_type(session.session_type),
                session.hardcore,
                duration_min,
                session.started_at.to_rfc3339(),
                ended_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn recent_focus_intervals(&self, limit: u32) -> Result<Vec<FocusLogEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, name, session_type, hardcore, duration_min, started_at, ended_at
             FROM focus_log ORDER BY ended_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let type_str: String = row.get(3)?;
            let started_str: String = row.get(6)?;
            let ended_str: String = row.get(7)?;
            Ok(FocusLogEntry {
                id: row.get(0)?,
                session_id: row.get(1)?,
                name: row.get(2)?,
                session_type: parse_session_type(&type_str),
                hardcore: row.get(4)?,
                duration_min: row.get(5)?,
                started_at: parse_datetime_fallback(&started_str),
                ended_at: parse_datetime_fallback(&ended_str),
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    // ── Key-value state ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_schedule() -> RecurringSchedule {
        RecurringSchedule::new(
            "Morning focus",
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            vec![Weekday::Mon, Weekday::Wed],
            true,
        )
    }

    #[test]
    fn schedule_round_trip() {
        let db = Database::open_memory().unwrap();
        let schedule = sample_schedule();
        db.insert_schedule(&schedule).unwrap();

        let listed = db.list_schedules().unwrap();
        assert_eq!(listed.len(), 1);
        let got = &listed[0];
        assert_eq!(got.id, schedule.id);
        assert_eq!(got.name, "Morning focus");
        assert_eq!(got.start, schedule.start);
        assert_eq!(got.end, schedule.end);
        assert_eq!(got.days, vec![Weekday::Mon, Weekday::Wed]);
        assert!(got.hardcore);
        assert!(got.enabled);
    }

    #[test]
    fn update_and_delete_report_missing_ids() {
        let db = Database::open_memory().unwrap();
        let mut schedule = sample_schedule();
        assert!(!db.update_schedule(&schedule).unwrap());
        assert!(!db.delete_schedule(&schedule.id).unwrap());

        db.insert_schedule(&schedule).unwrap();
        schedule.name = "Renamed".into();
        schedule.enabled = false;
        assert!(db.update_schedule(&schedule).unwrap());

        let got = db.get_schedule(&schedule.id).unwrap().unwrap();
        assert_eq!(got.name, "Renamed");
        assert!(!got.enabled);

        assert!(db.set_schedule_enabled(&schedule.id, true).unwrap());
        assert!(db.delete_schedule(&schedule.id).unwrap());
        assert!(db.get_schedule(&schedule.id).unwrap().is_none());
    }

    #[test]
    fn focus_log_records_and_lists_recent_first() {
        let db = Database::open_memory().unwrap();
        let t0 = Local.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let session = ActiveSession {
            id: "s1".into(),
            name: "Deep work".into(),
            session_type: SessionType::Manual,
            started_at: t0,
            ends_at: t0 + chrono::Duration::minutes(30),
            hardcore: false,
            schedule_id: None,
        };
        // Cancelled ten minutes in.
        db.record_focus_interval(&session, t0 + chrono::Duration::minutes(10))
            .unwrap();

        let later = ActiveSession {
            id: "s2".into(),
            started_at: t0 + chrono::Duration::hours(1),
            ends_at: t0 + chrono::Duration::hours(2),
            ..session.clone()
        };
        db.record_focus_interval(&later, later.ends_at).unwrap();

        let entries = db.recent_focus_intervals(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].session_id, "s2");
        assert_eq!(entries[0].duration_min, 60);
        assert_eq!(entries[1].session_id, "s1");
        assert_eq!(entries[1].duration_min, 10);
    }

    #[test]
    fn kv_store_round_trip() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "replaced").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "replaced");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }
}
