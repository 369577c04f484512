//! Focus session lifecycle and the hardcore lock gate.
//!
//! The engine owns at most one [`ActiveSession`] and moves between two
//! states:
//!
//! ```text
//! Idle <-> Active
//! ```
//!
//! Commands mutate through `&mut self`; queries are snapshot reads that
//! derive Idle-ness from the captured end instant. The caller drives
//! expiry via [`SessionEngine::tick`], either from a periodic loop or
//! lazily before queries. A hardcore session can only be ended early
//! through a master password verified by the vault; no other path exists.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, ValidationError};
use crate::vault::PasswordVault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Manual,
    Scheduled,
    Pomodoro,
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionType::Manual => write!(f, "manual"),
            SessionType::Scheduled => write!(f, "scheduled"),
            SessionType::Pomodoro => write!(f, "pomodoro"),
        }
    }
}

/// Why a session left the Active state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// Ran to its captured end instant.
    Expired,
    /// Ended by the user before expiry.
    Cancelled,
    /// Hardcore session ended via verified master password.
    Unlocked,
    /// The governing schedule stopped matching.
    ScheduleEnded,
}

/// The single system-wide focus session. Callers receive clones; the
/// engine keeps the only mutable copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: String,
    pub name: String,
    pub session_type: SessionType,
    pub started_at: DateTime<Local>,
    pub ends_at: DateTime<Local>,
    pub hardcore: bool,
    /// Schedule that started this session, for Scheduled sessions.
    #[serde(default)]
    pub schedule_id: Option<String>,
}

impl ActiveSession {
    /// Seconds until the captured end instant, clamped at zero.
    pub fn remaining_secs(&self, now: DateTime<Local>) -> i64 {
        (self.ends_at - now).num_seconds().max(0)
    }

    pub fn is_expired(&self, now: DateTime<Local>) -> bool {
        now >= self.ends_at
    }
}

/// Request to start a session.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub name: String,
    pub duration: Duration,
    pub hardcore: bool,
    pub session_type: SessionType,
    pub schedule_id: Option<String>,
}

impl StartRequest {
    pub fn manual(name: impl Into<String>, minutes: i64, hardcore: bool) -> Self {
        Self {
            name: name.into(),
            duration: Duration::minutes(minutes),
            hardcore,
            session_type: SessionType::Manual,
            schedule_id: None,
        }
    }
}

/// Who asked for the start. The scheduler may replace a lower-priority
/// Scheduled session; direct callers never preempt anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOrigin {
    Direct,
    Scheduler,
}

/// Idle/Active state machine owning the session singleton.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionEngine {
    active: Option<ActiveSession>,
}

impl SessionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Snapshot of the held session, expired or not.
    pub fn current(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn is_active(&self, now: DateTime<Local>) -> bool {
        self.active.as_ref().is_some_and(|s| !s.is_expired(now))
    }

    /// `Some(seconds)` while a session is held, `None` when idle. An
    /// expired session reports `Some(0)` until `tick` collects it; it
    /// can never resurrect, the countdown only reads the captured end.
    pub fn time_remaining(&self, now: DateTime<Local>) -> Option<i64> {
        self.active.as_ref().map(|s| s.remaining_secs(now))
    }

    pub fn is_hardcore_locked(&self, now: DateTime<Local>) -> bool {
        self.active
            .as_ref()
            .is_some_and(|s| s.hardcore && !s.is_expired(now))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session. Fails with `SessionConflict` while one is
    /// running, unless the scheduler replaces a Scheduled session that
    /// ends earlier than the new one would. Manual and Pomodoro sessions
    /// are never preempted.
    pub fn start(
        &mut self,
        now: DateTime<Local>,
        req: StartRequest,
        origin: StartOrigin,
    ) -> Result<ActiveSession, CoreError> {
        if req.duration <= Duration::zero() {
            return Err(ValidationError::InvalidValue {
                field: "duration".into(),
                message: "must be positive".into(),
            }
            .into());
        }
        if let Some(current) = self.active.as_ref().filter(|s| !s.is_expired(now)) {
            let replaceable = origin == StartOrigin::Scheduler
                && current.session_type == SessionType::Scheduled
                && now + req.duration > current.ends_at;
            if !replaceable {
                return Err(CoreError::SessionConflict {
                    name: current.name.clone(),
                });
            }
        }
        let session = ActiveSession {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            session_type: req.session_type,
            started_at: now,
            ends_at: now + req.duration,
            hardcore: req.hardcore,
            schedule_id: req.schedule_id,
        };
        self.active = Some(session.clone());
        Ok(session)
    }

    /// End the current session through the hardcore gate.
    ///
    /// Idle is a no-op success. A non-hardcore session ends for any
    /// password argument. A hardcore session ends only via a verified
    /// master password: without override capability it stays locked
    /// until natural expiry (`HardcoreLocked`); a supplied password that
    /// fails verification returns `InvalidPassword` with state unchanged.
    pub fn end(
        &mut self,
        now: DateTime<Local>,
        password: Option<&str>,
        vault: &PasswordVault<'_>,
    ) -> Result<Option<(ActiveSession, EndReason)>, CoreError> {
        let Some(current) = self.active.clone() else {
            return Ok(None);
        };
        if current.is_expired(now) {
            self.active = None;
            return Ok(Some((current, EndReason::Expired)));
        }
        if !current.hardcore {
            self.active = None;
            return Ok(Some((current, EndReason::Cancelled)));
        }
        if !vault.is_set()? {
            return Err(CoreError::HardcoreLocked);
        }
        match password {
            None => Err(CoreError::HardcoreLocked),
            Some(p) => {
                if vault.verify(p)? {
                    self.active = None;
                    Ok(Some((current, EndReason::Unlocked)))
                } else {
                    Err(CoreError::InvalidPassword)
                }
            }
        }
    }

    /// Password-gated early termination. Identical to [`SessionEngine::end`]
    /// with a required password; there is no distinct bypass path.
    pub fn emergency_unlock(
        &mut self,
        now: DateTime<Local>,
        password: &str,
        vault: &PasswordVault<'_>,
    ) -> Result<Option<(ActiveSession, EndReason)>, CoreError> {
        self.end(now, Some(password), vault)
    }

    /// Collect a naturally expired session, returning it for logging.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<ActiveSession> {
        if self.active.as_ref().is_some_and(|s| s.is_expired(now)) {
            return self.active.take();
        }
        None
    }

    /// Build the record of an already-finished focus interval. Pomodoro
    /// work phases are logged retroactively this way; no live session is
    /// held while the timer ticks, so there is a single timer authority.
    pub fn record_completed(
        &self,
        now: DateTime<Local>,
        name: &str,
        duration_min: i64,
    ) -> ActiveSession {
        ActiveSession {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            session_type: SessionType::Pomodoro,
            started_at: now - Duration::minutes(duration_min),
            ends_at: now,
            hardcore: false,
            schedule_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    fn db() -> Database {
        Database::open_memory().unwrap()
    }

    #[test]
    fn start_and_natural_expiry() {
        let db = db();
        let vault = PasswordVault::new(&db);
        let mut engine = SessionEngine::new();
        let t0 = now();

        let session = engine
            .start(t0, StartRequest::manual("Deep work", 30, false), StartOrigin::Direct)
            .unwrap();
        assert_eq!(session.ends_at, t0 + Duration::minutes(30));
        assert_eq!(engine.time_remaining(t0), Some(30 * 60));
        assert!(engine.is_active(t0));

        // Expired but uncollected: reports zero and reads as idle.
        let t1 = t0 + Duration::minutes(31);
        assert_eq!(engine.time_remaining(t1), Some(0));
        assert!(!engine.is_active(t1));
        assert!(!engine.is_hardcore_locked(t1));

        let collected = engine.tick(t1).unwrap();
        assert_eq!(collected.id, session.id);
        assert_eq!(engine.time_remaining(t1), None);

        // Idle end is a no-op success.
        assert!(engine.end(t1, None, &vault).unwrap().is_none());
    }

    #[test]
    fn second_start_conflicts() {
        let mut engine = SessionEngine::new();
        let t0 = now();
        engine
            .start(t0, StartRequest::manual("One", 30, false), StartOrigin::Direct)
            .unwrap();
        let err = engine
            .start(t0, StartRequest::manual("Two", 30, false), StartOrigin::Direct)
            .unwrap_err();
        assert!(matches!(err, CoreError::SessionConflict { .. }));
    }

    #[test]
    fn non_hardcore_ends_for_any_password() {
        let db = db();
        let vault = PasswordVault::new(&db);
        let mut engine = SessionEngine::new();
        let t0 = now();
        engine
            .start(t0, StartRequest::manual("Open", 30, false), StartOrigin::Direct)
            .unwrap();
        let (_, reason) = engine
            .end(t0, Some("whatever"), &vault)
            .unwrap()
            .unwrap();
        assert_eq!(reason, EndReason::Cancelled);
        assert!(!engine.is_active(t0));
    }

    #[test]
    fn hardcore_without_capability_is_locked() {
        let db = db();
        let vault = PasswordVault::new(&db);
        let mut engine = SessionEngine::new();
        let t0 = now();
        engine
            .start(t0, StartRequest::manual("Locked", 60, true), StartOrigin::Direct)
            .unwrap();

        assert!(engine.is_hardcore_locked(t0));
        assert!(matches!(
            engine.end(t0, None, &vault),
            Err(CoreError::HardcoreLocked)
        ));
        // No password record: HardcoreLocked regardless of the value.
        assert!(matches!(
            engine.end(t0, Some("anything"), &vault),
            Err(CoreError::HardcoreLocked)
        ));
        assert!(engine.is_active(t0));
    }

    #[test]
    fn hardcore_unlocks_only_with_verified_password() {
        let db = db();
        let vault = PasswordVault::new(&db);
        vault.set("longenough1").unwrap();

        let mut engine = SessionEngine::new();
        let t0 = now();
        engine
            .start(t0, StartRequest::manual("Locked", 60, true), StartOrigin::Direct)
            .unwrap();

        assert!(matches!(
            engine.end(t0, None, &vault),
            Err(CoreError::HardcoreLocked)
        ));
        assert!(matches!(
            engine.emergency_unlock(t0, "wrong", &vault),
            Err(CoreError::InvalidPassword)
        ));
        assert!(engine.is_active(t0));

        let (_, reason) = engine
            .emergency_unlock(t0, "longenough1", &vault)
            .unwrap()
            .unwrap();
        assert_eq!(reason, EndReason::Unlocked);
        assert!(!engine.is_active(t0));
    }

    #[test]
    fn scheduler_replaces_only_shorter_scheduled_sessions() {
        let mut engine = SessionEngine::new();
        let t0 = now();
        let req = StartRequest {
            name: "Morning".into(),
            duration: Duration::hours(2),
            hardcore: false,
            session_type: SessionType::Scheduled,
            schedule_id: Some("a".into()),
        };
        engine.start(t0, req, StartOrigin::Scheduler).unwrap();

        // Shorter window loses.
        let shorter = StartRequest {
            name: "Short".into(),
            duration: Duration::hours(1),
            hardcore: false,
            session_type: SessionType::Scheduled,
            schedule_id: Some("b".into()),
        };
        assert!(engine
            .start(t0, shorter, StartOrigin::Scheduler)
            .is_err());

        // Longer window wins, but only for the scheduler.
        let longer = StartRequest {
            name: "Long".into(),
            duration: Duration::hours(3),
            hardcore: false,
            session_type: SessionType::Scheduled,
            schedule_id: Some("c".into()),
        };
        assert!(engine
            .start(t0, longer.clone(), StartOrigin::Direct)
            .is_err());
        let replaced = engine.start(t0, longer, StartOrigin::Scheduler).unwrap();
        assert_eq!(replaced.schedule_id.as_deref(), Some("c"));
    }

    #[test]
    fn manual_sessions_are_never_replaced() {
        let mut engine = SessionEngine::new();
        let t0 = now();
        engine
            .start(t0, StartRequest::manual("Mine", 30, false), StartOrigin::Direct)
            .unwrap();
        let req = StartRequest {
            name: "Window".into(),
            duration: Duration::hours(8),
            hardcore: false,
            session_type: SessionType::Scheduled,
            schedule_id: Some("s".into()),
        };
        assert!(engine.start(t0, req, StartOrigin::Scheduler).is_err());
    }

    #[test]
    fn record_completed_builds_finished_pomodoro_interval() {
        let engine = SessionEngine::new();
        let t0 = now();
        let record = engine.record_completed(t0, "Pomodoro", 25);
        assert_eq!(record.session_type, SessionType::Pomodoro);
        assert_eq!(record.started_at, t0 - Duration::minutes(25));
        assert_eq!(record.ends_at, t0);
        assert!(!record.hardcore);
        // Recording holds no live session.
        assert!(engine.current().is_none());
    }
}
