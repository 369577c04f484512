//! Operation surface and tick orchestration.
//!
//! [`FocusService`] is the single serializing component: it owns the
//! database, the engines, and the clock, and every mutation funnels
//! through `&mut self`, so no two mutating operations can interleave.
//! Callers that share a service across threads wrap it in one mutex.
//!
//! Engine state is persisted whole into the `kv` table after each
//! mutation, so an in-progress hardcore session survives a process
//! restart with its captured end intact. Queries are in-memory snapshot
//! reads and perform no I/O.

use std::sync::Arc;

use chrono::{DateTime, Local};
use log::warn;

use crate::clock::Clock;
use crate::error::{CoreError, ValidationError};
use crate::events::Event;
use crate::pomodoro::{PhaseCompletion, PomodoroConfig, PomodoroEngine, PomodoroPhase, PomodoroState};
use crate::schedule::RecurringSchedule;
use crate::scheduler::Scheduler;
use crate::session::{ActiveSession, EndReason, SessionEngine, StartOrigin, StartRequest};
use crate::storage::{Config, Database, FocusLogEntry};
use crate::vault::PasswordVault;

const KV_SESSION_ENGINE: &str = "session_engine";
const KV_POMODORO_ENGINE: &str = "pomodoro_engine";

pub struct FocusService {
    db: Database,
    clock: Arc<dyn Clock>,
    config: Config,
    session: SessionEngine,
    pomodoro: PomodoroEngine,
    scheduler: Scheduler,
}

impl FocusService {
    /// Build a service over an open database, restoring persisted
    /// engine state. Unreadable state falls back to a fresh engine.
    pub fn new(db: Database, clock: Arc<dyn Clock>, config: Config) -> Result<Self, CoreError> {
        let session = match db.kv_get(KV_SESSION_ENGINE)? {
            Some(json) => serde_json::from_str(&json).unwrap_or_default(),
            None => SessionEngine::new(),
        };
        let pomodoro = match db.kv_get(KV_POMODORO_ENGINE)? {
            Some(json) => serde_json::from_str(&json)
                .unwrap_or_else(|_| PomodoroEngine::new(config.pomodoro_config())),
            None => PomodoroEngine::new(config.pomodoro_config()),
        };
        Ok(Self {
            db,
            clock,
            config,
            session,
            pomodoro,
            scheduler: Scheduler::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    fn persist_engines(&self) -> Result<(), CoreError> {
        self.db
            .kv_set(KV_SESSION_ENGINE, &serde_json::to_string(&self.session)?)?;
        self.db
            .kv_set(KV_POMODORO_ENGINE, &serde_json::to_string(&self.pomodoro)?)?;
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Start a manual focus session.
    pub fn start_focus_session(
        &mut self,
        name: &str,
        duration_min: i64,
        hardcore: bool,
    ) -> Result<ActiveSession, CoreError> {
        let now = self.now();
        self.collect_expired(now);
        let session = self.session.start(
            now,
            StartRequest::manual(name, duration_min, hardcore),
            StartOrigin::Direct,
        )?;
        self.persist_engines()?;
        Ok(session)
    }

    /// End the current session through the hardcore gate. Idle is a
    /// no-op success.
    pub fn end_focus_session(&mut self, password: Option<&str>) -> Result<(), CoreError> {
        let now = self.now();
        self.collect_expired(now);
        let vault = PasswordVault::new(&self.db);
        let ended = self.session.end(now, password, &vault)?;
        if let Some((session, _)) = ended {
            if let Err(e) = self.db.record_focus_interval(&session, now) {
                warn!("failed to record focus interval: {e}");
            }
        }
        self.persist_engines()?;
        Ok(())
    }

    /// Identical to [`FocusService::end_focus_session`] with a required
    /// password.
    pub fn emergency_unlock(&mut self, password: &str) -> Result<(), CoreError> {
        self.end_focus_session(Some(password))
    }

    /// Snapshot of the running session, if any.
    pub fn active_session(&self) -> Option<ActiveSession> {
        let now = self.now();
        self.session
            .current()
            .filter(|s| !s.is_expired(now))
            .cloned()
    }

    /// `Some(seconds)` while a session is held; an expired session
    /// reports `Some(0)` until the next tick collects it.
    pub fn session_time_remaining(&self) -> Option<i64> {
        self.session.time_remaining(self.now())
    }

    pub fn is_hardcore_locked(&self) -> bool {
        self.session.is_hardcore_locked(self.now())
    }

    // ── Schedules ────────────────────────────────────────────────────

    pub fn add_schedule(&mut self, schedule: RecurringSchedule) -> Result<RecurringSchedule, CoreError> {
        schedule.validate()?;
        self.db.insert_schedule(&schedule)?;
        Ok(schedule)
    }

    pub fn list_schedules(&self) -> Result<Vec<RecurringSchedule>, CoreError> {
        Ok(self.db.list_schedules()?)
    }

    /// Replace a stored schedule. Takes effect on the next evaluation
    /// tick; a running session keeps its captured end.
    pub fn update_schedule(&mut self, schedule: RecurringSchedule) -> Result<(), CoreError> {
        schedule.validate()?;
        if !self.db.update_schedule(&schedule)? {
            return Err(CoreError::ScheduleNotFound(schedule.id));
        }
        Ok(())
    }

    pub fn delete_schedule(&mut self, id: &str) -> Result<(), CoreError> {
        if !self.db.delete_schedule(id)? {
            return Err(CoreError::ScheduleNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn set_schedule_enabled(&mut self, id: &str, enabled: bool) -> Result<(), CoreError> {
        if !self.db.set_schedule_enabled(id, enabled)? {
            return Err(CoreError::ScheduleNotFound(id.to_string()));
        }
        Ok(())
    }

    // ── Pomodoro ─────────────────────────────────────────────────────

    pub fn pomodoro_start(&mut self) -> Result<(), CoreError> {
        let now = self.now();
        self.pomodoro.start(now);
        self.persist_engines()
    }

    pub fn pomodoro_pause(&mut self) -> Result<(), CoreError> {
        let now = self.now();
        self.pomodoro.pause(now);
        self.persist_engines()
    }

    pub fn pomodoro_reset(&mut self) -> Result<(), CoreError> {
        self.pomodoro.reset();
        self.persist_engines()
    }

    pub fn pomodoro_configure(&mut self, config: PomodoroConfig) -> Result<(), CoreError> {
        if config.sessions_until_long_break == 0 {
            return Err(ValidationError::InvalidValue {
                field: "sessions_until_long_break".into(),
                message: "must be at least 1".into(),
            }
            .into());
        }
        if config.work_min == 0 || config.short_break_min == 0 || config.long_break_min == 0 {
            return Err(ValidationError::InvalidValue {
                field: "durations".into(),
                message: "must be positive".into(),
            }
            .into());
        }
        let now = self.now();
        self.pomodoro.configure(now, config);
        self.persist_engines()
    }

    pub fn pomodoro_state(&self) -> PomodoroState {
        self.pomodoro.state_at(self.now())
    }

    pub fn pomodoro_config(&self) -> PomodoroConfig {
        self.pomodoro.config().clone()
    }

    // ── Master password ──────────────────────────────────────────────

    pub fn set_master_password(&mut self, password: &str) -> Result<(), CoreError> {
        PasswordVault::new(&self.db).set(password)
    }

    pub fn verify_master_password(&self, password: &str) -> Result<bool, CoreError> {
        Ok(PasswordVault::new(&self.db).verify(password)?)
    }

    pub fn has_master_password(&self) -> Result<bool, CoreError> {
        Ok(PasswordVault::new(&self.db).is_set()?)
    }

    pub fn clear_master_password(&mut self) -> Result<(), CoreError> {
        Ok(PasswordVault::new(&self.db).clear()?)
    }

    // ── History ──────────────────────────────────────────────────────

    pub fn recent_focus_intervals(&self, limit: u32) -> Result<Vec<FocusLogEntry>, CoreError> {
        Ok(self.db.recent_focus_intervals(limit)?)
    }

    // ── Ticks ────────────────────────────────────────────────────────

    /// Timer-only tick: collect an expired session and advance the
    /// Pomodoro engine. Cheap enough for a one-second driver.
    pub fn tick_timers(&mut self) -> Result<Vec<Event>, CoreError> {
        let now = self.now();
        let mut events = Vec::new();
        if let Some(ev) = self.collect_expired(now) {
            events.push(ev);
        }
        events.extend(self.tick_pomodoro(now));
        self.persist_engines()?;
        Ok(events)
    }

    /// Full tick: timers plus one scheduler evaluation over the stored
    /// schedules, so schedule edits apply here. Meant for a 30-60s
    /// driver, or lazily before answering a status query.
    pub fn tick(&mut self) -> Result<Vec<Event>, CoreError> {
        let now = self.now();
        let mut events = Vec::new();
        if let Some(ev) = self.collect_expired(now) {
            events.push(ev);
        }
        events.extend(self.tick_pomodoro(now));
        events.extend(self.evaluate_schedules(now));
        self.persist_engines()?;
        Ok(events)
    }

    /// Collect a naturally expired session into the focus log.
    fn collect_expired(&mut self, now: DateTime<Local>) -> Option<Event> {
        let ended = self.session.tick(now)?;
        if let Err(e) = self.db.record_focus_interval(&ended, ended.ends_at) {
            warn!("failed to record focus interval: {e}");
        }
        Some(Event::SessionEnded {
            id: ended.id,
            name: ended.name,
            reason: EndReason::Expired,
            at: now,
        })
    }

    fn tick_pomodoro(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(completion) = self.pomodoro.tick(now) else {
            return events;
        };
        let completed_sessions = self.pomodoro.state_at(now).completed_sessions;
        match completion {
            PhaseCompletion::Work { minutes } => {
                // Log the finished interval retroactively; the timer
                // never held a live session.
                let record = self
                    .session
                    .record_completed(now, "Pomodoro", i64::from(minutes));
                if let Err(e) = self.db.record_focus_interval(&record, now) {
                    warn!("failed to record pomodoro interval: {e}");
                }
                events.push(Event::PomodoroPhaseCompleted {
                    phase: PomodoroPhase::Work,
                    completed_sessions,
                    at: now,
                });
                events.push(Event::FocusIntervalRecorded {
                    name: record.name,
                    duration_min: i64::from(minutes),
                    at: now,
                });
            }
            PhaseCompletion::Break => events.push(Event::PomodoroPhaseCompleted {
                phase: PomodoroPhase::Break,
                completed_sessions,
                at: now,
            }),
            PhaseCompletion::LongBreak => events.push(Event::PomodoroPhaseCompleted {
                phase: PomodoroPhase::LongBreak,
                completed_sessions,
                at: now,
            }),
        }
        events
    }

    fn evaluate_schedules(&mut self, now: DateTime<Local>) -> Vec<Event> {
        // Re-read durable schedules every pass so edits apply on the
        // next tick. A failed read is transient: skip this pass and
        // leave the in-memory snapshot untouched.
        match self.db.list_schedules() {
            Ok(schedules) => {
                let vault = PasswordVault::new(&self.db);
                self.scheduler
                    .evaluate(&mut self.session, &schedules, now, &vault)
            }
            Err(e) => {
                warn!("schedule evaluation skipped: {e}");
                Vec::new()
            }
        }
    }
}
