//! Recurring-schedule evaluation.
//!
//! Runs on a low-frequency tick: computes the set of schedules matching
//! the current instant, picks a single governing window, and asks the
//! session engine to start or end Scheduled sessions. Manual and
//! Pomodoro sessions always outrank schedules and are never preempted.

use chrono::{DateTime, Duration, Local};
use log::{debug, warn};

use crate::error::CoreError;
use crate::events::Event;
use crate::schedule::RecurringSchedule;
use crate::session::{EndReason, SessionEngine, SessionType, StartOrigin, StartRequest};
use crate::vault::PasswordVault;

/// Evaluates recurring schedules against the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// One evaluation pass. Returns events for any start or stop it
    /// caused; the pass itself never fails, a rejected mutation is
    /// logged and retried naturally on the next tick.
    pub fn evaluate(
        &self,
        engine: &mut SessionEngine,
        schedules: &[RecurringSchedule],
        now: DateTime<Local>,
        vault: &PasswordVault<'_>,
    ) -> Vec<Event> {
        let mut events = Vec::new();

        // Among multiple matches the longest remaining window governs;
        // for non-wrapping windows that is exactly "latest end time".
        let winner = schedules
            .iter()
            .filter_map(|s| s.remaining_secs(now).map(|secs| (s, secs)))
            .max_by_key(|(_, secs)| *secs);

        if let Some(current) = engine.current().filter(|s| !s.is_expired(now)).cloned() {
            match current.session_type {
                SessionType::Manual | SessionType::Pomodoro => return events,
                SessionType::Scheduled => {}
            }

            if let Some((schedule, secs)) = winner {
                if Some(schedule.id.as_str()) == current.schedule_id.as_deref() {
                    // The winning schedule already governs; no churn.
                    return events;
                }
                if now + Duration::seconds(secs) > current.ends_at {
                    match engine.start(now, start_request(schedule, secs), StartOrigin::Scheduler)
                    {
                        Ok(session) => {
                            debug!(
                                "schedule '{}' took over the focus window until {}",
                                schedule.name, session.ends_at
                            );
                            events.push(started_event(&session, now));
                        }
                        Err(e) => warn!("scheduler could not replace session: {e}"),
                    }
                    return events;
                }
            }

            let governing_matches = current
                .schedule_id
                .as_deref()
                .and_then(|id| schedules.iter().find(|s| s.id == id))
                .map(|s| s.matches(now))
                .unwrap_or(false);
            if !governing_matches {
                // The window closed early (schedule edited or disabled).
                // This still passes the hardcore gate; a locked session
                // runs to its captured end.
                match engine.end(now, None, vault) {
                    Ok(Some((session, _))) => {
                        debug!("schedule window for '{}' closed", session.name);
                        events.push(Event::SessionEnded {
                            id: session.id,
                            name: session.name,
                            reason: EndReason::ScheduleEnded,
                            at: now,
                        });
                    }
                    Ok(None) => {}
                    Err(CoreError::HardcoreLocked) => {
                        debug!("window closed but session is hardcore; waiting for expiry");
                    }
                    Err(e) => warn!("scheduler could not end session: {e}"),
                }
            }
            return events;
        }

        // Idle: open the winning window.
        if let Some((schedule, secs)) = winner {
            match engine.start(now, start_request(schedule, secs), StartOrigin::Scheduler) {
                Ok(session) => {
                    debug!(
                        "schedule '{}' opened a focus window until {}",
                        schedule.name, session.ends_at
                    );
                    events.push(started_event(&session, now));
                }
                Err(e) => warn!("scheduler could not start session: {e}"),
            }
        }
        events
    }
}

fn start_request(schedule: &RecurringSchedule, remaining_secs: i64) -> StartRequest {
    StartRequest {
        name: schedule.name.clone(),
        duration: Duration::seconds(remaining_secs),
        hardcore: schedule.hardcore,
        session_type: SessionType::Scheduled,
        schedule_id: Some(schedule.id.clone()),
    }
}

fn started_event(session: &crate::session::ActiveSession, now: DateTime<Local>) -> Event {
    Event::SessionStarted {
        id: session.id.clone(),
        name: session.name.clone(),
        session_type: session.session_type,
        hardcore: session.hardcore,
        ends_at: session.ends_at,
        at: now,
    }
}
