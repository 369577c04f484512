//! Cyclical work/break timer.
//!
//! A wall-clock state machine in two parts: pure configuration
//! ([`PomodoroConfig`]) and the ticking engine. No internal threads; the
//! caller invokes [`PomodoroEngine::tick`] periodically and elapsed time
//! is flushed from the injected instant with saturating arithmetic.
//!
//! The phase cycle is `Work -> (Break | LongBreak) -> Work -> ...`, with
//! the long break chosen every `sessions_until_long_break` completed
//! work phases. The engine never holds a live focus session while
//! ticking; a finished work phase is reported once so the caller can
//! record the interval retroactively.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroPhase {
    Work,
    Break,
    LongBreak,
}

/// Pure timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PomodoroConfig {
    pub work_min: u32,
    pub short_break_min: u32,
    pub long_break_min: u32,
    pub sessions_until_long_break: u32,
    pub sound_enabled: bool,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_min: 25,
            short_break_min: 5,
            long_break_min: 15,
            sessions_until_long_break: 4,
            sound_enabled: true,
        }
    }
}

impl PomodoroConfig {
    /// Full duration of a phase in seconds.
    pub fn phase_secs(&self, phase: PomodoroPhase) -> i64 {
        let minutes = match phase {
            PomodoroPhase::Work => self.work_min,
            PomodoroPhase::Break => self.short_break_min,
            PomodoroPhase::LongBreak => self.long_break_min,
        };
        i64::from(minutes) * 60
    }
}

/// Read-only view of the timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroState {
    pub phase: PomodoroPhase,
    /// Total finished work phases; monotonic, never reset.
    pub completed_sessions: u32,
    pub time_remaining_secs: i64,
    pub is_running: bool,
}

/// A finished phase, reported at most once per `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseCompletion {
    /// A work phase finished; the interval should be recorded.
    Work { minutes: u32 },
    Break,
    LongBreak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroEngine {
    config: PomodoroConfig,
    phase: PomodoroPhase,
    completed_sessions: u32,
    time_remaining_secs: i64,
    is_running: bool,
    /// Instant elapsed time was last flushed; `None` unless running.
    #[serde(default)]
    last_tick: Option<DateTime<Local>>,
}

impl PomodoroEngine {
    pub fn new(config: PomodoroConfig) -> Self {
        let time_remaining_secs = config.phase_secs(PomodoroPhase::Work);
        Self {
            config,
            phase: PomodoroPhase::Work,
            completed_sessions: 0,
            time_remaining_secs,
            is_running: false,
            last_tick: None,
        }
    }

    pub fn config(&self) -> &PomodoroConfig {
        &self.config
    }

    /// Snapshot with remaining time projected to `now` without mutating.
    pub fn state_at(&self, now: DateTime<Local>) -> PomodoroState {
        let mut remaining = self.time_remaining_secs;
        if self.is_running {
            if let Some(last) = self.last_tick {
                remaining = (remaining - (now - last).num_seconds().max(0)).max(0);
            }
        }
        PomodoroState {
            phase: self.phase,
            completed_sessions: self.completed_sessions,
            time_remaining_secs: remaining,
            is_running: self.is_running,
        }
    }

    pub fn start(&mut self, now: DateTime<Local>) {
        if !self.is_running {
            self.is_running = true;
            self.last_tick = Some(now);
        }
    }

    pub fn pause(&mut self, now: DateTime<Local>) {
        if self.is_running {
            self.flush_elapsed(now);
            self.is_running = false;
            self.last_tick = None;
        }
    }

    /// Restore the full duration of the current phase and stop the
    /// timer. Phase and completed count are untouched.
    pub fn reset(&mut self) {
        self.time_remaining_secs = self.config.phase_secs(self.phase);
        self.is_running = false;
        self.last_tick = None;
    }

    /// Swap in a new configuration. The remaining time snaps to the new
    /// duration of the current phase, running or not; in-progress
    /// elapsed time is discarded.
    pub fn configure(&mut self, now: DateTime<Local>, config: PomodoroConfig) {
        self.config = config;
        self.time_remaining_secs = self.config.phase_secs(self.phase);
        if self.is_running {
            self.last_tick = Some(now);
        }
    }

    /// Flush elapsed wall-clock time; reports at most one finished
    /// phase. A finished work phase stops the timer; a finished break
    /// rolls straight into the next work phase.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<PhaseCompletion> {
        if !self.is_running {
            return None;
        }
        self.flush_elapsed(now);
        if self.time_remaining_secs > 0 {
            return None;
        }
        Some(self.complete_phase())
    }

    fn flush_elapsed(&mut self, now: DateTime<Local>) {
        match self.last_tick {
            Some(last) => {
                let elapsed = (now - last).num_seconds();
                if elapsed > 0 {
                    self.time_remaining_secs = (self.time_remaining_secs - elapsed).max(0);
                    self.last_tick = Some(now);
                }
            }
            None => self.last_tick = Some(now),
        }
    }

    fn complete_phase(&mut self) -> PhaseCompletion {
        match self.phase {
            PomodoroPhase::Work => {
                self.is_running = false;
                self.last_tick = None;
                self.completed_sessions += 1;
                self.phase = if self.completed_sessions % self.config.sessions_until_long_break == 0
                {
                    PomodoroPhase::LongBreak
                } else {
                    PomodoroPhase::Break
                };
                self.time_remaining_secs = self.config.phase_secs(self.phase);
                PhaseCompletion::Work {
                    minutes: self.config.work_min,
                }
            }
            PomodoroPhase::Break | PomodoroPhase::LongBreak => {
                let finished = if self.phase == PomodoroPhase::Break {
                    PhaseCompletion::Break
                } else {
                    PhaseCompletion::LongBreak
                };
                self.phase = PomodoroPhase::Work;
                self.time_remaining_secs = self.config.phase_secs(PomodoroPhase::Work);
                finished
            }
        }
    }
}

impl Default for PomodoroEngine {
    fn default() -> Self {
        Self::new(PomodoroConfig::default())
    }
}
