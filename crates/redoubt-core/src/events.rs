use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::pomodoro::PomodoroPhase;
use crate::session::{EndReason, SessionType};

/// State changes produced by service ticks. Pollers print or forward
/// them; nothing is pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        id: String,
        name: String,
        session_type: SessionType,
        hardcore: bool,
        ends_at: DateTime<Local>,
        at: DateTime<Local>,
    },
    SessionEnded {
        id: String,
        name: String,
        reason: EndReason,
        at: DateTime<Local>,
    },
    /// A Pomodoro phase finished; `phase` is the phase that ended.
    PomodoroPhaseCompleted {
        phase: PomodoroPhase,
        completed_sessions: u32,
        at: DateTime<Local>,
    },
    /// A completed focus interval was written to the log.
    FocusIntervalRecorded {
        name: String,
        duration_min: i64,
        at: DateTime<Local>,
    },
}
