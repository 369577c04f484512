//! # Redoubt Core Library
//!
//! This library provides the core business logic for Redoubt, a local
//! focus-protection engine. It implements a CLI-first philosophy where
//! all operations are available via a standalone CLI binary, with any
//! GUI shell being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Session Engine**: owns the single system-wide focus session and
//!   the hardcore lock gate; the caller drives expiry via `tick()`
//! - **Scheduler**: evaluates recurring windows against an injectable
//!   clock and starts/stops Scheduled sessions
//! - **Pomodoro Engine**: a wall-clock work/break cycle that logs
//!   completed work intervals retroactively
//! - **Password Vault**: salted, constant-time-verified master password
//!   backing the hardcore override
//! - **Storage**: SQLite schedules/log/state storage and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`FocusService`]: serialized operation surface over all engines
//! - [`SessionEngine`]: session lifecycle state machine
//! - [`PomodoroEngine`]: work/break timer
//! - [`Database`]: durable schedules, focus log, and key-value state

pub mod clock;
pub mod error;
pub mod events;
pub mod pomodoro;
pub mod schedule;
pub mod scheduler;
pub mod service;
pub mod session;
pub mod storage;
pub mod vault;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use pomodoro::{PomodoroConfig, PomodoroEngine, PomodoroPhase, PomodoroState};
pub use schedule::RecurringSchedule;
pub use scheduler::Scheduler;
pub use service::FocusService;
pub use session::{ActiveSession, EndReason, SessionEngine, SessionType};
pub use storage::{Config, Database, FocusLogEntry};
pub use vault::PasswordVault;
