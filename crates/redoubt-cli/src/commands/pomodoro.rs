use clap::Subcommand;
use redoubt_core::PomodoroConfig;

use super::common::open_service;

#[derive(Subcommand)]
pub enum PomodoroAction {
    /// Start or resume the timer
    Start,
    /// Pause the timer
    Pause,
    /// Restore the full duration of the current phase
    Reset,
    /// Update timer durations (minutes)
    Configure {
        #[arg(long, default_value = "25")]
        work: u32,
        #[arg(long, default_value = "5")]
        short_break: u32,
        #[arg(long, default_value = "15")]
        long_break: u32,
        /// Work phases until the long break
        #[arg(long, default_value = "4")]
        sessions: u32,
        /// Completion sound on/off
        #[arg(long)]
        sound: Option<bool>,
    },
    /// Print the timer state
    Status {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: PomodoroAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = open_service()?;
    match action {
        PomodoroAction::Start => {
            service.pomodoro_start()?;
            println!("pomodoro running");
        }
        PomodoroAction::Pause => {
            service.tick_timers()?;
            service.pomodoro_pause()?;
            println!("pomodoro paused");
        }
        PomodoroAction::Reset => {
            service.pomodoro_reset()?;
            println!("pomodoro reset");
        }
        PomodoroAction::Configure {
            work,
            short_break,
            long_break,
            sessions,
            sound,
        } => {
            let sound_enabled = sound.unwrap_or(service.pomodoro_config().sound_enabled);
            service.pomodoro_configure(PomodoroConfig {
                work_min: work,
                short_break_min: short_break,
                long_break_min: long_break,
                sessions_until_long_break: sessions,
                sound_enabled,
            })?;
            println!("pomodoro configured");
        }
        PomodoroAction::Status { json } => {
            // Flush elapsed time and fire any finished phases first.
            service.tick_timers()?;
            let state = service.pomodoro_state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                let phase = match state.phase {
                    redoubt_core::PomodoroPhase::Work => "work",
                    redoubt_core::PomodoroPhase::Break => "break",
                    redoubt_core::PomodoroPhase::LongBreak => "long break",
                };
                let running = if state.is_running { "running" } else { "paused" };
                println!(
                    "{phase} {}m{}s ({running}, {} completed)",
                    state.time_remaining_secs / 60,
                    state.time_remaining_secs % 60,
                    state.completed_sessions
                );
            }
        }
    }
    Ok(())
}
