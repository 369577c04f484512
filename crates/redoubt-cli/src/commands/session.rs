use clap::Subcommand;

use super::common::open_service;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a focus session
    Start {
        /// Session name
        name: String,
        /// Duration in minutes (defaults to config)
        #[arg(long)]
        minutes: Option<i64>,
        /// Hardcore: no early exit without the master password
        #[arg(long)]
        hardcore: bool,
    },
    /// End the current session (hardcore needs --password)
    End {
        #[arg(long)]
        password: Option<String>,
    },
    /// Emergency unlock of a hardcore session
    Unlock {
        #[arg(long)]
        password: String,
    },
    /// Print the current session state
    Status {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = open_service()?;
    match action {
        SessionAction::Start {
            name,
            minutes,
            hardcore,
        } => {
            let minutes = minutes.unwrap_or(service.config().session.default_duration_min);
            let session = service.start_focus_session(&name, minutes, hardcore)?;
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        SessionAction::End { password } => {
            service.end_focus_session(password.as_deref())?;
            println!("session ended");
        }
        SessionAction::Unlock { password } => {
            service.emergency_unlock(&password)?;
            println!("session unlocked");
        }
        SessionAction::Status { json } => {
            // Lazy tick: expire sessions and let the scheduler act
            // before answering.
            service.tick()?;
            match service.active_session() {
                Some(session) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&session)?);
                    } else {
                        let remaining = service.session_time_remaining().unwrap_or(0);
                        let lock = if service.is_hardcore_locked() {
                            " [hardcore]"
                        } else {
                            ""
                        };
                        println!(
                            "{} ({}) {}m{}s remaining{}",
                            session.name,
                            session.session_type,
                            remaining / 60,
                            remaining % 60,
                            lock
                        );
                    }
                }
                None => {
                    if json {
                        println!("null");
                    } else {
                        println!("no active session");
                    }
                }
            }
        }
    }
    Ok(())
}
