use chrono::NaiveTime;
use clap::Subcommand;
use redoubt_core::schedule::{format_weekday, parse_weekday};
use redoubt_core::RecurringSchedule;

use super::common::open_service;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Add a recurring schedule
    Add {
        /// Schedule name
        name: String,
        /// Window start, HH:MM
        #[arg(long)]
        start: String,
        /// Window end, HH:MM (an end before the start spans midnight)
        #[arg(long)]
        end: String,
        /// Comma-separated weekdays, e.g. mon,tue,fri
        #[arg(long)]
        days: String,
        /// Sessions from this schedule are hardcore
        #[arg(long)]
        hardcore: bool,
    },
    /// List schedules
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete a schedule
    Remove { id: String },
    /// Enable a schedule
    Enable { id: String },
    /// Disable a schedule
    Disable { id: String },
}

fn parse_time_arg(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| format!("invalid time '{value}': {e}"))
}

fn parse_days_arg(value: &str) -> Result<Vec<chrono::Weekday>, String> {
    value
        .split(',')
        .map(|part| parse_weekday(part).ok_or_else(|| format!("unknown weekday '{part}'")))
        .collect()
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut service = open_service()?;
    match action {
        ScheduleAction::Add {
            name,
            start,
            end,
            days,
            hardcore,
        } => {
            let schedule = RecurringSchedule::new(
                name,
                parse_time_arg(&start)?,
                parse_time_arg(&end)?,
                parse_days_arg(&days)?,
                hardcore,
            );
            let schedule = service.add_schedule(schedule)?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        ScheduleAction::List { json } => {
            let schedules = service.list_schedules()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&schedules)?);
            } else if schedules.is_empty() {
                println!("no schedules");
            } else {
                for s in schedules {
                    let days = s
                        .days
                        .iter()
                        .map(|d| format_weekday(*d))
                        .collect::<Vec<_>>()
                        .join(",");
                    let mut flags = String::new();
                    if s.hardcore {
                        flags.push_str(" [hardcore]");
                    }
                    if !s.enabled {
                        flags.push_str(" [disabled]");
                    }
                    println!(
                        "{}  {}  {}-{}  {}{}",
                        s.id,
                        s.name,
                        s.start.format("%H:%M"),
                        s.end.format("%H:%M"),
                        days,
                        flags
                    );
                }
            }
        }
        ScheduleAction::Remove { id } => {
            service.delete_schedule(&id)?;
            println!("schedule removed");
        }
        ScheduleAction::Enable { id } => {
            service.set_schedule_enabled(&id, true)?;
            println!("schedule enabled");
        }
        ScheduleAction::Disable { id } => {
            service.set_schedule_enabled(&id, false)?;
            println!("schedule disabled");
        }
    }
    Ok(())
}
