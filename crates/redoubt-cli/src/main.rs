use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "redoubt", version, about = "Redoubt focus protection CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Recurring schedule management
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Pomodoro timer control
    Pomodoro {
        #[command(subcommand)]
        action: commands::pomodoro::PomodoroAction,
    },
    /// Master password management
    Password {
        #[command(subcommand)]
        action: commands::password::PasswordAction,
    },
    /// Completed focus interval history
    History {
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the tick loop in the foreground
    Watch {
        /// Seconds between schedule evaluations (overrides config)
        #[arg(long)]
        interval: Option<u64>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Pomodoro { action } => commands::pomodoro::run(action),
        Commands::Password { action } => commands::password::run(action),
        Commands::History { limit, json } => commands::history::run(limit, json),
        Commands::Config { action } => commands::config::run(action),
        Commands::Watch { interval } => commands::watch::run(interval),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
