use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

#[derive(Parser)]
#[command(name = "pomotick", version, about = "Pomotick focus timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the next interval, or resume a paused one
    Start {
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Pause the running interval
    Pause,
    /// End the current interval early
    End,
    /// Show the current interval
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Pomodoro and break totals per day
    Summary {
        /// Number of days, counting back from today
        #[arg(long, default_value_t = 7)]
        days: usize,
        #[arg(long)]
        json: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr; POMOTICK_LOG takes an EnvFilter directive.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("POMOTICK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Start { json } => commands::interval::start(json).await,
        Commands::Pause => commands::interval::pause(),
        Commands::End => commands::interval::end(),
        Commands::Status { json } => commands::interval::status(json),
        Commands::Summary { days, json } => commands::summary::run(days, json),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
