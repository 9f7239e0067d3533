use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "milkpail", version, about = "Milkpail CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a sensor log as a free-play session and save the record
    Play(commands::play::PlayArgs),
    /// Saved play records
    Records {
        #[command(subcommand)]
        action: commands::records::RecordsAction,
    },
    /// Reports over saved records
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Frequency, edge and duration challenges
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Suggest detector settings from a recording
    Calibrate(commands::calibrate::CalibrateArgs),
    /// Test detector settings against a recording
    Detect(commands::detect::DetectArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Detector settings and sound
    Sensitivity {
        #[command(subcommand)]
        action: commands::sensitivity::SensitivityAction,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Logs go to stderr so stdout stays machine-readable. `MILKPAIL_LOG`
/// takes an `EnvFilter` directive, e.g. `milkpail_core=debug`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("MILKPAIL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Records { action } => commands::records::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Challenge { action } => commands::challenge::run(action),
        Commands::Calibrate(args) => commands::calibrate::run(args),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Sensitivity { action } => commands::sensitivity::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "milkpail", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
