use std::path::PathBuf;

use clap::Args;
use milkpail_core::{replay_detection, Config, Sensitivity};

use super::{emit_events, open_log, print_json, CommandResult};

#[derive(Args)]
pub struct DetectArgs {
    /// Sensor log (JSON lines), `-` for stdin
    #[arg(long, short)]
    input: PathBuf,
    /// Try an acceleration threshold without saving it
    #[arg(long)]
    acceleration: Option<f32>,
    /// Try a time threshold (seconds) without saving it
    #[arg(long)]
    time: Option<f32>,
    /// Print every shake as a JSON line
    #[arg(long)]
    events: bool,
}

pub fn run(args: DetectArgs) -> CommandResult {
    let saved = Config::load()?.sensitivity();
    let sensitivity = Sensitivity::new(
        args.acceleration.unwrap_or(saved.acceleration_threshold),
        args.time.unwrap_or(saved.time_threshold),
    );

    let mut source = open_log(&args.input)?;
    let (summary, shakes) = replay_detection(&mut source, sensitivity)?;
    emit_events(&shakes, args.events)?;
    print_json(&summary)
}
