use std::path::PathBuf;

use clap::Args;
use milkpail_core::{replay_calibration, CalibrationReport, Config, Event};
use serde::Serialize;

use super::{emit_events, open_log, print_json, CommandResult};

#[derive(Args)]
pub struct CalibrateArgs {
    /// Sensor log (JSON lines) of ~15 s of natural shaking, `-` for stdin
    #[arg(long, short)]
    input: PathBuf,
    /// Save the suggestion to the config
    #[arg(long)]
    apply: bool,
}

#[derive(Serialize)]
struct CalibrateOutput {
    #[serde(flatten)]
    report: CalibrationReport,
    applied: bool,
}

pub fn run(args: CalibrateArgs) -> CommandResult {
    let mut config = Config::load()?;
    let mut source = open_log(&args.input)?;

    let report = replay_calibration(&mut source, config.sensitivity())?;
    emit_events(
        &[Event::CalibrationCompleted {
            report: report.clone(),
        }],
        false,
    )?;

    if args.apply {
        config.apply_suggestion(report.suggestion);
        config.save()?;
    }
    print_json(&CalibrateOutput {
        report,
        applied: args.apply,
    })
}
