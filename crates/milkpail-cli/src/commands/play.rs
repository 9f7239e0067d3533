use std::path::PathBuf;

use clap::Args;
use milkpail_core::storage::Database;
use milkpail_core::{replay_session, Config};

use super::{emit_events, now_millis, open_log, print_json, CommandResult};

#[derive(Args)]
pub struct PlayArgs {
    /// Sensor log (JSON lines), `-` for stdin
    #[arg(long, short)]
    input: PathBuf,
    /// Do not save the record
    #[arg(long)]
    no_save: bool,
    /// Print every event as a JSON line before the record
    #[arg(long)]
    events: bool,
}

pub fn run(args: PlayArgs) -> CommandResult {
    let config = Config::load()?;
    let mut source = open_log(&args.input)?;

    let outcome = replay_session(
        &mut source,
        config.sensitivity(),
        config.sound_enabled(),
        now_millis(),
    )?;
    emit_events(&outcome.events, args.events)?;

    if !args.no_save {
        let db = Database::open()?;
        db.append_record(&outcome.record)?;
    }
    print_json(&outcome.record)
}
