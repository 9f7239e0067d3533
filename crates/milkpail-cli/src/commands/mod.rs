pub mod calibrate;
pub mod challenge;
pub mod config;
pub mod detect;
pub mod play;
pub mod records;
pub mod sensitivity;
pub mod stats;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use milkpail_core::feedback::{dispatch, TracingSink};
use milkpail_core::{Event, LogSource};
use serde::Serialize;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open a JSON-lines sensor log; `-` reads stdin.
pub fn open_log(path: &Path) -> milkpail_core::error::Result<LogSource> {
    let source = if path == Path::new("-") {
        LogSource::from_reader(std::io::stdin().lock())?
    } else {
        LogSource::from_reader(BufReader::new(File::open(path)?))?
    };
    tracing::debug!(path = %path.display(), readings = source.len(), "sensor log loaded");
    Ok(source)
}

/// Hand cues to the feedback sink and optionally echo every event as a JSON line.
pub fn emit_events(events: &[Event], echo: bool) -> CommandResult {
    dispatch(events, &mut TracingSink);
    if echo {
        for event in events {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
