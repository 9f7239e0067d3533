use clap::Subcommand;
use milkpail_core::format::{format_duration, format_one_decimal};
use milkpail_core::stats::local_date;
use milkpail_core::storage::Database;

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum RecordsAction {
    /// List saved play records
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every saved record
    Clear,
}

pub fn run(action: RecordsAction) -> CommandResult {
    let db = Database::open()?;

    match action {
        RecordsAction::List { json } => {
            let records = db.load_records()?;
            if json {
                return print_json(&records);
            }
            if records.is_empty() {
                println!("no records");
            }
            for r in &records {
                let day = local_date(r.timestamp_millis, &chrono::Local)
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{day}  {}  {} shakes  {}/s  {} bpm",
                    format_duration(r.spend_seconds as i64),
                    r.count,
                    format_one_decimal(r.frequency),
                    format_one_decimal(r.heart_rate),
                );
            }
        }
        RecordsAction::Clear => {
            db.clear_records()?;
            println!("records cleared");
        }
    }
    Ok(())
}
