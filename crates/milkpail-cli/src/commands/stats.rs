use clap::Subcommand;
use milkpail_core::storage::Database;
use milkpail_core::{Overview, Report, ReportPeriod};

use super::{now_millis, print_json, CommandResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Weekly verdict and title
    Overview,
    /// Today's report
    Daily,
    /// Last 7 days, with per-day averages
    Weekly,
    /// Last 30 days, with per-day averages
    Monthly,
}

pub fn run(action: StatsAction) -> CommandResult {
    let db = Database::open()?;
    let records = db.load_records()?;
    let now = now_millis();

    let period = match action {
        StatsAction::Overview => return print_json(&Overview::build(&records, now)),
        StatsAction::Daily => ReportPeriod::Daily,
        StatsAction::Weekly => ReportPeriod::Weekly,
        StatsAction::Monthly => ReportPeriod::Monthly,
    };
    let report = Report::build(period, &records, now, &chrono::Local);
    print_json(&report)
}
