use clap::Subcommand;
use pomoflex_core::HistoryRange;

use crate::common::{open_context, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's statistics
    Today,
    /// This week's statistics
    Week,
    /// This month's statistics
    Month,
    /// All-time statistics
    All,
    /// Current continuous focus streak
    Streak,
}

pub fn run(action: StatsAction) -> CliResult {
    let (ctx, _) = open_context()?;
    let range = match action {
        StatsAction::Streak => return print_json(ctx.engine().streak()),
        StatsAction::Today => HistoryRange::Today,
        StatsAction::Week => HistoryRange::Week,
        StatsAction::Month => HistoryRange::Month,
        StatsAction::All => HistoryRange::All,
    };
    print_json(&ctx.stats(range))
}

pub fn history(range: HistoryRange) -> CliResult {
    let (ctx, _) = open_context()?;
    print_json(&ctx.history(range))
}
