use clap::Subcommand;
use pomoflex_core::Action;

use crate::common::{open_context, print_json, report_notices, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a Focus session
    Focus,
    /// Switch to Reflection
    Reflect,
    /// Switch to Rest
    Rest,
    /// Cancel the current session and return to idle
    Cancel,
    /// Show current timer status
    Status,
    /// Attach a reflection summary to the current or last reflection
    Summary {
        /// Summary text
        text: String,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    let (mut ctx, _) = open_context()?;

    let action = match action {
        TimerAction::Status => return print_json(&ctx.status()),
        TimerAction::Focus => Action::StartFocus,
        TimerAction::Reflect => Action::StartReflection,
        TimerAction::Rest => Action::StartRest,
        TimerAction::Cancel => Action::Cancel,
        TimerAction::Summary { text } => Action::AttachReflectionSummary { content: text },
    };

    let events = ctx.dispatch(action)?;
    report_notices(&events);
    print_json(&ctx.status())
}
