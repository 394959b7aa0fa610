//! Shared helpers for commands: opening the context and printing output.

use pomoflex_core::{Database, Event, Settings, SystemClock, TimerContext};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Context = TimerContext<Database, SystemClock>;

/// Open the on-disk store and resume the timer.
///
/// Load-time notices (recovered data, failed writes) go to stderr; the
/// returned events are the ones a command may want to print.
pub fn open_context() -> Result<(Context, Vec<Event>), Box<dyn std::error::Error>> {
    let settings = Settings::load_or_default();
    let db = Database::open()?;
    let (ctx, events) = TimerContext::load(db, SystemClock, settings.thresholds());
    report_notices(&events);
    Ok((ctx, events))
}

pub fn report_notices(events: &[Event]) {
    for event in events {
        match event {
            Event::DataRecovered { key, reason, .. } => {
                eprintln!("warning: stored {key} was unreadable and has been reset ({reason})");
            }
            Event::StorageWriteFailed { message, .. } => {
                eprintln!("warning: could not save timer data: {message}");
            }
            _ => {}
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
