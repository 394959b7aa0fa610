//! Long-running driver: ticks the engine on the configured interval and
//! prints every event as a JSON line until Ctrl-C.

use std::time::Duration;

use pomoflex_core::{Event, Settings};

use crate::common::{open_context, CliResult, Context};

pub fn run() -> CliResult {
    let settings = Settings::load_or_default();
    let (ctx, events) = open_context()?;
    emit(&events)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(ctx, settings.tick_interval_ms.max(1)))
}

async fn drive(mut ctx: Context, interval_ms: u64) -> CliResult {
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
    tracing::info!(interval_ms, "watching timer");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let events = ctx.tick();
                emit(&events)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping watch");
                ctx.save()?;
                return Ok(());
            }
        }
    }
}

fn emit(events: &[Event]) -> CliResult {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
