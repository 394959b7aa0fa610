use clap::Subcommand;
use pomoflex_core::{Action, ConfigError, Settings, TimerConfig};

use crate::common::{open_context, print_json, report_notices, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the timer configuration
    Show,
    /// Get a config value
    Get {
        /// Config key (e.g., "focus_duration")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Reset timer configuration to defaults
    Reset,
    /// Show host settings (clock-jump tolerances, tick interval)
    Settings,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Show => {
            let (ctx, _) = open_context()?;
            print_json(ctx.engine().config())
        }
        ConfigAction::Get { key } => {
            let (ctx, _) = open_context()?;
            match ctx.engine().config().get(&key) {
                Some(value) => {
                    println!("{value}");
                    Ok(())
                }
                None => Err(ConfigError::UnknownKey(key).into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let (mut ctx, _) = open_context()?;
            let config = ctx.engine().config().with_value(&key, &value)?;
            let events = ctx.dispatch(Action::UpdateConfig { config })?;
            report_notices(&events);
            println!("{key} = {value}");
            Ok(())
        }
        ConfigAction::Reset => {
            let (mut ctx, _) = open_context()?;
            let events = ctx.dispatch(Action::UpdateConfig {
                config: TimerConfig::default(),
            })?;
            report_notices(&events);
            println!("Config reset to defaults.");
            Ok(())
        }
        ConfigAction::Settings => print_json(&Settings::load()?),
    }
}
