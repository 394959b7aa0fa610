mod database;
mod kv;
mod settings;
mod snapshot;

pub use database::Database;
pub use kv::{KeyValueStore, MemoryStore};
pub use settings::Settings;
pub use snapshot::{
    LoadOutcome, Recovery, Snapshot, SnapshotStore, CONFIG_KEY, HISTORY_KEY, STREAK_KEY,
    TIMER_STATE_KEY,
};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns `~/.config/pomoflex[-dev]/` based on POMOFLEX_ENV.
///
/// Set POMOFLEX_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("POMOFLEX_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomoflex-dev")
    } else {
        base_dir.join("pomoflex")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::OpenFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
