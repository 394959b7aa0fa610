use pomoflex_core::{Database, SnapshotStore};

use crate::common::CliResult;

/// Validate every stored document without resetting anything.
pub fn run() -> CliResult {
    let store = SnapshotStore::new(Database::open()?);
    let snapshot = store.load().strict()?;
    println!(
        "ok: state={}, {} session(s), streak={}",
        snapshot.timer_state.current_state,
        snapshot.history.len(),
        snapshot.streak.count
    );
    Ok(())
}
