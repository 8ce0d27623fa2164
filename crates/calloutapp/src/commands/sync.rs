use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CalloutError, Result};
use crate::engine::SyncEngine;
use crate::store::Vault;

/// Syncs one document now: a master pushes into its sources, anything else is
/// treated as a source.
pub fn run<V: Vault>(engine: &SyncEngine<V>, path: &str) -> Result<CmdResult> {
    if engine.vault().stat(path)?.is_none() {
        return Err(CalloutError::NotFound(path.to_string()));
    }
    let report = if engine.is_master(path) {
        engine.sync_master(path)?
    } else {
        engine.sync_source(path)?
    };

    let mut result = CmdResult::default();
    result.absorb_report(report);
    if result.written.is_empty() && !result.has_errors() {
        result.add_message(CmdMessage::info(format!("{} is already in sync.", path)));
    } else if !result.written.is_empty() {
        result.add_message(CmdMessage::success(format!(
            "Synced {}: updated {}.",
            path,
            result.written.join(", ")
        )));
    }
    Ok(result)
}
