use crate::commands::{CmdMessage, CmdResult};
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::store::Vault;

/// Regenerates every master document from the whole vault.
pub fn run<V: Vault>(engine: &SyncEngine<V>) -> Result<CmdResult> {
    let report = engine.rebuild_all()?;
    let mut result = CmdResult::default();
    result.absorb_report(report);

    let masters: Vec<String> = engine
        .tracked()
        .iter()
        .map(|kind| engine.master_path(kind))
        .collect();
    if result.has_errors() {
        result.add_message(CmdMessage::warning("Rebuild finished with errors."));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Rebuilt {}.",
            masters.join(", ")
        )));
    }
    Ok(result)
}
