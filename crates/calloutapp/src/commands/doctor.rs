//! Read-only drift report.
//!
//! Drift is the normal, self-healing mismatch between masters and sources: a chunk
//! whose callout was deleted, a callout whose chunk was never written because the
//! watcher was not running, a callout that has no identifier yet. The doctor lists
//! all of it and writes nothing.

use crate::callout::{self, ParseOptions};
use crate::chunk;
use crate::commands::{CmdMessage, CmdResult};
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::store::Vault;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriftReason {
    /// The chunk's source document does not exist.
    SourceMissing,
    /// The source exists but declares no callout with the chunk's identifier.
    BlockMissing,
    /// A callout with an identifier has no chunk in its master.
    ChunkMissing,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DriftEntry {
    pub kind: String,
    pub source_path: String,
    pub block_id: String,
    pub reason: DriftReason,
}

impl DriftEntry {
    fn describe(&self) -> String {
        let what = match self.reason {
            DriftReason::SourceMissing => "chunk points at a missing document",
            DriftReason::BlockMissing => "chunk points at a missing callout",
            DriftReason::ChunkMissing => "callout has no chunk in its master",
        };
        format!(
            "[{}] {}#^{}: {}",
            self.kind, self.source_path, self.block_id, what
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DriftReport {
    pub entries: Vec<DriftEntry>,
    /// Tracked callouts that have no block identifier yet.
    pub unassigned: usize,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty() && self.unassigned == 0
    }
}

type Key = (String, String, String);

pub fn run<V: Vault>(engine: &SyncEngine<V>) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let mut report = DriftReport::default();

    let sources: Vec<String> = engine
        .vault()
        .list_markdown()?
        .into_iter()
        .filter(|path| !engine.is_master(path))
        .collect();
    let source_set: HashSet<&str> = sources.iter().map(String::as_str).collect();

    let mut declared: Vec<Key> = Vec::new();
    for path in &sources {
        let text = match engine.vault().read(path) {
            Ok(text) => text,
            Err(error) => {
                result.add_message(CmdMessage::error(format!("{}: {}", path, error)));
                continue;
            }
        };
        let existing = callout::parse(&text, engine.tracked(), ParseOptions::existing_only());
        declared.extend(
            existing
                .callouts
                .into_iter()
                .map(|c| (c.kind, path.clone(), c.block_id)),
        );
        report.unassigned +=
            callout::parse(&text, engine.tracked(), ParseOptions::assigning()).assigned;
    }
    let declared_set: HashSet<&Key> = declared.iter().collect();

    let mut chunked: HashSet<Key> = HashSet::new();
    for kind in engine.tracked() {
        let text = match engine.master_text(kind) {
            Ok(text) => text.unwrap_or_default(),
            Err(error) => {
                result.add_message(CmdMessage::error(format!(
                    "{}: {}",
                    engine.master_path(kind),
                    error
                )));
                continue;
            }
        };
        for chunk in chunk::parse(&text).chunks {
            let key = (kind.clone(), chunk.source_path.clone(), chunk.block_id.clone());
            if !declared_set.contains(&key) {
                let reason = if source_set.contains(chunk.source_path.as_str()) {
                    DriftReason::BlockMissing
                } else {
                    DriftReason::SourceMissing
                };
                report.entries.push(DriftEntry {
                    kind: kind.clone(),
                    source_path: chunk.source_path,
                    block_id: chunk.block_id,
                    reason,
                });
            }
            chunked.insert(key);
        }
    }

    for (kind, source_path, block_id) in &declared {
        let key = (kind.clone(), source_path.clone(), block_id.clone());
        if !chunked.contains(&key) {
            report.entries.push(DriftEntry {
                kind: kind.clone(),
                source_path: source_path.clone(),
                block_id: block_id.clone(),
                reason: DriftReason::ChunkMissing,
            });
        }
    }

    if report.is_clean() {
        result.add_message(CmdMessage::success("No drift found."));
    } else {
        result.add_message(CmdMessage::warning("Drift found:"));
        for entry in &report.entries {
            result.add_message(CmdMessage::info(format!("  - {}", entry.describe())));
        }
        if report.unassigned > 0 {
            result.add_message(CmdMessage::info(format!(
                "  - {} callout(s) without a block identifier.",
                report.unassigned
            )));
        }
        result.add_message(CmdMessage::info(
            "Run `callout rebuild` to regenerate the masters.",
        ));
    }

    Ok(result.with_drift(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemVault;

    fn engine(vault: MemVault) -> SyncEngine<MemVault> {
        SyncEngine::new(vault, vec!["todo".into()], "")
    }

    #[test]
    fn doctor_no_drift() {
        let e = engine(
            MemVault::new()
                .with_file("a.md", "> [!todo]\n> x\n\n^t1\n")
                .with_file("todo.md", "[a](a.md#^t1)\nx\n\n"),
        );
        let result = run(&e).unwrap();
        assert!(result.drift.as_ref().unwrap().is_clean());
        assert!(result.messages[0].content.contains("No drift"));
    }

    #[test]
    fn doctor_reports_every_kind_of_drift() {
        let e = engine(
            MemVault::new()
                .with_file("a.md", "> [!todo]\n> x\n\n^t1\n\n> [!todo]\n> new\n")
                .with_file("b.md", "> [!todo]\n> y\n\n^t2\n")
                .with_file(
                    "todo.md",
                    "[a](a.md#^gone)\nx\n\n[z](z.md#^t9)\nz\n\n[b](b.md#^t2)\ny\n\n",
                ),
        );
        let result = run(&e).unwrap();
        let drift = result.drift.unwrap();

        assert_eq!(drift.unassigned, 1);
        let reasons: Vec<(&str, DriftReason)> = drift
            .entries
            .iter()
            .map(|e| (e.block_id.as_str(), e.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("gone", DriftReason::BlockMissing),
                ("t9", DriftReason::SourceMissing),
                ("t1", DriftReason::ChunkMissing),
            ]
        );
    }

    #[test]
    fn doctor_never_writes() {
        let e = engine(MemVault::new().with_file("a.md", "> [!todo]\n> no id\n"));
        run(&e).unwrap();
        assert!(e.vault().writes().is_empty());
    }

    #[test]
    fn doctor_reports_setup_problem() {
        let vault = MemVault::new();
        vault.insert_folder("todo.md");
        let result = run(&engine(vault)).unwrap();
        assert!(result.has_errors());
    }
}
