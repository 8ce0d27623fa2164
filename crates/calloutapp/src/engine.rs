//! # Sync Engine
//!
//! The I/O half of reconciliation. [`SyncEngine`] owns a [`Vault`] and the tracked
//! type list, reads the documents a pass needs, hands their text to the pure
//! functions in [`crate::reconcile`], and writes back only what changed.
//!
//! ## Passes
//!
//! - [`SyncEngine::sync_source`]: assign missing identifiers in a source document,
//!   then bring every tracked type's master in line with it.
//! - [`SyncEngine::sync_master`]: push chunk bodies of one master back into their
//!   source documents.
//! - [`SyncEngine::rebuild_all`]: regenerate every master from the whole vault.
//! - [`SyncEngine::on_rename`] / [`SyncEngine::on_delete`]: structural updates to
//!   masters after a document or folder moved or vanished.
//!
//! ## Reports and Failure Isolation
//!
//! Every pass returns a [`SyncReport`] listing each path it actually wrote. The
//! controller uses that list to suppress the change notifications those writes
//! cause. A failure while updating one master (or one source, in the master-to-source
//! direction) is recorded in the report and the pass moves on to the next one;
//! only a failure to read the document that triggered the pass is returned as `Err`.

use crate::callout::{self, ParseOptions};
use crate::chunk;
use crate::config::CalloutConfig;
use crate::error::{CalloutError, Result};
use crate::paths::{self, is_tracked_document};
use crate::reconcile;
use crate::store::{ensure_folder, read_if_exists, write_if_changed, EntryKind, Vault};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// A failure confined to one path during a pass.
#[derive(Debug)]
pub struct SyncFailure {
    pub path: String,
    pub error: CalloutError,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    /// Paths written during the pass, in write order.
    pub written: Vec<String>,
    /// Identifiers inserted into source documents.
    pub assigned: usize,
    /// Chunks skipped because their source or block identifier does not exist.
    pub drift: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn merge(&mut self, other: SyncReport) {
        self.written.extend(other.written);
        self.assigned += other.assigned;
        self.drift += other.drift;
        self.failures.extend(other.failures);
    }

    pub fn wrote(&self, path: &str) -> bool {
        self.written.iter().any(|p| p == path)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_write(&mut self, path: &str, wrote: bool) {
        if wrote {
            info!(path, "wrote document");
            self.written.push(path.to_string());
        } else {
            debug!(path, "document already up to date");
        }
    }

    fn record_failure(&mut self, path: &str, error: CalloutError) {
        warn!(path, %error, "sync failed for path");
        self.failures.push(SyncFailure {
            path: path.to_string(),
            error,
        });
    }
}

pub struct SyncEngine<V: Vault> {
    vault: V,
    tracked: Vec<String>,
    master_folder: String,
}

impl<V: Vault> SyncEngine<V> {
    /// `tracked` must already be case-folded and de-duplicated.
    pub fn new(vault: V, tracked: Vec<String>, master_folder: &str) -> Self {
        Self {
            vault,
            tracked,
            master_folder: paths::normalize_path(master_folder),
        }
    }

    pub fn from_config(vault: V, config: &CalloutConfig) -> Self {
        Self::new(vault, config.tracked_types(), &config.master_folder)
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn tracked(&self) -> &[String] {
        &self.tracked
    }

    pub fn master_folder(&self) -> &str {
        &self.master_folder
    }

    pub fn master_path(&self, kind: &str) -> String {
        paths::master_path(&self.master_folder, kind)
    }

    /// The tracked type whose master lives at `path`.
    pub fn kind_for_master(&self, path: &str) -> Option<&str> {
        self.tracked
            .iter()
            .find(|kind| self.master_path(kind) == path)
            .map(String::as_str)
    }

    pub fn is_master(&self, path: &str) -> bool {
        self.kind_for_master(path).is_some()
    }

    /// Fails with `NotAFolder` / `NotAFile` when the master's folder or the master
    /// itself is occupied by the wrong kind of entry.
    fn check_master_location(&self, master: &str) -> Result<()> {
        if let Some(folder) = paths::parent(master) {
            if self.vault.stat(folder)? == Some(EntryKind::File) {
                return Err(CalloutError::NotAFolder(folder.to_string()));
            }
        }
        if self.vault.stat(master)? == Some(EntryKind::Folder) {
            return Err(CalloutError::NotAFile(master.to_string()));
        }
        Ok(())
    }

    fn read_master(&self, master: &str) -> Result<Option<String>> {
        self.check_master_location(master)?;
        read_if_exists(&self.vault, master)
    }

    fn write_master(&self, master: &str, text: &str) -> Result<bool> {
        if let Some(folder) = paths::parent(master) {
            ensure_folder(&self.vault, folder)?;
        }
        write_if_changed(&self.vault, master, text)
    }

    /// Current text of the master for `kind`, `None` if it does not exist yet.
    pub fn master_text(&self, kind: &str) -> Result<Option<String>> {
        self.read_master(&self.master_path(kind))
    }

    /// Makes sure the master document for `kind` exists, creating it empty.
    ///
    /// Returns the master path and whether it had to be created.
    pub fn ensure_master(&self, kind: &str) -> Result<(String, bool)> {
        let master = self.master_path(kind);
        if self.read_master(&master)?.is_some() {
            return Ok((master, false));
        }
        let created = self.write_master(&master, "")?;
        Ok((master, created))
    }

    /// Routes a changed path to the right direction.
    ///
    /// Paths that are neither masters nor tracked documents produce an empty report,
    /// as does a master that no longer exists. A source that no longer exists is
    /// treated as deleted: its chunks are dropped from every master.
    pub fn sync_path(&self, path: &str) -> Result<SyncReport> {
        let master = self.is_master(path);
        let result = if master {
            self.sync_master(path)
        } else if is_tracked_document(path) {
            self.sync_source(path)
        } else {
            debug!(path, "ignoring untracked path");
            return Ok(SyncReport::default());
        };

        match result {
            Err(CalloutError::NotFound(_)) if master => {
                debug!(path, "master vanished before sync");
                Ok(SyncReport::default())
            }
            Err(CalloutError::NotFound(_)) => {
                debug!(path, "source vanished before sync, dropping its chunks");
                self.on_delete(path)
            }
            other => other,
        }
    }

    /// Source to master: assigns missing identifiers, then updates each tracked
    /// type's master from this document's callouts.
    pub fn sync_source(&self, path: &str) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let text = self.vault.read(path)?;
        let parsed = callout::parse(&text, &self.tracked, ParseOptions::assigning());

        if parsed.changed() {
            let wrote = write_if_changed(&self.vault, path, &parsed.text())?;
            report.assigned += parsed.assigned;
            report.record_write(path, wrote);
        }

        for kind in &self.tracked {
            let master = self.master_path(kind);
            let entries = reconcile::entries_for(path, parsed.of_kind(kind));
            if let Err(error) = self.update_master_from_source(&master, path, &entries, &mut report)
            {
                report.record_failure(&master, error);
            }
        }

        Ok(report)
    }

    fn update_master_from_source(
        &self,
        master: &str,
        source: &str,
        entries: &[chunk::ChunkEntry],
        report: &mut SyncReport,
    ) -> Result<()> {
        let current = self.read_master(master)?;
        if current.is_none() && entries.is_empty() {
            return Ok(());
        }
        let current = current.unwrap_or_default();
        let updated = reconcile::source_to_master(&current, source, entries);
        if updated == current {
            debug!(master, source, "master already matches source");
            return Ok(());
        }
        let wrote = self.write_master(master, &updated)?;
        report.record_write(master, wrote);
        Ok(())
    }

    /// Master to source: writes chunk bodies back into the callouts they came from.
    pub fn sync_master(&self, master: &str) -> Result<SyncReport> {
        let kind = self
            .kind_for_master(master)
            .ok_or_else(|| CalloutError::UnknownType(paths::display_name(master)))?;
        let mut report = SyncReport::default();

        let Some(text) = self.read_master(master)? else {
            return Err(CalloutError::NotFound(master.to_string()));
        };
        let parsed = chunk::parse(&text);

        for (source, chunks) in reconcile::group_by_source(&parsed.chunks) {
            if self.is_master(&source) {
                debug!(master, source = source.as_str(), "chunk points at a master document, skipping");
                report.drift += chunks.len();
                continue;
            }
            if let Err(error) = self.update_source_from_master(kind, &source, &chunks, &mut report)
            {
                report.record_failure(&source, error);
            }
        }

        Ok(report)
    }

    fn update_source_from_master(
        &self,
        kind: &str,
        source: &str,
        chunks: &[&chunk::MasterChunk],
        report: &mut SyncReport,
    ) -> Result<()> {
        let Some(text) = read_if_exists(&self.vault, source)? else {
            debug!(source, chunks = chunks.len(), "source document missing");
            report.drift += chunks.len();
            return Ok(());
        };

        let declared: HashSet<String> =
            callout::parse(&text, &[kind.to_string()], ParseOptions::existing_only())
                .callouts
                .into_iter()
                .map(|c| c.block_id)
                .collect();
        let unmatched = chunks
            .iter()
            .filter(|c| !declared.contains(&c.block_id))
            .count();
        if unmatched > 0 {
            debug!(source, unmatched, "chunks without a matching callout");
            report.drift += unmatched;
        }

        let updated = reconcile::master_to_source(&text, kind, chunks);
        if updated != text {
            let wrote = write_if_changed(&self.vault, source, &updated)?;
            report.record_write(source, wrote);
        }
        Ok(())
    }

    /// Regenerates every master from scratch.
    ///
    /// Every document except the masters is parsed with identifier assignment and
    /// written back if it gained identifiers. Existing master content is discarded.
    pub fn rebuild_all(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        let mut by_kind: Vec<(&str, Vec<chunk::ChunkEntry>)> = self
            .tracked
            .iter()
            .map(|kind| (kind.as_str(), Vec::new()))
            .collect();

        for path in self.vault.list_markdown()? {
            if self.is_master(&path) {
                continue;
            }
            let text = match self.vault.read(&path) {
                Ok(text) => text,
                Err(error) => {
                    report.record_failure(&path, error);
                    continue;
                }
            };
            let parsed = callout::parse(&text, &self.tracked, ParseOptions::assigning());
            if parsed.changed() {
                match write_if_changed(&self.vault, &path, &parsed.text()) {
                    Ok(wrote) => {
                        report.assigned += parsed.assigned;
                        report.record_write(&path, wrote);
                    }
                    Err(error) => {
                        // Chunks for unwritten identifiers would point nowhere.
                        report.record_failure(&path, error);
                        continue;
                    }
                }
            }
            for (kind, entries) in by_kind.iter_mut() {
                entries.extend(reconcile::entries_for(&path, parsed.of_kind(*kind)));
            }
        }

        for (kind, entries) in by_kind {
            let master = self.master_path(kind);
            let count = entries.len();
            let result = self
                .check_master_location(&master)
                .and_then(|_| self.write_master(&master, &reconcile::rebuild_master(entries)));
            match result {
                Ok(wrote) => {
                    info!(kind, chunks = count, "rebuilt master");
                    report.record_write(&master, wrote);
                }
                Err(error) => report.record_failure(&master, error),
            }
        }

        Ok(report)
    }

    /// Points chunks at the new location of a renamed document or folder.
    pub fn on_rename(&self, from: &str, to: &str) -> Result<SyncReport> {
        self.for_each_master(|master, text| {
            let updated = reconcile::rename_source(text, from, to);
            debug!(master, from, to, "applying rename");
            updated
        })
    }

    /// Drops chunks of a deleted document, or of every document in a deleted folder.
    pub fn on_delete(&self, path: &str) -> Result<SyncReport> {
        self.for_each_master(|master, text| {
            let updated = reconcile::remove_source(text, path);
            debug!(master, path, "applying delete");
            updated
        })
    }

    fn for_each_master<F>(&self, mut update: F) -> Result<SyncReport>
    where
        F: FnMut(&str, &str) -> String,
    {
        let mut report = SyncReport::default();
        for kind in &self.tracked {
            let master = self.master_path(kind);
            let result = self.read_master(&master).and_then(|current| {
                let Some(current) = current else {
                    return Ok(false);
                };
                let updated = update(&master, &current);
                if updated == current {
                    return Ok(false);
                }
                self.write_master(&master, &updated)
            });
            match result {
                Ok(wrote) => report.record_write(&master, wrote),
                Err(error) => report.record_failure(&master, error),
            }
        }
        Ok(report)
    }
}
