//! # Storage Layer
//!
//! The engine never touches the filesystem directly. Everything it needs from the
//! host document store goes through the [`Vault`] trait:
//!
//! - `stat` / `read` / `write` / `create_folder` on vault-relative paths
//! - `list_markdown` for the full-vault rebuild
//!
//! Paths are always in the canonical form produced by [`crate::paths::normalize_path`].
//!
//! ## Philosophy
//!
//! - **Documents are truth**: there is no index or cache. Every pass reads the
//!   current text.
//! - **Write only on change**: [`write_if_changed`] re-reads the document right
//!   before writing and skips the write when the text already matches. This is what
//!   makes repeated passes idempotent and keeps the engine from triggering change
//!   notifications for nothing.
//! - **Atomic writes**: the filesystem vault writes to a temp file and renames it
//!   over the target, so a crash never leaves a half-written document.
//!
//! ## Implementations
//!
//! - [`fs::FsVault`]: a directory on disk.
//! - [`memory::MemVault`]: an in-memory vault for tests, with a write log.

use crate::error::{CalloutError, Result};
use std::path::PathBuf;

pub mod fs;
pub mod memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// Abstract interface to the host document store.
///
/// Methods take `&self`; implementations that keep state use interior mutability.
pub trait Vault {
    /// What lives at `path`, or `None` if nothing does.
    fn stat(&self, path: &str) -> Result<Option<EntryKind>>;

    /// Full text of a document. Fails with `NotFound` if it does not exist.
    fn read(&self, path: &str) -> Result<String>;

    /// Replaces (or creates) a document, creating parent folders as needed.
    fn write(&self, path: &str, text: &str) -> Result<()>;

    /// Creates a folder. Fails with `AlreadyExists` if the path is taken.
    fn create_folder(&self, path: &str) -> Result<()>;

    /// Every markdown document outside dot-folders, sorted.
    fn list_markdown(&self) -> Result<Vec<String>>;

    /// Where a path lives, for messages. Virtual for in-memory vaults.
    fn location(&self, path: &str) -> PathBuf;
}

/// Reads a document, mapping "does not exist" to `None`.
pub fn read_if_exists<V: Vault + ?Sized>(vault: &V, path: &str) -> Result<Option<String>> {
    match vault.read(path) {
        Ok(text) => Ok(Some(text)),
        Err(CalloutError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes `text` unless the document already holds exactly that.
///
/// Returns whether a write happened.
pub fn write_if_changed<V: Vault + ?Sized>(vault: &V, path: &str, text: &str) -> Result<bool> {
    if read_if_exists(vault, path)?.as_deref() == Some(text) {
        return Ok(false);
    }
    vault.write(path, text)?;
    Ok(true)
}

/// Creates a folder (and its parents), treating "already exists" as success.
///
/// Fails with `NotAFolder` if a file sits on the path.
pub fn ensure_folder<V: Vault + ?Sized>(vault: &V, path: &str) -> Result<()> {
    if path.is_empty() {
        return Ok(());
    }
    match vault.stat(path)? {
        Some(EntryKind::Folder) => Ok(()),
        Some(EntryKind::File) => Err(CalloutError::NotAFolder(path.to_string())),
        None => match vault.create_folder(path) {
            Ok(()) | Err(CalloutError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        },
    }
}
