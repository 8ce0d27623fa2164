use super::{EntryKind, Vault};
use crate::error::{CalloutError, Result};
use crate::paths::{is_tracked_document, normalize_path};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone)]
enum Entry {
    File(String),
    Folder,
}

/// In-memory vault for testing.
///
/// Uses `RefCell` for interior mutability since the engine is single-threaded.
/// Every successful `write` is appended to a log, which is how tests observe
/// idempotence (no write) and feedback loops (unexpected writes).
#[derive(Default)]
pub struct MemVault {
    entries: RefCell<BTreeMap<String, Entry>>,
    writes: RefCell<Vec<String>>,
    simulate_write_error: RefCell<bool>,
}

impl MemVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding; does not touch the write log.
    pub fn with_file(self, path: &str, text: &str) -> Self {
        self.insert_file(path, text);
        self
    }

    /// Places a document as if a user had saved it; not logged as an engine write.
    pub fn insert_file(&self, path: &str, text: &str) {
        self.entries
            .borrow_mut()
            .insert(normalize_path(path), Entry::File(text.to_string()));
    }

    pub fn insert_folder(&self, path: &str) {
        self.entries
            .borrow_mut()
            .insert(normalize_path(path), Entry::Folder);
    }

    pub fn file(&self, path: &str) -> Option<String> {
        match self.entries.borrow().get(path) {
            Some(Entry::File(text)) => Some(text.clone()),
            _ => None,
        }
    }

    /// Moves a document, as a user rename would.
    pub fn rename(&self, from: &str, to: &str) {
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.remove(from) {
            entries.insert(to.to_string(), entry);
        }
    }

    pub fn remove(&self, path: &str) {
        self.entries.borrow_mut().remove(path);
    }

    /// Paths written through the `Vault` trait, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self, path: &str) -> usize {
        self.writes.borrow().iter().filter(|p| *p == path).count()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    fn is_implicit_folder(&self, path: &str) -> bool {
        let prefix = format!("{}/", path);
        self.entries
            .borrow()
            .keys()
            .any(|key| key.starts_with(&prefix))
    }
}

impl Vault for MemVault {
    fn stat(&self, path: &str) -> Result<Option<EntryKind>> {
        if path.is_empty() {
            return Ok(Some(EntryKind::Folder));
        }
        let kind = match self.entries.borrow().get(path) {
            Some(Entry::File(_)) => Some(EntryKind::File),
            Some(Entry::Folder) => Some(EntryKind::Folder),
            None => None,
        };
        if kind.is_none() && self.is_implicit_folder(path) {
            return Ok(Some(EntryKind::Folder));
        }
        Ok(kind)
    }

    fn read(&self, path: &str) -> Result<String> {
        match self.stat(path)? {
            Some(EntryKind::File) => Ok(self.file(path).unwrap_or_default()),
            Some(EntryKind::Folder) => Err(CalloutError::NotAFile(path.to_string())),
            None => Err(CalloutError::NotFound(path.to_string())),
        }
    }

    fn write(&self, path: &str, text: &str) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(CalloutError::Store("Simulated write error".to_string()));
        }
        if self.stat(path)? == Some(EntryKind::Folder) {
            return Err(CalloutError::NotAFile(path.to_string()));
        }
        self.entries
            .borrow_mut()
            .insert(path.to_string(), Entry::File(text.to_string()));
        self.writes.borrow_mut().push(path.to_string());
        Ok(())
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        if self.stat(path)?.is_some() {
            return Err(CalloutError::AlreadyExists(path.to_string()));
        }
        self.entries
            .borrow_mut()
            .insert(path.to_string(), Entry::Folder);
        Ok(())
    }

    fn list_markdown(&self) -> Result<Vec<String>> {
        Ok(self
            .entries
            .borrow()
            .iter()
            .filter(|(path, entry)| matches!(entry, Entry::File(_)) && is_tracked_document(path))
            .map(|(path, _)| path.clone())
            .collect())
    }

    fn location(&self, path: &str) -> PathBuf {
        PathBuf::from(format!("memory://{}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_imply_parent_folders() {
        let vault = MemVault::new().with_file("a/b/c.md", "x");
        assert_eq!(vault.stat("a").unwrap(), Some(EntryKind::Folder));
        assert_eq!(vault.stat("a/b").unwrap(), Some(EntryKind::Folder));
        assert_eq!(vault.stat("a/b/c.md").unwrap(), Some(EntryKind::File));
        assert_eq!(vault.stat("a/b/d.md").unwrap(), None);
    }

    #[test]
    fn list_markdown_skips_hidden_and_other_files() {
        let vault = MemVault::new()
            .with_file("b.md", "")
            .with_file("a.md", "")
            .with_file(".obsidian/x.md", "")
            .with_file("img.png", "");
        assert_eq!(vault.list_markdown().unwrap(), vec!["a.md", "b.md"]);
    }

    #[test]
    fn simulated_write_error() {
        let vault = MemVault::new();
        vault.set_simulate_write_error(true);
        assert!(matches!(
            vault.write("a.md", "x"),
            Err(CalloutError::Store(_))
        ));
        assert!(vault.writes().is_empty());
    }

    #[test]
    fn writing_over_a_folder_fails() {
        let vault = MemVault::new();
        vault.insert_folder("todo.md");
        assert!(matches!(
            vault.write("todo.md", "x"),
            Err(CalloutError::NotAFile(_))
        ));
        assert!(matches!(vault.read("todo.md"), Err(CalloutError::NotAFile(_))));
    }
}
