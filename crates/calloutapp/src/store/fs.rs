use super::{EntryKind, Vault};
use crate::error::{CalloutError, Result};
use crate::paths::{is_hidden, is_markdown, relative_path};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A vault rooted at a directory on disk.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abs(&self, path: &str) -> PathBuf {
        let mut abs = self.root.clone();
        abs.extend(path.split('/').filter(|s| !s.is_empty()));
        abs
    }

    fn walk(&self, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.walk(&path, out)?;
            } else if file_type.is_file() {
                if let Some(rel) = relative_path(&self.root, &path) {
                    if is_markdown(&rel) && !is_hidden(&rel) {
                        out.push(rel);
                    }
                }
            }
        }
        Ok(())
    }
}

impl Vault for FsVault {
    fn stat(&self, path: &str) -> Result<Option<EntryKind>> {
        match fs::metadata(self.abs(path)) {
            Ok(meta) if meta.is_dir() => Ok(Some(EntryKind::Folder)),
            Ok(_) => Ok(Some(EntryKind::File)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CalloutError::Io(e)),
        }
    }

    fn read(&self, path: &str) -> Result<String> {
        let abs = self.abs(path);
        if abs.is_dir() {
            return Err(CalloutError::NotAFile(path.to_string()));
        }
        fs::read_to_string(&abs).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CalloutError::NotFound(path.to_string()),
            _ => CalloutError::Io(e),
        })
    }

    fn write(&self, path: &str, text: &str) -> Result<()> {
        let target = self.abs(path);
        if target.is_dir() {
            return Err(CalloutError::NotAFile(path.to_string()));
        }
        let dir = target.parent().unwrap_or(&self.root).to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        // Atomic write
        let tmp = dir.join(format!(".callout-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, text)?;
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(CalloutError::Io(e));
        }
        Ok(())
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let abs = self.abs(path);
        if abs.exists() {
            return Err(CalloutError::AlreadyExists(path.to_string()));
        }
        match fs::create_dir_all(&abs) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(CalloutError::AlreadyExists(path.to_string()))
            }
            Err(e) => Err(CalloutError::Io(e)),
        }
    }

    fn list_markdown(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if self.root.is_dir() {
            self.walk(&self.root, &mut out)?;
        }
        out.sort();
        Ok(out)
    }

    fn location(&self, path: &str) -> PathBuf {
        self.abs(path)
    }
}
