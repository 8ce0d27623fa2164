//! # Vault Detection
//!
//! Every command operates on one **vault**: a directory tree of markdown documents.
//! Like `git`, the tool figures out which vault you mean from where you are.
//!
//! ## Detection Algorithm
//!
//! [`find_vault_root`] walks up from the current directory:
//!
//! 1. Start at `CWD`.
//! 2. Check: Does this directory have `.obsidian/` or a `.callout.toml`?
//! 3. **Match**: this is the vault root.
//! 4. **No Match**: move to the parent directory.
//! 5. **Stop**: at `HOME` or the filesystem root, return `None`.
//!
//! When nothing is found the current directory is used as the vault root.
//!
//! ## Vault Override
//!
//! `--vault DIR` skips detection and uses `DIR` directly.
//!
//! ## Paths on the Command Line
//!
//! Document arguments are resolved against the current directory and then made
//! vault-relative with [`to_vault_path`]. A relative argument that does not land
//! inside the vault is taken as already vault-relative.

use crate::api::CalloutApi;
use crate::config::{CalloutConfig, VAULT_CONFIG_FILE};
use crate::error::{CalloutError, Result};
use crate::paths::{normalize_path, relative_path};
use crate::store::fs::FsVault;
use directories::BaseDirs;
use std::path::{Path, PathBuf};

const OBSIDIAN_DIR: &str = ".obsidian";

pub struct CalloutContext {
    pub api: CalloutApi<FsVault>,
    pub config: CalloutConfig,
    pub root: PathBuf,
}

impl CalloutContext {
    pub fn vault_path(&self, cwd: &Path, arg: &str) -> Result<String> {
        to_vault_path(&self.root, cwd, arg)
    }
}

fn is_vault_root(dir: &Path) -> bool {
    dir.join(OBSIDIAN_DIR).is_dir() || dir.join(VAULT_CONFIG_FILE).is_file()
}

/// Find the vault root by walking up from `cwd`.
/// Returns None if no marker is found before reaching home or root.
pub fn find_vault_root(cwd: &Path) -> Option<PathBuf> {
    let home_dir = BaseDirs::new().map(|bd| bd.home_dir().to_path_buf());
    let mut current = cwd.to_path_buf();

    loop {
        if is_vault_root(&current) {
            return Some(current);
        }

        // Check stop conditions: reached home dir or volume root
        if let Some(ref home) = home_dir {
            if &current == home {
                return None;
            }
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => return None,
        }
    }
}

/// Resolves the vault and loads its configuration.
///
/// * `cwd` - where detection starts, and what relative paths are relative to
/// * `vault_override` - explicit vault root, bypassing detection
pub fn initialize(cwd: &Path, vault_override: Option<PathBuf>) -> Result<CalloutContext> {
    let root = match vault_override {
        Some(path) if path.is_absolute() => path,
        Some(path) => cwd.join(path),
        None => find_vault_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
    };
    if !root.is_dir() {
        return Err(CalloutError::NotAFolder(root.display().to_string()));
    }

    let config = CalloutConfig::load(&root)?;
    let api = CalloutApi::new(FsVault::new(root.clone()), config.clone());

    Ok(CalloutContext { api, config, root })
}

/// Turns a command-line path into a vault-relative one.
pub fn to_vault_path(root: &Path, cwd: &Path, arg: &str) -> Result<String> {
    let candidate = Path::new(arg);
    if let Some(path) = relative_path(root, &cwd.join(candidate)) {
        return Ok(path);
    }
    if candidate.is_relative() {
        let path = normalize_path(arg);
        if !path.is_empty() {
            return Ok(path);
        }
    }
    Err(CalloutError::NotFound(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_vault_root_with_obsidian_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join(".obsidian")).unwrap();

        assert_eq!(find_vault_root(root), Some(root.to_path_buf()));
    }

    #[test]
    fn test_find_vault_root_from_nested_folder() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join(".callout.toml"), "").unwrap();
        let deep = root.join("Projects").join("Garden");
        fs::create_dir_all(&deep).unwrap();

        assert_eq!(find_vault_root(&deep), Some(root.to_path_buf()));
    }

    #[test]
    fn test_find_vault_root_innermost_wins() {
        let temp = TempDir::new().unwrap();
        let outer = temp.path();
        let inner = outer.join("inner");
        fs::create_dir_all(inner.join(".obsidian")).unwrap();
        fs::create_dir(outer.join(".obsidian")).unwrap();

        assert_eq!(find_vault_root(&inner), Some(inner.clone()));
    }

    #[test]
    fn test_initialize_with_override() {
        let temp = TempDir::new().unwrap();
        let vault = temp.path().join("vault");
        fs::create_dir(&vault).unwrap();
        fs::write(vault.join(".callout.toml"), "types = [\"idea\"]\n").unwrap();

        let ctx = initialize(temp.path(), Some(PathBuf::from("vault"))).unwrap();
        assert_eq!(ctx.root, vault);
        assert_eq!(ctx.config.types, vec!["idea"]);
    }

    #[test]
    fn test_initialize_missing_vault_dir() {
        let temp = TempDir::new().unwrap();
        let result = initialize(temp.path(), Some(temp.path().join("nope")));
        assert!(matches!(result, Err(CalloutError::NotAFolder(_))));
    }

    #[test]
    fn test_to_vault_path() {
        let root = Path::new("/vault");
        let cwd = Path::new("/vault/Notes");
        assert_eq!(to_vault_path(root, cwd, "a.md").unwrap(), "Notes/a.md");
        assert_eq!(to_vault_path(root, cwd, "/vault/b.md").unwrap(), "b.md");
        assert_eq!(
            to_vault_path(root, Path::new("/elsewhere"), "Inbox/c.md").unwrap(),
            "Inbox/c.md"
        );
        assert!(to_vault_path(root, cwd, "/etc/passwd").is_err());
    }
}
