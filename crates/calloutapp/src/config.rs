//! # Configuration
//!
//! Callout configuration is managed by [`confique`], which handles layered loading
//! from TOML files and environment variables.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `CALLOUT_TYPES`, `CALLOUT_MASTER_FOLDER`,
//!    `CALLOUT_DEBOUNCE_MS`, `CALLOUT_SUPPRESS_MS`.
//! 2. **Vault Config**: `<vault>/.callout.toml`, overrides the global file for one vault.
//! 3. **Global Config**: OS-appropriate config directory (via `directories` crate).
//! 4. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `types` | `["todo", "questions"]` | Callout types that get a master document |
//! | `master_folder` | `""` | Folder holding the masters (empty = vault root) |
//! | `debounce_ms` | `750` | Quiet interval before a changed document is synced |
//! | `suppress_ms` | `2000` | How long the engine ignores notifications for its own writes |

use crate::error::Result;
use crate::paths;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const VAULT_CONFIG_FILE: &str = ".callout.toml";
const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// Configuration for callout sync, stored in `.callout.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CalloutConfig {
    /// Callout types to track. Case-insensitive; duplicates are ignored.
    #[config(
        default = ["todo", "questions"],
        env = "CALLOUT_TYPES",
        parse_env = confique::env::parse::list_by_comma
    )]
    pub types: Vec<String>,

    /// Folder for master documents, relative to the vault root.
    #[config(default = "", env = "CALLOUT_MASTER_FOLDER")]
    pub master_folder: String,

    /// Quiet interval in milliseconds before a changed document is synced.
    #[config(default = 750, env = "CALLOUT_DEBOUNCE_MS")]
    pub debounce_ms: u64,

    /// Milliseconds during which change notifications for a path the engine just
    /// wrote are ignored. Must exceed the file watcher's notification latency, or
    /// the engine will react to its own writes.
    #[config(default = 2000, env = "CALLOUT_SUPPRESS_MS")]
    pub suppress_ms: u64,
}

impl Default for CalloutConfig {
    fn default() -> Self {
        Self {
            types: vec!["todo".to_string(), "questions".to_string()],
            master_folder: String::new(),
            debounce_ms: 750,
            suppress_ms: 2000,
        }
    }
}

/// Debounce and suppression windows for the change controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub debounce: Duration,
    pub suppress: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        CalloutConfig::default().timing()
    }
}

impl CalloutConfig {
    /// Loads the layered configuration for a vault.
    pub fn load(vault_root: &Path) -> Result<Self> {
        let mut builder = CalloutConfig::builder()
            .env()
            .file(vault_root.join(VAULT_CONFIG_FILE));
        if let Some(global) = global_config_path() {
            builder = builder.file(global);
        }
        Ok(builder.load()?)
    }

    /// Tracked types: trimmed, lowercased, de-duplicated, in declaration order.
    pub fn tracked_types(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.types.len());
        for kind in &self.types {
            let kind = kind.trim().to_lowercase();
            if !kind.is_empty() && !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        seen
    }

    pub fn master_folder(&self) -> String {
        paths::normalize_path(&self.master_folder)
    }

    pub fn master_path(&self, kind: &str) -> String {
        paths::master_path(&self.master_folder(), kind)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            debounce: Duration::from_millis(self.debounce_ms),
            suppress: Duration::from_millis(self.suppress_ms),
        }
    }
}

/// `<config dir>/callout/config.toml`, when the platform has a config directory.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "callout").map(|dirs| dirs.config_dir().join(GLOBAL_CONFIG_FILE))
}
