//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer. It serves as the single
//! entry point for every callout operation, regardless of the UI being used.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Normalizes inputs** (paths into canonical vault form)
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs` and the engine
//! - **I/O operations**: No stdout, stderr, or file formatting
//! - **Presentation concerns**: Returns data structures, not strings
//!
//! ## Generic Over Vault
//!
//! `CalloutApi<V: Vault>` is generic over the storage collaborator:
//! - Production: `CalloutApi<FsVault>`
//! - Testing: `CalloutApi<MemVault>`
//!
//! ## Long-Running Mode
//!
//! [`CalloutApi::into_controller`] hands the engine over to a [`Controller`] with the
//! configured debounce and suppression windows, for the watch loop.

use crate::commands;
use crate::config::CalloutConfig;
use crate::controller::Controller;
use crate::engine::SyncEngine;
use crate::error::Result;
use crate::paths::normalize_path;
use crate::store::Vault;

/// The main API facade for callout operations.
pub struct CalloutApi<V: Vault> {
    engine: SyncEngine<V>,
    config: CalloutConfig,
}

impl<V: Vault> CalloutApi<V> {
    pub fn new(vault: V, config: CalloutConfig) -> Self {
        let engine = SyncEngine::from_config(vault, &config);
        Self { engine, config }
    }

    pub fn engine(&self) -> &SyncEngine<V> {
        &self.engine
    }

    pub fn insert(
        &self,
        kind: &str,
        path: &str,
        line: Option<usize>,
    ) -> Result<commands::CmdResult> {
        commands::insert::run(&self.engine, kind, &normalize_path(path), line)
    }

    pub fn sync(&self, path: &str) -> Result<commands::CmdResult> {
        commands::sync::run(&self.engine, &normalize_path(path))
    }

    pub fn rebuild(&self) -> Result<commands::CmdResult> {
        commands::rebuild::run(&self.engine)
    }

    pub fn doctor(&self) -> Result<commands::CmdResult> {
        commands::doctor::run(&self.engine)
    }

    pub fn config(&self) -> Result<commands::CmdResult> {
        commands::config::run(&self.config)
    }

    pub fn into_controller(self) -> Controller<V> {
        let timing = self.config.timing();
        Controller::new(self.engine, timing)
    }
}

pub use commands::{CmdMessage, CmdResult, MessageLevel};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::VaultEvent;
    use crate::store::memory::MemVault;
    use std::time::{Duration, Instant};

    fn api(vault: MemVault) -> CalloutApi<MemVault> {
        CalloutApi::new(vault, CalloutConfig::default())
    }

    #[test]
    fn test_paths_are_normalized() {
        let api = api(MemVault::new().with_file("Notes/a.md", "> [!todo]\n> x\n\n^t1\n"));
        let result = api.sync("./Notes//a.md").unwrap();
        assert_eq!(result.written, vec!["todo.md"]);
        assert!(api.engine().vault().file("todo.md").unwrap().contains("Notes/a.md#^t1"));
    }

    #[test]
    fn test_config_uses_tracked_types() {
        let api = api(MemVault::new());
        let result = api.config().unwrap();
        assert_eq!(
            result.config.unwrap().tracked_types(),
            vec!["todo", "questions"]
        );
    }

    #[test]
    fn test_into_controller_uses_configured_timing() {
        let vault = MemVault::new().with_file("a.md", "> [!todo]\n> x\n\n^t1\n");
        let config = CalloutConfig {
            debounce_ms: 10,
            ..Default::default()
        };
        let mut controller = CalloutApi::new(vault, config).into_controller();
        assert_eq!(controller.timing().debounce, Duration::from_millis(10));

        let t0 = Instant::now();
        controller.handle(VaultEvent::Modified("a.md".into()), t0);
        assert_eq!(controller.poll(t0 + Duration::from_millis(10)), vec!["a.md"]);
    }
}
