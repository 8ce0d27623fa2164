use crate::config::CalloutConfig;
use crate::engine::SyncEngine;
use crate::store::fs::FsVault;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        fs::create_dir(root.join(".obsidian")).expect("failed to mark vault");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn write(&self, rel: &str, text: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(path, text).expect("failed to write test document");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("failed to read test document")
    }

    pub fn exists(&self, rel: &str) -> bool {
        Path::exists(&self.path(rel))
    }

    pub fn vault(&self) -> FsVault {
        FsVault::new(self.root.clone())
    }

    pub fn engine(&self) -> SyncEngine<FsVault> {
        SyncEngine::from_config(self.vault(), &CalloutConfig::default())
    }
}
