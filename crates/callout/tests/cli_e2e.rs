#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Vault {
    temp: TempDir,
}

impl Vault {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("vault").join(".obsidian")).unwrap();
        Self { temp }
    }

    fn root(&self) -> PathBuf {
        self.temp.path().join("vault")
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel)).unwrap()
    }

    /// A command running inside the vault with no user or environment config.
    fn cmd(&self) -> Command {
        self.cmd_in(&self.root())
    }

    fn cmd_in(&self, dir: &Path) -> Command {
        let mut cmd = Command::new(cargo_bin("callout"));
        cmd.current_dir(dir)
            .env("XDG_CONFIG_HOME", self.temp.path().join("xdg"))
            .env("HOME", self.temp.path().join("home"))
            .env_remove("CALLOUT_TYPES")
            .env_remove("CALLOUT_MASTER_FOLDER")
            .env_remove("CALLOUT_DEBOUNCE_MS")
            .env_remove("CALLOUT_SUPPRESS_MS")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn test_sync_writes_the_master() {
    let vault = Vault::new();
    vault.write("a.md", "> [!todo]\n> buy milk\n\n^t1\n");

    vault
        .cmd()
        .args(["sync", "a.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced a.md"));

    assert_eq!(vault.read("todo.md"), "[a](a.md#^t1)\nbuy milk\n\n");

    vault
        .cmd()
        .args(["sync", "a.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already in sync"));
}

#[test]
fn test_sync_of_master_updates_the_source() {
    let vault = Vault::new();
    vault.write("a.md", "# A\n\n> [!todo]\n> buy milk\n\n^t1\n");
    vault.write("todo.md", "[a](a.md#^t1)\nbuy oat milk\n\n");

    vault.cmd().args(["sync", "todo.md"]).assert().success();

    assert_eq!(vault.read("a.md"), "# A\n\n> [!todo]\n> buy oat milk\n\n^t1\n");
}

#[test]
fn test_sync_resolves_paths_from_a_subfolder() {
    let vault = Vault::new();
    vault.write("Notes/a.md", "> [!todo]\n> x\n\n^t1\n");

    vault
        .cmd_in(&vault.root().join("Notes"))
        .args(["sync", "a.md"])
        .assert()
        .success();

    assert_eq!(vault.read("todo.md"), "[a](Notes/a.md#^t1)\nx\n\n");
}

#[test]
fn test_sync_missing_document_fails() {
    let vault = Vault::new();

    vault
        .cmd()
        .args(["sync", "nope.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn test_insert_creates_document_and_chunk() {
    let vault = Vault::new();

    let output = vault
        .cmd()
        .args(["insert", "todo", "Inbox.md", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let written: Vec<&str> = result["written"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(written.contains(&"Inbox.md"));
    assert!(written.contains(&"todo.md"));

    let inbox = vault.read("Inbox.md");
    assert!(inbox.starts_with("> [!todo]\n> \n\n^"));
    assert!(vault.read("todo.md").starts_with("[Inbox](Inbox.md#^"));
}

#[test]
fn test_insert_unknown_type_fails() {
    let vault = Vault::new();

    vault
        .cmd()
        .args(["insert", "idea", "Inbox.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'idea' is not tracked"));

    assert!(!vault.root().join("Inbox.md").exists());
}

#[test]
fn test_rebuild_uses_vault_config() {
    let vault = Vault::new();
    vault.write(".callout.toml", "types = [\"todo\"]\nmaster_folder = \"Lists\"\n");
    vault.write("a.md", "> [!todo]\n> a\n\n^t1\n");
    vault.write("b.md", "> [!todo]\n> b\n\n^t2\n");

    vault
        .cmd()
        .arg("rebuild")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rebuilt Lists/todo.md."));

    assert_eq!(
        vault.read("Lists/todo.md"),
        "[a](a.md#^t1)\na\n\n[b](b.md#^t2)\nb\n\n"
    );
}

#[test]
fn test_doctor_reports_drift_without_writing() {
    let vault = Vault::new();
    let master = "[gone](gone.md#^t9)\nstale\n\n";
    vault.write("todo.md", master);

    vault
        .cmd()
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Drift found:"))
        .stdout(predicate::str::contains("gone.md#^t9"));

    assert_eq!(vault.read("todo.md"), master);
}

#[test]
fn test_config_json() {
    let vault = Vault::new();
    vault.write(".callout.toml", "debounce_ms = 300\n");

    let output = vault
        .cmd()
        .args(["config", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["config"]["debounce_ms"], 300);
    assert_eq!(result["config"]["types"][0], "todo");
}

#[test]
fn test_env_overrides_vault_config() {
    let vault = Vault::new();
    vault.write(".callout.toml", "types = [\"todo\"]\n");

    vault
        .cmd()
        .env("CALLOUT_TYPES", "idea,todo")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("idea, todo"));
}

#[test]
fn test_explicit_vault_must_exist() {
    let vault = Vault::new();

    vault
        .cmd()
        .args(["--vault", "missing", "rebuild"])
        .assert()
        .failure();
}

#[cfg(unix)]
#[test]
fn test_watch_syncs_pending_edits_on_sigterm() {
    use std::process::{Command as StdCommand, Stdio};
    use std::thread::sleep;
    use std::time::Duration;

    let vault = Vault::new();
    let mut child = StdCommand::new(cargo_bin("callout"))
        .current_dir(vault.root())
        .env("XDG_CONFIG_HOME", vault.temp.path().join("xdg"))
        .env("HOME", vault.temp.path().join("home"))
        .env("CALLOUT_DEBOUNCE_MS", "60000")
        .env_remove("CALLOUT_TYPES")
        .env_remove("CALLOUT_MASTER_FOLDER")
        .env_remove("CALLOUT_SUPPRESS_MS")
        .arg("watch")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    sleep(Duration::from_millis(1500));
    vault.write("a.md", "> [!todo]\n> x\n\n^t1\n");
    sleep(Duration::from_millis(1500));

    let killed = StdCommand::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let status = child.wait().unwrap();
    assert!(status.success());
    assert_eq!(vault.read("todo.md"), "[a](a.md#^t1)\nx\n\n");
}
