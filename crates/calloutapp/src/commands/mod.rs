//! # Command Layer
//!
//! Each user-facing operation lives in its own submodule as a plain function over a
//! [`SyncEngine`]. Commands return a structured [`CmdResult`]; they never print.
//!
//! ## What Commands Do NOT Do
//!
//! - **Terminal I/O**: no stdout or stderr; the binary renders the result.
//! - **Argument parsing**: paths arrive vault-relative, types arrive as typed.
//! - **Exit codes**: they return `Result`, the caller decides.
//!
//! ## Failures
//!
//! A command fails (`Err`) when the document it was pointed at cannot be read or
//! written. Failures confined to one master or one source during a pass do not fail
//! the command: they are reported as error messages in the result, so the user sees
//! every problem of a pass at once.
//!
//! ## Command Modules
//!
//! - [`insert`]: Add a callout skeleton to a document, then sync it
//! - [`sync`]: Sync one document now (source or master)
//! - [`rebuild`]: Regenerate every master document
//! - [`doctor`]: Read-only drift report
//! - [`config`]: Show the effective configuration

use crate::config::CalloutConfig;
use crate::engine::SyncReport;
use serde::Serialize;

pub mod config;
pub mod doctor;
pub mod insert;
pub mod rebuild;
pub mod sync;

pub use doctor::{DriftEntry, DriftReport};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct CmdResult {
    /// Vault paths written by the command.
    pub written: Vec<String>,
    pub messages: Vec<CmdMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<CalloutConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftReport>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_config(mut self, config: CalloutConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_drift(mut self, drift: DriftReport) -> Self {
        self.drift = Some(drift);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }

    /// Folds a pass report in: written paths, identifier and drift counts, and one
    /// error message per failure.
    pub fn absorb_report(&mut self, report: SyncReport) {
        if report.assigned > 0 {
            self.add_message(CmdMessage::info(format!(
                "Assigned {} new block identifier(s).",
                report.assigned
            )));
        }
        for path in &report.written {
            if !self.written.contains(path) {
                self.written.push(path.clone());
            }
        }
        if report.drift > 0 {
            self.add_message(CmdMessage::info(format!(
                "Skipped {} chunk(s) whose source callout no longer exists.",
                report.drift
            )));
        }
        for failure in report.failures {
            self.add_message(CmdMessage::error(format!(
                "{}: {}",
                failure.path, failure.error
            )));
        }
    }
}
