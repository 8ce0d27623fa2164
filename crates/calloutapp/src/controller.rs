//! # Change-Propagation Controller
//!
//! Turns a stream of storage notifications into reconciliation passes.
//!
//! ## Per-Path State
//!
//! ```text
//!            Modified              deadline passes
//!   Idle ───────────────> Debounced ──────────────> Reconciling ──> Idle
//!                          │    ▲
//!                          └────┘ Modified (deadline pushed back)
//! ```
//!
//! Orthogonal to that, a path is **Suppressed** for [`Timing::suppress`] after the
//! engine writes it. `Modified` notifications for a suppressed path are dropped:
//! they are the echo of the engine's own write, and reacting to them would bounce
//! edits between a source and its master forever.
//!
//! `Renamed` and `Deleted` skip debouncing and are propagated to the masters as soon
//! as they arrive.
//!
//! ## Time
//!
//! The controller never sleeps and never reads a timer of its own for scheduling.
//! Callers pass `now` into [`Controller::handle`] and [`Controller::poll`], and the
//! event loop in [`crate::watch`] uses [`Controller::next_deadline`] to decide how
//! long to block. Suppression windows start at the later of `now` and the wall
//! clock, so they always begin after the write completed.
//!
//! ## Failures
//!
//! Background passes never return errors. Storage failures are logged. Setup
//! collisions (a folder where a master should be, or the reverse) additionally
//! produce one notice per offending path, collected with
//! [`Controller::take_notices`].

use crate::config::Timing;
use crate::engine::{SyncEngine, SyncReport};
use crate::error::Result;
use crate::paths::{is_within, rebase};
use crate::store::Vault;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, info, warn};

/// A storage change, with vault-relative paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    Modified(String),
    Renamed { from: String, to: String },
    Deleted(String),
}

pub struct Controller<V: Vault> {
    engine: SyncEngine<V>,
    timing: Timing,
    /// Debounce registry: path -> when its pass is due.
    pending: HashMap<String, Instant>,
    /// Suppression registry: path -> end of its window.
    suppressed: HashMap<String, Instant>,
    noticed: HashSet<String>,
    notices: Vec<String>,
}

impl<V: Vault> Controller<V> {
    pub fn new(engine: SyncEngine<V>, timing: Timing) -> Self {
        Self {
            engine,
            timing,
            pending: HashMap::new(),
            suppressed: HashMap::new(),
            noticed: HashSet::new(),
            notices: Vec::new(),
        }
    }

    pub fn engine(&self) -> &SyncEngine<V> {
        &self.engine
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn is_pending(&self, path: &str) -> bool {
        self.pending.contains_key(path)
    }

    pub fn is_suppressed(&self, path: &str, now: Instant) -> bool {
        self.suppressed.get(path).is_some_and(|until| now < *until)
    }

    /// The earliest time a debounced pass falls due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    pub fn handle(&mut self, event: VaultEvent, now: Instant) {
        match event {
            VaultEvent::Modified(path) => {
                if self.is_suppressed(&path, now) {
                    debug!(path = path.as_str(), "ignoring echo of own write");
                    return;
                }
                self.suppressed.remove(&path);
                debug!(path = path.as_str(), "debouncing");
                self.pending.insert(path, now + self.timing.debounce);
            }
            VaultEvent::Renamed { from, to } => {
                info!(from = from.as_str(), to = to.as_str(), "propagating rename");
                self.pending = std::mem::take(&mut self.pending)
                    .into_iter()
                    .map(|(path, due)| match rebase(&path, &from, &to) {
                        Some(moved) => (moved, due),
                        None => (path, due),
                    })
                    .collect();
                let result = self.engine.on_rename(&from, &to);
                self.absorb(&from, result, now);
            }
            VaultEvent::Deleted(path) => {
                info!(path = path.as_str(), "propagating delete");
                self.pending.retain(|pending, _| !is_within(pending, &path));
                let result = self.engine.on_delete(&path);
                self.absorb(&path, result, now);
            }
        }
    }

    /// Runs every pass whose quiet interval has elapsed. Returns the synced paths.
    pub fn poll(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        due.sort();

        for path in &due {
            self.pending.remove(path);
            let result = self.engine.sync_path(path);
            self.absorb(path, result, now);
        }
        self.suppressed.retain(|_, until| now < *until);
        due
    }

    /// Runs every pending pass immediately, regardless of deadlines.
    pub fn flush(&mut self, now: Instant) -> Vec<String> {
        let latest = self.pending.values().max().copied();
        match latest {
            Some(latest) => self.poll(latest.max(now)),
            None => Vec::new(),
        }
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Drops all pending passes, suppression windows and notice history.
    pub fn shutdown(&mut self) {
        info!(
            pending = self.pending.len(),
            suppressed = self.suppressed.len(),
            "controller shutting down"
        );
        self.pending.clear();
        self.suppressed.clear();
        self.noticed.clear();
        self.notices.clear();
    }

    fn absorb(&mut self, trigger: &str, result: Result<SyncReport>, now: Instant) {
        let report = match result {
            Ok(report) => report,
            Err(error) => {
                warn!(path = trigger, %error, "background sync failed");
                if error.is_setup() {
                    self.notice(error.setup_path().unwrap_or(trigger), &error.to_string());
                }
                return;
            }
        };

        let until = Instant::now().max(now) + self.timing.suppress;
        for path in &report.written {
            self.suppressed.insert(path.clone(), until);
        }

        for failure in &report.failures {
            if failure.error.is_setup() {
                let path = failure.error.setup_path().unwrap_or(&failure.path).to_string();
                self.notice(&path, &failure.error.to_string());
            }
        }
    }

    fn notice(&mut self, path: &str, message: &str) {
        if self.noticed.insert(path.to_string()) {
            self.notices.push(message.to_string());
        }
    }
}
