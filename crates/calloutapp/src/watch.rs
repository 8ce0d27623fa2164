//! # File Watching
//!
//! Bridges OS file notifications (via `notify`) to [`VaultEvent`]s and drives the
//! [`Controller`] from a blocking loop.
//!
//! ## Renames
//!
//! Backends report a rename in halves. On Linux one rename arrives as
//! `Name(From)`, `Name(To)` and finally `Name(Both)`, the three sharing a tracker
//! id. [`EventMapper`] holds a `From` back until its partner shows up:
//!
//! - a `To` with the same tracker means a `Both` follows, so both halves are dropped;
//! - a `To` without a tracker pairs with the latest untracked `From`;
//! - a `From` nobody claims within [`RENAME_GRACE`] left the vault and becomes a
//!   deletion; an unclaimed `To` arrived from outside and becomes a modification.
//!
//! Rename destinations are checked with `is_dir`, which is how a folder rename is
//! told apart from a file swap. Writes through [`crate::store::fs::FsVault`] show up
//! as a rename from a hidden temp file onto the target, which maps to
//! `Modified(target)`, so the controller's suppression sees them like any other
//! write.
//!
//! ## Stopping
//!
//! The loop ends on [`WatchMessage::Stop`] (see [`StopHandle`]) or when every sender
//! is gone. Either way pending passes are flushed and the controller shut down.

use crate::controller::{Controller, VaultEvent};
use crate::error::Result;
use crate::paths::{file_name, is_hidden, is_markdown, is_tracked_document, relative_path};
use crate::store::Vault;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long the loop blocks when nothing is pending.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// How long the first half of a rename waits for its partner.
pub const RENAME_GRACE: Duration = Duration::from_millis(500);

/// What the watch loop receives.
#[derive(Debug)]
pub enum WatchMessage {
    Notify(notify::Result<Event>),
    Stop,
}

/// Asks a running watch loop to flush and return.
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: Sender<WatchMessage>,
}

impl StopHandle {
    pub fn new(sender: Sender<WatchMessage>) -> Self {
        Self { sender }
    }

    pub fn stop(&self) {
        let _ = self.sender.send(WatchMessage::Stop);
    }
}

/// Deleted paths can no longer be inspected: accept markdown files and anything
/// without an extension (likely a folder).
fn is_deletable(path: &str) -> bool {
    !is_hidden(path) && (is_markdown(path) || !file_name(path).contains('.'))
}

fn modified(path: String) -> Vec<VaultEvent> {
    if is_tracked_document(&path) {
        vec![VaultEvent::Modified(path)]
    } else {
        Vec::new()
    }
}

fn deleted(path: String) -> Vec<VaultEvent> {
    if is_deletable(&path) {
        vec![VaultEvent::Deleted(path)]
    } else {
        Vec::new()
    }
}

fn renamed(root: &Path, from: String, to: String) -> Vec<VaultEvent> {
    let folder = !is_hidden(&from) && !is_hidden(&to) && root.join(&to).is_dir();
    if folder || (is_tracked_document(&from) && is_tracked_document(&to)) {
        return vec![VaultEvent::Renamed { from, to }];
    }
    if is_tracked_document(&to) {
        return modified(to);
    }
    deleted(from)
}

/// The first half of a rename, waiting for the second.
#[derive(Debug)]
struct Departure {
    tracker: Option<usize>,
    path: String,
    deadline: Instant,
}

/// Converts notifications into vault events, pairing rename halves.
#[derive(Debug)]
pub struct EventMapper {
    root: PathBuf,
    departures: Vec<Departure>,
}

impl EventMapper {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            departures: Vec::new(),
        }
    }

    /// When the oldest unpaired `From` gives up waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.departures.iter().map(|d| d.deadline).min()
    }

    pub fn map(&mut self, event: &Event, now: Instant) -> Vec<VaultEvent> {
        let paths: Vec<String> = event
            .paths
            .iter()
            .filter_map(|p| relative_path(&self.root, p))
            .collect();
        let tracker = event.attrs.tracker();

        match event.kind {
            EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Any => paths.into_iter().flat_map(modified).collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut ends = paths.into_iter();
                match (ends.next(), ends.next()) {
                    (Some(from), Some(to)) => {
                        self.departures.retain(|d| {
                            d.path != from && (tracker.is_none() || d.tracker != tracker)
                        });
                        renamed(&self.root, from, to)
                    }
                    (Some(only), None) => modified(only),
                    _ => Vec::new(),
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                for path in paths {
                    debug!(path = path.as_str(), "rename started");
                    self.departures.push(Departure {
                        tracker,
                        path,
                        deadline: now + RENAME_GRACE,
                    });
                }
                Vec::new()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => paths
                .into_iter()
                .flat_map(|to| self.arrive(to, tracker))
                .collect(),
            EventKind::Remove(_) => paths.into_iter().flat_map(deleted).collect(),
            EventKind::Modify(ModifyKind::Name(_)) => paths.into_iter().flat_map(modified).collect(),
            EventKind::Modify(_) | EventKind::Access(_) | EventKind::Other => Vec::new(),
        }
    }

    /// Turns every `From` whose partner never came into a deletion.
    pub fn expire(&mut self, now: Instant) -> Vec<VaultEvent> {
        let (gone, waiting): (Vec<Departure>, Vec<Departure>) =
            std::mem::take(&mut self.departures)
                .into_iter()
                .partition(|d| d.deadline <= now);
        self.departures = waiting;
        gone.into_iter().flat_map(|d| deleted(d.path)).collect()
    }

    fn arrive(&mut self, to: String, tracker: Option<usize>) -> Vec<VaultEvent> {
        let partner = match tracker {
            Some(_) => self.departures.iter().position(|d| d.tracker == tracker),
            None => self.departures.iter().rposition(|d| d.tracker.is_none()),
        };
        match partner {
            // A `Both` carrying the two paths is on its way.
            Some(idx) if tracker.is_some() => {
                self.departures.remove(idx);
                Vec::new()
            }
            Some(idx) => {
                let from = self.departures.remove(idx).path;
                renamed(&self.root, from, to)
            }
            None => modified(to),
        }
    }
}

/// A recursive watch on a vault directory.
pub struct VaultWatcher {
    root: PathBuf,
    sender: Sender<WatchMessage>,
    receiver: Receiver<WatchMessage>,
    _watcher: RecommendedWatcher,
}

impl VaultWatcher {
    pub fn start(root: &Path) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<WatchMessage>();
        let notify_sender = sender.clone();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_sender.send(WatchMessage::Notify(res));
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "watching vault");

        Ok(Self {
            root: root.to_path_buf(),
            sender,
            receiver,
            _watcher: watcher,
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.sender.clone())
    }

    /// Blocks until a [`StopHandle`] fires.
    pub fn run<V, F>(self, controller: &mut Controller<V>, on_notice: F)
    where
        V: Vault,
        F: FnMut(&str),
    {
        run_loop(&self.root, &self.receiver, controller, on_notice);
    }
}

/// The event loop: waits for notifications until the next deadline, feeds them to
/// the controller and runs due passes. On stop, or once the channel is closed,
/// runs everything still pending and calls [`Controller::shutdown`].
pub fn run_loop<V, F>(
    root: &Path,
    receiver: &Receiver<WatchMessage>,
    controller: &mut Controller<V>,
    mut on_notice: F,
) where
    V: Vault,
    F: FnMut(&str),
{
    let mut mapper = EventMapper::new(root);
    loop {
        let deadline = controller
            .next_deadline()
            .into_iter()
            .chain(mapper.next_deadline())
            .min();
        let timeout = deadline.map_or(IDLE_WAIT, |deadline| {
            deadline.saturating_duration_since(Instant::now())
        });

        match receiver.recv_timeout(timeout) {
            Ok(WatchMessage::Notify(Ok(event))) => {
                let now = Instant::now();
                for vault_event in mapper.map(&event, now) {
                    debug!(?vault_event, "vault event");
                    controller.handle(vault_event, now);
                }
            }
            Ok(WatchMessage::Notify(Err(error))) => warn!(%error, "watch error"),
            Ok(WatchMessage::Stop) => {
                info!("stop requested");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        for vault_event in mapper.expire(now) {
            debug!(?vault_event, "unpaired rename");
            controller.handle(vault_event, now);
        }
        controller.poll(now);
        for notice in controller.take_notices() {
            on_notice(&notice);
        }
    }

    controller.flush(Instant::now());
    for notice in controller.take_notices() {
        on_notice(&notice);
    }
    controller.shutdown();
}
