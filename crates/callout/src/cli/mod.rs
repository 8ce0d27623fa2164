//! # CLI Behavior
//!
//! This is **one possible UI client** for callout, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and output
//! formatting.
//!
//! ## Commands
//!
//! - `callout insert <type> <file> [--line N]`: add an empty callout and sync it
//! - `callout sync <file>`: sync one document now, source or master
//! - `callout rebuild`: regenerate every master from the sources
//! - `callout watch`: keep the vault in sync until interrupted
//! - `callout doctor`: list drift without writing anything
//! - `callout config`: show the effective configuration
//!
//! File arguments may be absolute, relative to the working directory, or relative to
//! the vault root.
//!
//! ## Output
//!
//! `--output text` (the default) prints styled messages; `--output json` prints the
//! `CmdResult` as JSON. Logging goes to stderr and follows `RUST_LOG`, falling back
//! to `warn` (`debug` with `--verbose`).
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Context initialization and dispatch
//! - `render`: Output formatting
//! - `styles`: Terminal styling
//! - `watch`: The watch loop

mod commands;
mod render;
pub mod setup;
mod styles;
mod watch;

pub use commands::run;
