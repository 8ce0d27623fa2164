//! # Callout CLI Architecture
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this file only
//! invokes `cli::run()` and handles process termination. Everything that knows about
//! callouts, masters and chunks lives in the `calloutapp` library.
//!
//! ## Workspace Structure
//!
//! - `crates/calloutapp/`: core library (parsing, reconciliation, engine, controller)
//! - `crates/callout/`: this CLI tool, depends on the `calloutapp` library
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/callout/src/cli/)                        │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Context wiring + dispatch (commands.rs)                  │
//! │  - Terminal rendering (render.rs, styles.rs)                │
//! │  - The long-running watch loop (watch.rs)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/calloutapp/src/api.rs)                   │
//! │  - Normalizes vault paths                                   │
//! │  - Dispatches to command modules                            │
//! │  - Returns structured `CmdResult` values                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command + Engine Layer (crates/calloutapp/src/...)         │
//! │  - Sync passes over a `Vault`                               │
//! │  - No knowledge of stdout/stderr or process exits           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Testing Approach
//!
//! - **Library**: unit tests beside each module against the in-memory vault, plus
//!   scenario tests on real temp directories.
//! - **CLI layer**: rendering is checked with canned `CmdResult` values; the binary
//!   itself is exercised end to end with `assert_cmd` in `tests/`.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
