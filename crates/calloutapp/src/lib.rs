//! # Callout Architecture
//!
//! Calloutapp keeps one **master document** per tracked callout type in sync with the
//! callout blocks scattered across a markdown vault. A vault note like
//!
//! ```text
//! > [!todo]
//! > - [ ] buy milk
//!
//! ^k3f9a2xq
//! ```
//!
//! shows up in `todo.md` as a linked chunk:
//!
//! ```text
//! [Shopping](Shopping.md#^k3f9a2xq)
//! - [ ] buy milk
//!
//! ```
//!
//! Edits flow both ways. Changing the note rewrites its chunk; changing the chunk
//! rewrites the note's callout body. The block identifier (`^k3f9a2xq`) is the join
//! key and is never changed once assigned.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (crates/callout)                                       │
//! │  - Argument parsing, logging setup, rendering, watch loop   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API + Commands (api.rs, commands/)                         │
//! │  - insert / sync / rebuild / doctor / config                │
//! │  - Return structured CmdResult values, never print          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Controller (controller.rs, watch.rs)                       │
//! │  - Debounce + self-write suppression per path               │
//! │  - Routes a changed path to the right sync direction        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine (engine.rs)                                         │
//! │  - Reads documents, calls the pure reconcilers, writes      │
//! │    only what changed and reports every path it wrote        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Pure text layer (lines, callout, chunk, reconcile)         │
//! │  - text -> structured records -> line-range edits -> text   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The storage layer ([`store::Vault`]) sits beside the engine: [`store::fs::FsVault`]
//! for real vaults and [`store::memory::MemVault`] for tests.
//!
//! ## Key Principle: Documents Are the Truth
//!
//! Nothing is cached between passes. Every reconciliation reads the current text,
//! re-parses it from scratch, and writes back only the minimally changed projection.
//! Parsers are total: malformed input yields "no match", never an error.

pub mod api;
pub mod callout;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod controller;
pub mod editor;
pub mod engine;
pub mod error;
pub mod init;
pub mod lines;
pub mod paths;
pub mod reconcile;
pub mod store;
pub mod watch;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
