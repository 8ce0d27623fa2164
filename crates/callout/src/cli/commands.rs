//! # CLI Layer
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs the log subscriber
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: Convert shell arguments into typed commands via clap
//! 2. **Context Setup**: Find the vault, load its configuration, build the API
//! 3. **Dispatch**: Route commands to the API facade
//! 4. **Output Formatting**: Hand the `CmdResult` to `render`
//! 5. **Error Handling**: Turn failures into an error line and a non-zero exit

use super::render::render;
use super::setup::{Cli, Commands};
use super::watch;
use anyhow::{bail, Context};
use calloutapp::init::{initialize, CalloutContext};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("cannot determine the working directory")?;
    let ctx = initialize(&cwd, cli.vault.clone())?;

    if let Commands::Watch = cli.command {
        return watch::run(ctx, cli.output);
    }

    let result = dispatch(&ctx, &cwd, cli.command)?;
    print!("{}", render(&result, cli.output)?);

    if result.has_errors() {
        bail!("some documents could not be synced");
    }
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise warnings only, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn dispatch(
    ctx: &CalloutContext,
    cwd: &Path,
    command: Commands,
) -> anyhow::Result<calloutapp::api::CmdResult> {
    let result = match command {
        Commands::Insert { kind, file, line } => {
            let path = ctx.vault_path(cwd, &file)?;
            ctx.api.insert(&kind, &path, line)?
        }
        Commands::Sync { file } => {
            let path = ctx.vault_path(cwd, &file)?;
            ctx.api.sync(&path)?
        }
        Commands::Rebuild => ctx.api.rebuild()?,
        Commands::Doctor => ctx.api.doctor()?,
        Commands::Config => ctx.api.config()?,
        Commands::Watch => bail!("watch is not a one-shot command"),
    };
    Ok(result)
}
