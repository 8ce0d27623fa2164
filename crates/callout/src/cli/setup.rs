use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "callout", bin_name = "callout", version)]
#[command(
    about = "Mirror markdown callouts into per-type master documents and back",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault root (default: nearest folder with .obsidian or .callout.toml)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub vault: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputMode::Text,
        help_heading = "Options"
    )]
    pub output: OutputMode,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Insert a new callout into a document
    Insert {
        /// Callout type, one of the tracked types
        #[arg(value_name = "TYPE")]
        kind: String,

        /// Document to insert into (created if missing)
        file: String,

        /// Line to insert at, 1-based (default: end of document)
        #[arg(short, long)]
        line: Option<usize>,
    },

    /// Sync one document now
    Sync {
        /// A source document or a master document
        file: String,
    },

    /// Rebuild all master documents from the sources
    Rebuild,

    /// Watch the vault and keep masters and sources in sync
    Watch,

    /// Report drift between masters and sources
    Doctor,

    /// Show the effective configuration
    Config,
}
