//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ltl", about = "Lintel rule platform CLI", version)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Verbose diagnostic output.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Override the configured database path.
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synchronize the rule store against a declared catalog file.
    Sync(SyncArgs),
    /// List the persisted rule repositories.
    Repos,
    /// List persisted rules with their status.
    Rules(RulesArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Catalog file (`.toml` or `.json`) with the declared repositories.
    #[arg(long)]
    pub catalog: PathBuf,

    /// Installed language keys (repeatable). Defaults to every language
    /// the catalog references.
    #[arg(long = "lang")]
    pub languages: Vec<String>,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Restrict the listing to one repository key.
    #[arg(long)]
    pub repo: Option<String>,
}
