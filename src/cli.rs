//! CLI command definitions.
//!
//! The `Cli` struct is the entry surface: global flags for config, database
//! and logging, plus subcommands for running the engine and moving snapshots
//! in and out.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Workdeck workspace engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Path to the remote snapshot file to sync against (overrides config)
    #[arg(short, long, global = true)]
    pub remote: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the engine with its background sync loop (default)
    Run,

    /// Seed the database with the built-in tables, statuses and admin account
    Seed(SeedArgs),

    /// Export the workspace to a JSON snapshot
    Export(ExportArgs),

    /// Import a JSON snapshot into the workspace
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Seed even when the database already holds data
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Force gzip compression (auto-detected from .gz extension otherwise)
    #[arg(long)]
    pub gzip: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Snapshot file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Replace existing data instead of refusing on a non-empty database
    #[arg(long)]
    pub force: bool,
}
