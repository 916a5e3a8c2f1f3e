use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "scour", version)]
#[command(
    about = "Securely delete a directory tree and flush its traces from filesystem metadata",
    long_about = None
)]
pub struct Cli {
    /// Log every processed item
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rename, overwrite and delete everything under a directory, then the directory itself
    Wipe(WipeArgs),
    /// Churn the change journal with create/rename/delete cycles of tiny files
    FloodJournal(FloodJournalArgs),
    /// Fill snapshot storage with random data so older copies are evicted
    FloodStorage(FloodStorageArgs),
    /// Show journal and snapshot capacity of a volume and the computed flood sizes
    Capacity {
        /// Any directory on the volume to inspect
        dir: PathBuf,
    },
    /// Print the effective configuration as TOML
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct WipeArgs {
    /// Directory to destroy
    pub target: PathBuf,

    /// Overwrite passes per file
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub passes: Option<u32>,

    /// Skip renaming entries to random names before deletion
    #[arg(long)]
    pub no_rename: bool,

    /// Sync to disk after every pass instead of once after the last
    #[arg(long)]
    pub sync_every_pass: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Flood the change journal afterwards (auto-sized unless FILES is given)
    #[arg(long, value_name = "FILES", num_args = 0..=1, require_equals = true)]
    pub flood_journal: Option<Option<u64>>,

    /// Flood snapshot storage afterwards (auto-sized unless GB is given)
    #[arg(long, value_name = "GB", num_args = 0..=1, require_equals = true)]
    pub flood_storage: Option<Option<f64>>,
}

#[derive(Debug, Args)]
pub struct FloodJournalArgs {
    /// Directory on the volume to flood
    pub dir: PathBuf,

    /// Number of files to cycle instead of the computed count
    #[arg(long)]
    pub files: Option<u64>,
}

#[derive(Debug, Args)]
pub struct FloodStorageArgs {
    /// Directory on the volume to flood
    pub dir: PathBuf,

    /// Gigabytes to write instead of the computed amount
    #[arg(long)]
    pub gb: Option<f64>,
}
