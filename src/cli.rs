use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "reclaim",
    about = "Reclaim disk space from temp, cache, log and recycle-bin locations",
    version
)]
pub struct Cli {
    /// Config file (defaults to <config dir>/reclaim/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List catalogued locations without scanning
    List,

    /// Measure every location (read-only)
    Scan,

    /// Clean the given locations (requires --confirm to actually delete)
    Clean {
        /// Location keys, cleaned in the order given
        keys: Vec<String>,

        /// Every catalogued location
        #[arg(long, conflicts_with_all = ["keys", "temp_only"])]
        all: bool,

        /// Only the temporary-file locations
        #[arg(long, conflicts_with = "keys")]
        temp_only: bool,

        /// Actually delete files. Without this flag, behaves like scan.
        #[arg(long)]
        confirm: bool,
    },

    /// Scan, then show totals per category
    Summary,

    /// Free and used space per fixed volume
    Disks,
}
