use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "leaselock",
    version,
    about = "Advisory, time-bounded file locks backed by lease marker files",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub marker: MarkerArgs,

    /// Verbose output (repeat for more)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short = 'q', long, conflicts_with = "verbose", global = true)]
    pub quiet: bool,
}

/// How markers are named and how long they live.
#[derive(ClapArgs, Debug, Clone)]
pub struct MarkerArgs {
    /// Lease duration (e.g., "500ms", "30s", "5m")
    #[arg(short = 'l', long, value_name = "DURATION", default_value = "60s", global = true)]
    pub lease: String,

    /// Suffix appended to the resource path to name its marker
    #[arg(long, value_name = "SUFFIX", default_value = ".lock", global = true)]
    pub suffix: String,

    /// Keep markers in the platform cache directory under hashed names
    #[arg(long, conflicts_with_all = ["marker", "suffix"], global = true)]
    pub cache_dir: bool,

    /// Explicit marker path (overrides naming)
    #[arg(long, value_name = "PATH", global = true)]
    pub marker: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Take the lock, failing immediately (exit 2) if it is held
    Acquire {
        #[arg(value_name = "RESOURCE")]
        resource: PathBuf,
    },

    /// Drop the lock; succeeds if it was not held
    Release {
        #[arg(value_name = "RESOURCE")]
        resource: PathBuf,
    },

    /// Extend the lease of a held lock (exit 3 if not locked)
    Renew {
        #[arg(value_name = "RESOURCE")]
        resource: PathBuf,
    },

    /// Show whether the resource is locked and for how long
    Status {
        #[arg(value_name = "RESOURCE")]
        resource: PathBuf,
    },

    /// Remove expired markers from a directory
    Housekeep {
        /// Directory to sweep (default: current directory)
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Scan subdirectories
        #[arg(short = 'r', long)]
        recursive: bool,

        /// Show what would be deleted without deleting
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}
