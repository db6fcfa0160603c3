//! CLI argument parsing

use crate::backends;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate dynamic help text for the backend argument
fn backend_help() -> String {
    format!(
        "Storage backend, optionally with options (name:key=value,...) [available: {}]",
        backends::backend_names_short()
    )
}

#[derive(Parser)]
#[command(name = "fbflash")]
#[command(author, version, about = "Flash fastboot images onto MTD partitions", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Storage backend to use
    #[arg(short = 'p', long, global = true, default_value = "linux_mtd", help = backend_help())]
    pub backend: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the geometry of a partition
    Info {
        /// Partition name
        partition: String,
    },

    /// Erase a whole partition
    Erase {
        /// Partition name
        partition: String,
    },

    /// Write an image (raw or sparse) to a partition
    Flash {
        /// Partition name
        partition: String,

        /// Image file
        image: PathBuf,
    },

    /// List the partitions the backend exposes
    List,

    /// List supported backends
    ListBackends,
}
