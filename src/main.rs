//! fbflash - Flash fastboot images onto MTD partitions
//!
//! Command-line front end for `fbflash-core`. It resolves partitions by
//! name on the selected storage backend and performs the same operations
//! a fastboot `getvar`/`erase`/`flash` request would, printing the
//! fastboot response line for each.

mod backends;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
        command => backends::run_with_backend(&cli.backend, command),
    }
}
