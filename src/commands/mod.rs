//! CLI command implementations
//!
//! Every partition command runs against a [`FastbootFlash`] engine built
//! on the selected backend. The fastboot response line is printed as-is,
//! and a `FAIL` response makes the process exit with an error.

mod erase;
mod flash;
mod info;
mod list;

pub use erase::run_erase;
pub use flash::run_flash;
pub use info::run_info;
pub use list::{list_backends, list_partitions};

use crate::cli::Commands;
use fbflash_core::flash::FastbootFlash;
use fbflash_core::mtd::MtdDriver;
use fbflash_core::response::{FastbootResponse, ResponseKind};
use fbflash_core::sparse::NoSparseSupport;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Run a partition command on `driver`
pub fn run<D: MtdDriver>(driver: D, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let mut flash = FastbootFlash::new(driver, NoSparseSupport);

    match command {
        Commands::Info { partition } => run_info(&mut flash, &partition),
        Commands::Erase { partition } => run_erase(&mut flash, &partition),
        Commands::Flash { partition, image } => run_flash(&mut flash, &partition, &image),
        Commands::List => list_partitions(&mut flash),
        Commands::ListBackends => {
            list_backends();
            Ok(())
        }
    }
}

/// Print the response line, turning a `FAIL` into an error
fn finish(response: &FastbootResponse) -> Result<(), Box<dyn std::error::Error>> {
    if response.is_empty() {
        return Ok(());
    }

    println!("{}", response.as_str());
    match response.kind() {
        Some(ResponseKind::Fail) => Err(response.message().to_string().into()),
        _ => Ok(()),
    }
}

/// Spinner shown while a single long operation runs
fn spinner(msg: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
