//! Erase command implementation

use super::{finish, spinner};
use fbflash_core::flash::FastbootFlash;
use fbflash_core::mtd::MtdDriver;
use fbflash_core::response::FastbootResponse;
use fbflash_core::sparse::SparseDecoder;

/// Erase a whole partition with progress spinner
pub fn run_erase<D: MtdDriver, S: SparseDecoder>(
    flash: &mut FastbootFlash<D, S>,
    partition: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut response = FastbootResponse::new();

    let pb = spinner(format!("Erasing '{}' (this may take a while)...", partition))?;
    let result = flash.erase(partition, &mut response);
    pb.finish_and_clear();

    finish(&response)?;
    result?;
    Ok(())
}
