//! Flash command implementation

use super::{finish, spinner};
use fbflash_core::flash::FastbootFlash;
use fbflash_core::mtd::MtdDriver;
use fbflash_core::response::FastbootResponse;
use fbflash_core::sparse::SparseDecoder;
use std::path::Path;

/// Write an image file to a partition
pub fn run_flash<D: MtdDriver, S: SparseDecoder>(
    flash: &mut FastbootFlash<D, S>,
    partition: &str,
    image: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(image)
        .map_err(|e| format!("Failed to read image {}: {}", image.display(), e))?;

    log::info!("Loaded {} ({} bytes)", image.display(), data.len());

    let mut response = FastbootResponse::new();

    let pb = spinner(format!(
        "Flashing {} bytes to '{}'...",
        data.len(),
        partition
    ))?;
    let result = flash.write(partition, &data, &mut response);
    pb.finish_and_clear();

    finish(&response)?;
    result?;
    Ok(())
}
