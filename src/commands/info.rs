//! Info command implementation

use super::finish;
use fbflash_core::flash::FastbootFlash;
use fbflash_core::mtd::MtdDriver;
use fbflash_core::response::FastbootResponse;
use fbflash_core::sparse::SparseDecoder;

/// Show the geometry of a partition
pub fn run_info<D: MtdDriver, S: SparseDecoder>(
    flash: &mut FastbootFlash<D, S>,
    partition: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut response = FastbootResponse::new();

    let info = match flash.get_part_info(partition, &mut response) {
        Ok(info) => info,
        Err(e) => {
            finish(&response)?;
            return Err(e.into());
        }
    };

    println!("Partition: {}", info.name);
    println!("Start:     0x{:x}", info.start);
    println!(
        "Size:      {} bytes ({})",
        info.size,
        super::list::format_size(info.size)
    );
    println!("Block:     {} bytes", info.blksz);
    println!("Blocks:    {}", info.block_count());
    Ok(())
}
