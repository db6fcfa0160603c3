//! List commands implementation

use crate::backends;
use fbflash_core::flash::FastbootFlash;
use fbflash_core::mtd::MtdDriver;
use fbflash_core::response::FastbootResponse;
use fbflash_core::sparse::SparseDecoder;

/// List all supported backends
pub fn list_backends() {
    println!("Supported backends:");
    println!();
    for b in backends::available_backends() {
        if b.aliases.is_empty() {
            println!("  {:<10} - {}", b.name, b.description);
        } else {
            println!(
                "  {:<10} - {} (aliases: {})",
                b.name,
                b.description,
                b.aliases.join(", ")
            );
        }
    }
}

/// List the partitions the backend exposes
pub fn list_partitions<D: MtdDriver, S: SparseDecoder>(
    flash: &mut FastbootFlash<D, S>,
) -> Result<(), Box<dyn std::error::Error>> {
    let driver = flash.driver_mut();
    driver.probe_devices();
    let names = driver.device_names();

    if names.is_empty() {
        println!("No partitions found");
        return Ok(());
    }

    println!("{:<20} {:>10} {:>8} {:>10}", "Name", "Size", "Block", "Blocks");
    println!("{}", "-".repeat(51));

    for name in names {
        let mut response = FastbootResponse::new();
        match flash.get_part_info(&name, &mut response) {
            Ok(info) => println!(
                "{:<20} {:>10} {:>8} {:>10}",
                info.name,
                format_size(info.size),
                info.blksz,
                info.block_count()
            ),
            Err(e) => log::warn!("Skipping '{}': {}", name, e),
        }
    }

    Ok(())
}

pub(super) fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
