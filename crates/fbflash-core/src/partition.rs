//! Partition geometry queries
//!
//! The protocol layer validates an image against the target partition
//! before downloading or flashing it. This module builds that summary.

use heapless::String;

use crate::error::Result;
use crate::mtd::{MtdDevice, MtdDriver};
use crate::resolve::{report_resolve_error, resolve};
use crate::response::Response;

/// Capacity of the partition name field
pub const PART_NAME_LEN: usize = 32;

/// Caller-visible summary of a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    /// Logical start; always 0, the driver applies the physical offset
    pub start: u64,
    /// Partition size in bytes
    pub size: u64,
    /// Block size in bytes
    ///
    /// This is the page size rather than the erase size, which gives
    /// sparse images a finer addressing granularity.
    pub blksz: u32,
    /// Partition name, truncated to [`PART_NAME_LEN`] bytes
    pub name: String<PART_NAME_LEN>,
}

impl PartitionInfo {
    /// Build the summary for a resolved device
    pub fn from_device<M: MtdDevice + ?Sized>(device: &M) -> Self {
        Self {
            start: 0,
            size: device.size(),
            blksz: device.write_size(),
            name: truncate_name(device.name()),
        }
    }

    /// Number of whole blocks in the partition
    pub fn block_count(&self) -> u64 {
        if self.blksz == 0 {
            return 0;
        }
        self.size / self.blksz as u64
    }
}

/// Copy as much of `name` as fits, stopping on a character boundary
fn truncate_name(name: &str) -> String<PART_NAME_LEN> {
    let mut out = String::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Look up the geometry of a partition
///
/// The response sink is only written on failure: "partition not given"
/// for an empty name, "partition not found" if the name does not resolve.
pub fn get_part_info<D: MtdDriver + ?Sized>(
    driver: &mut D,
    name: &str,
    response: &mut dyn Response,
) -> Result<PartitionInfo> {
    let device =
        resolve(driver, name).map_err(|e| report_resolve_error(name, e, response))?;

    Ok(PartitionInfo::from_device(&*device))
}
