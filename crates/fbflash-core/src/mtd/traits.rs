//! MTD driver and device trait definitions

use crate::error::Result;

#[cfg(feature = "alloc")]
use alloc::{string::String, vec::Vec};

/// A resolved partition on block-erasable, page-addressed storage
///
/// Offsets are relative to the start of the partition. The driver applies
/// the physical partition offset itself, so every partition starts at 0.
///
/// # Geometry
///
/// - `erase_size()` is the smallest region the medium can erase
/// - `write_size()` is the smallest region it can program (the page size)
/// - `size()` is expected to be a whole multiple of `erase_size()`
pub trait MtdDevice {
    /// Partition name as registered with the driver
    fn name(&self) -> &str;

    /// Total addressable size in bytes
    fn size(&self) -> u64;

    /// Erase block size in bytes
    fn erase_size(&self) -> u32;

    /// Page size in bytes (minimum write granularity)
    fn write_size(&self) -> u32;

    /// Erase a region of the partition
    ///
    /// # Arguments
    /// * `offset` - Starting offset (aligned to `erase_size()`)
    /// * `len` - Number of bytes to erase (multiple of `erase_size()`)
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the region extends beyond the partition
    /// * `InvalidAlignment` - If offset or length is not erase aligned
    /// * `EraseError` - If the medium rejected the erase
    fn erase(&mut self, offset: u64, len: u64) -> Result<()>;

    /// Program data into the partition
    ///
    /// The target region must have been erased. Returns the number of
    /// bytes written.
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the write extends beyond the partition
    /// * `WriteError` - If the medium rejected the write
    fn write(&mut self, offset: u64, data: &[u8]) -> Result<usize>;

    /// Check if a range is valid for this device
    fn is_valid_range(&self, offset: u64, len: u64) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.size())
    }
}

/// A storage driver that hands out partitions by name
///
/// Devices are reference counted by the driver: every successful
/// `get_device()` must be paired with exactly one `put_device()`. The
/// [`resolve`](crate::resolve::resolve) function wraps this pairing in a
/// guard so callers never do it by hand.
pub trait MtdDriver {
    /// Handle type for a resolved partition
    type Device: MtdDevice;

    /// Enumerate and probe devices
    ///
    /// Must be idempotent. Some drivers register partitions lazily, so a
    /// device may only become visible after a repeated probe.
    fn probe_devices(&mut self);

    /// Look up a partition by name
    ///
    /// # Errors
    /// * `NoDevice` - If no partition with this name is registered
    /// * any other error - If the lookup itself failed
    fn get_device(&mut self, name: &str) -> Result<Self::Device>;

    /// Release a partition obtained from `get_device()`
    fn put_device(&mut self, device: Self::Device);

    /// Names of all registered partitions
    #[cfg(feature = "alloc")]
    fn device_names(&mut self) -> Vec<String> {
        Vec::new()
    }
}
