//! Erase region planning
//!
//! NAND-like media must be erased before they can be programmed again, and
//! only in whole erase blocks. These helpers compute the region to erase
//! ahead of a write. They perform no I/O.

/// A region of a partition to erase, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraseRegion {
    /// Start offset within the partition
    pub offset: u64,
    /// Number of bytes to erase
    pub len: u64,
}

impl EraseRegion {
    /// Plan the erase ahead of writing `requested` bytes at offset 0
    ///
    /// The length is rounded up to a whole number of erase blocks, then
    /// clamped to the partition size. Only this region is erased; the rest
    /// of the partition keeps its previous content.
    ///
    /// # Arguments
    /// * `size` - Partition size in bytes
    /// * `erase_size` - Erase block size in bytes
    /// * `requested` - Number of bytes about to be written
    pub fn for_write(size: u64, erase_size: u32, requested: u64) -> Self {
        let len = align_up(requested, erase_size as u64).min(size);
        Self { offset: 0, len }
    }

    /// Plan an erase of the whole partition
    pub fn whole(size: u64) -> Self {
        Self { offset: 0, len: size }
    }

    /// First byte past the region
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Round `value` up to a multiple of `align`
///
/// An alignment of 0 leaves the value unchanged.
fn align_up(value: u64, align: u64) -> u64 {
    if align == 0 {
        return value;
    }
    value.div_ceil(align).saturating_mul(align)
}
