//! Chunk sinks

use crate::mtd::MtdDevice;

/// Block-addressed destination for decoded sparse chunks
///
/// Both methods return the number of blocks consumed. Returning fewer
/// blocks than requested (normally 0) tells the decoder the chunk failed,
/// and the decoder aborts the image.
pub trait ChunkSink {
    /// Write `blkcnt` blocks of `data` starting at block `blk`
    fn write_chunk(&mut self, blk: u64, blkcnt: u64, data: &[u8]) -> u64;

    /// Account for a "don't care" range of `blkcnt` blocks at `blk`
    fn reserve_chunk(&mut self, blk: u64, blkcnt: u64) -> u64;
}

/// [`ChunkSink`] that programs chunks into an MTD partition
///
/// Blocks are pages: block `n` lives at byte offset `n * write_size()`.
/// Skipped ranges are not touched; their content is whatever the medium
/// held before, so callers wanting a clean partition must erase it first.
pub struct MtdChunkSink<'a, M: MtdDevice + ?Sized> {
    device: &'a mut M,
    blksz: u32,
    blocks: u64,
}

impl<'a, M: MtdDevice + ?Sized> MtdChunkSink<'a, M> {
    /// Wrap a device, using its page size as block size
    pub fn new(device: &'a mut M) -> Self {
        let blksz = device.write_size();
        let blocks = if blksz == 0 {
            0
        } else {
            device.size() / blksz as u64
        };
        Self {
            device,
            blksz,
            blocks,
        }
    }

    /// Block size in bytes
    pub fn blksz(&self) -> u32 {
        self.blksz
    }

    /// Number of whole blocks addressable on the device
    ///
    /// A trailing partial block is not part of the range.
    pub fn block_count(&self) -> u64 {
        self.blocks
    }

    fn in_range(&self, blk: u64, blkcnt: u64) -> bool {
        blk.checked_add(blkcnt)
            .is_some_and(|end| end <= self.blocks)
    }
}

impl<M: MtdDevice + ?Sized> ChunkSink for MtdChunkSink<'_, M> {
    fn write_chunk(&mut self, blk: u64, blkcnt: u64, data: &[u8]) -> u64 {
        if !self.in_range(blk, blkcnt) {
            log::error!(
                "Sparse chunk at block {} (+{}) exceeds {} blocks of '{}'",
                blk,
                blkcnt,
                self.blocks,
                self.device.name()
            );
            return 0;
        }

        let offset = blk * self.blksz as u64;
        let len = blkcnt * self.blksz as u64;
        let Some(chunk) = usize::try_from(len).ok().and_then(|len| data.get(..len)) else {
            log::error!(
                "Sparse chunk at offset 0x{:x} has {} bytes, expected {}",
                offset,
                data.len(),
                len
            );
            return 0;
        };

        match self.device.write(offset, chunk) {
            Ok(_) => blkcnt,
            Err(e) => {
                log::error!("MTD write error at offset 0x{:x}: {}", offset, e);
                0
            }
        }
    }

    fn reserve_chunk(&mut self, _blk: u64, blkcnt: u64) -> u64 {
        blkcnt
    }
}
