//! Per-image write context handed to sparse decoders

use super::sink::ChunkSink;
use crate::response::Response;

/// Everything a sparse decoder needs to stream one image onto storage
///
/// Addresses are in blocks of [`blksz`](Self::blksz) bytes relative to
/// [`start`](Self::start), and the image must fit within
/// [`size`](Self::size) blocks.
pub struct SparseWriteContext<'a> {
    blksz: u32,
    start: u64,
    size: u64,
    sink: &'a mut dyn ChunkSink,
    response: &'a mut dyn Response,
    reported: bool,
}

impl<'a> SparseWriteContext<'a> {
    /// Bind a sink and a response sink to a block geometry
    pub fn new(
        blksz: u32,
        size: u64,
        sink: &'a mut dyn ChunkSink,
        response: &'a mut dyn Response,
    ) -> Self {
        Self {
            blksz,
            start: 0,
            size,
            sink,
            response,
            reported: false,
        }
    }

    /// Block size in bytes
    pub fn blksz(&self) -> u32 {
        self.blksz
    }

    /// First block of the target
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of blocks in the target
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Write a data chunk; returns the number of blocks written
    pub fn write(&mut self, blk: u64, blkcnt: u64, data: &[u8]) -> u64 {
        self.sink.write_chunk(self.start + blk, blkcnt, data)
    }

    /// Skip a "don't care" chunk; returns the number of blocks accounted
    pub fn reserve(&mut self, blk: u64, blkcnt: u64) -> u64 {
        self.sink.reserve_chunk(self.start + blk, blkcnt)
    }

    /// Report a decode or storage failure to the caller
    pub fn fail(&mut self, msg: &str) {
        self.reported = true;
        self.response.fail(msg);
    }

    /// Whether the decoder already reported a failure
    pub fn has_reported(&self) -> bool {
        self.reported
    }
}
