//! Sparse decoder interface

use super::context::SparseWriteContext;
use crate::error::{Error, Result};

/// Magic number at the start of an Android sparse image (little-endian)
pub const SPARSE_HEADER_MAGIC: u32 = 0xED26_FF3A;

/// Size of the Android sparse file header
pub const SPARSE_HEADER_LEN: usize = 28;

/// A sparse image decoder
///
/// Implementations parse the image and drive the context's
/// [`write`](SparseWriteContext::write) and
/// [`reserve`](SparseWriteContext::reserve) in image order, over
/// non-overlapping block ranges. On failure the decoder reports the reason
/// through [`fail`](SparseWriteContext::fail) and returns an error; the
/// caller does not report again.
pub trait SparseDecoder {
    /// Check whether `buffer` carries sparse framing
    ///
    /// The default implementation checks for the Android sparse header
    /// magic with room for a complete header.
    fn is_sparse_image(&self, buffer: &[u8]) -> bool {
        if buffer.len() < SPARSE_HEADER_LEN {
            return false;
        }
        let magic = u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
        magic == SPARSE_HEADER_MAGIC
    }

    /// Decode `buffer` and stream its chunks into `ctx`
    ///
    /// # Arguments
    /// * `ctx` - Target geometry, chunk sink and failure reporting
    /// * `name` - Partition name, for diagnostics
    /// * `buffer` - The complete sparse image
    fn write_sparse_image(
        &mut self,
        ctx: &mut SparseWriteContext<'_>,
        name: &str,
        buffer: &[u8],
    ) -> Result<()>;
}

/// Decoder for builds without sparse image support
///
/// Sparse images are still recognised, so they are refused instead of
/// being written to the partition as raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSparseSupport;

impl SparseDecoder for NoSparseSupport {
    fn write_sparse_image(
        &mut self,
        ctx: &mut SparseWriteContext<'_>,
        name: &str,
        _buffer: &[u8],
    ) -> Result<()> {
        log::error!("Cannot flash sparse image to '{}': no sparse decoder", name);
        ctx.fail("sparse images not supported");
        Err(Error::SparseError)
    }
}
