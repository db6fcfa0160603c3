//! Sparse image support
//!
//! Sparse images describe a partition as a sequence of chunks (raw data,
//! fill patterns and "don't care" skips) over a block-addressed target.
//! Decoding the format is left to a [`SparseDecoder`] implementation;
//! this module provides the storage side it writes into:
//!
//! - [`ChunkSink`] - the write/reserve capability a decoder drives
//! - [`MtdChunkSink`] - a `ChunkSink` backed by an MTD partition
//! - [`SparseWriteContext`] - geometry, sink and failure reporting bound
//!   together for a single image

mod context;
mod decoder;
mod sink;

pub use context::SparseWriteContext;
pub use decoder::{NoSparseSupport, SparseDecoder, SPARSE_HEADER_LEN, SPARSE_HEADER_MAGIC};
pub use sink::{ChunkSink, MtdChunkSink};
