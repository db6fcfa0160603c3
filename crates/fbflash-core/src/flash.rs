//! Flashing operations
//!
//! This module provides the three operations a fastboot-style protocol
//! layer calls into: partition geometry queries, whole-partition erase and
//! image writes. Writes take either the raw path (erase the covered erase
//! blocks, then program the buffer at offset 0) or the sparse path (stream
//! decoded chunks through an [`MtdChunkSink`]).
//!
//! Every operation reports its outcome to a [`Response`] and returns a
//! [`Result`] for internal callers. Partitions are resolved per operation
//! and released on every exit path.

use crate::erase::EraseRegion;
use crate::error::{Error, Result};
use crate::mtd::{MtdDevice, MtdDriver};
use crate::partition::{self, PartitionInfo};
use crate::resolve::{report_resolve_error, resolve};
use crate::response::Response;
use crate::sparse::{MtdChunkSink, NoSparseSupport, SparseDecoder, SparseWriteContext};

/// Board-specific setup hook, run before an operation touches storage
pub type BoardHook = fn() -> Result<()>;

/// Engine configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct FlashConfig {
    /// Run before every image write
    pub write_setup: Option<BoardHook>,
    /// Run before every standalone erase
    pub erase_setup: Option<BoardHook>,
}

/// Erase a whole partition
///
/// Reports "okay", or "failed erasing mtd device" if the driver rejects
/// the erase.
pub fn erase_partition<D: MtdDriver + ?Sized>(
    driver: &mut D,
    name: &str,
    response: &mut dyn Response,
) -> Result<()> {
    let mut device =
        resolve(driver, name).map_err(|e| report_resolve_error(name, e, response))?;

    log::info!(
        "Erasing MTD partition '{}' (0x{:x} bytes)...",
        device.name(),
        device.size()
    );

    let region = EraseRegion::whole(device.size());
    let result = device.erase(region.offset, region.len);
    drop(device);

    match result {
        Ok(()) => {
            response.okay("");
            Ok(())
        }
        Err(e) => {
            log::error!("MTD erase failed: {}", e);
            response.fail("failed erasing mtd device");
            Err(Error::EraseError)
        }
    }
}

/// Write a raw image at the start of a partition
///
/// Only the erase blocks covering `buffer` are erased; the rest of the
/// partition keeps its previous content. A failed erase is terminal and no
/// write is attempted.
pub fn write_raw<D: MtdDriver + ?Sized>(
    driver: &mut D,
    name: &str,
    buffer: &[u8],
    response: &mut dyn Response,
) -> Result<()> {
    let mut device =
        resolve(driver, name).map_err(|e| report_resolve_error(name, e, response))?;

    log::info!(
        "Flashing raw image to '{}' (Size: {})...",
        device.name(),
        buffer.len()
    );

    let region = EraseRegion::for_write(device.size(), device.erase_size(), buffer.len() as u64);
    log::info!(" - Erasing 0x{:x} bytes first...", region.len);
    if let Err(e) = device.erase(region.offset, region.len) {
        log::error!("Erase failed before write: {}", e);
        response.fail("erase failed");
        return Err(Error::EraseError);
    }

    log::info!(" - Writing data...");
    match device.write(0, buffer) {
        Ok(written) => {
            log::info!(" - Wrote {} bytes.", written);
            response.okay("");
            Ok(())
        }
        Err(e) => {
            log::error!("Write failed: {}", e);
            response.fail("write failed");
            Err(Error::WriteError)
        }
    }
}

/// Write a sparse image through `decoder`
///
/// The decoder owns failure reporting while it runs. If it fails without
/// saying why, "sparse image write failed" is reported instead. A failure
/// part way through leaves the partition partially written.
pub fn write_sparse<D, S>(
    driver: &mut D,
    decoder: &mut S,
    name: &str,
    buffer: &[u8],
    response: &mut dyn Response,
) -> Result<()>
where
    D: MtdDriver + ?Sized,
    S: SparseDecoder + ?Sized,
{
    let mut device =
        resolve(driver, name).map_err(|e| report_resolve_error(name, e, response))?;

    log::info!("Flashing sparse image to '{}'...", device.name());

    let mut sink = MtdChunkSink::new(&mut *device);
    let blksz = sink.blksz();
    let blocks = sink.block_count();
    log::debug!("Sparse target: {} blocks of {} bytes", blocks, blksz);

    let (result, reported) = {
        let mut ctx = SparseWriteContext::new(blksz, blocks, &mut sink, &mut *response);
        let result = decoder.write_sparse_image(&mut ctx, name, buffer);
        (result, ctx.has_reported())
    };

    match result {
        Ok(()) => {
            response.okay("");
            Ok(())
        }
        Err(e) => {
            log::error!("Sparse image write to '{}' failed: {}", name, e);
            if !reported {
                response.fail("sparse image write failed");
            }
            Err(Error::SparseError)
        }
    }
}

/// Run an optional board hook, reporting a refusal
fn run_hook(hook: Option<BoardHook>, response: &mut dyn Response) -> Result<()> {
    let Some(hook) = hook else {
        return Ok(());
    };
    hook().map_err(|e| {
        log::error!("Board setup failed: {}", e);
        response.fail("board setup failed");
        Error::BoardSetupFailed
    })
}

/// Flashing engine bound to a storage driver and a sparse decoder
///
/// Operations take `&mut self`, so at most one runs at a time.
///
/// # Example
///
/// ```ignore
/// let mut flash = FastbootFlash::new(driver, NoSparseSupport);
/// let mut response = FastbootResponse::new();
///
/// flash.erase("userdata", &mut response)?;
/// flash.write("boot", &image, &mut response)?;
/// ```
pub struct FastbootFlash<D: MtdDriver, S: SparseDecoder = NoSparseSupport> {
    driver: D,
    decoder: S,
    config: FlashConfig,
}

impl<D: MtdDriver, S: SparseDecoder> FastbootFlash<D, S> {
    /// Create an engine with the default (hook-less) configuration
    pub fn new(driver: D, decoder: S) -> Self {
        Self {
            driver,
            decoder,
            config: FlashConfig::default(),
        }
    }

    /// Replace the engine configuration
    pub fn with_config(mut self, config: FlashConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// The storage driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The storage driver, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Tear the engine down, returning the driver
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Look up the geometry of a partition
    pub fn get_part_info(
        &mut self,
        name: &str,
        response: &mut dyn Response,
    ) -> Result<PartitionInfo> {
        partition::get_part_info(&mut self.driver, name, response)
    }

    /// Erase a whole partition
    pub fn erase(&mut self, name: &str, response: &mut dyn Response) -> Result<()> {
        if name.is_empty() {
            return Err(report_resolve_error(name, Error::InvalidArgument, response));
        }
        run_hook(self.config.erase_setup, response)?;
        erase_partition(&mut self.driver, name, response)
    }

    /// Write an image, choosing the sparse or raw path from its framing
    pub fn write(&mut self, name: &str, buffer: &[u8], response: &mut dyn Response) -> Result<()> {
        if name.is_empty() {
            return Err(report_resolve_error(name, Error::InvalidArgument, response));
        }
        run_hook(self.config.write_setup, response)?;

        if self.decoder.is_sparse_image(buffer) {
            write_sparse(&mut self.driver, &mut self.decoder, name, buffer, response)
        } else {
            write_raw(&mut self.driver, name, buffer, response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{FastbootResponse, ResponseKind};
    use crate::sparse::{SPARSE_HEADER_LEN, SPARSE_HEADER_MAGIC};
    use crate::testing::MockDriver;
    use std::vec;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy)]
    enum Chunk {
        Data { blk: u64, blkcnt: u64 },
        Skip { blk: u64, blkcnt: u64 },
    }

    /// Decoder that replays a fixed chunk list instead of parsing
    struct ScriptedDecoder {
        chunks: Vec<Chunk>,
        reserved: Vec<(u64, u64)>,
        fail_silently: bool,
    }

    impl ScriptedDecoder {
        fn new(chunks: Vec<Chunk>) -> Self {
            Self {
                chunks,
                reserved: Vec::new(),
                fail_silently: false,
            }
        }
    }

    impl SparseDecoder for ScriptedDecoder {
        fn write_sparse_image(
            &mut self,
            ctx: &mut SparseWriteContext<'_>,
            _name: &str,
            _buffer: &[u8],
        ) -> Result<()> {
            if self.fail_silently {
                return Err(Error::SparseError);
            }
            for chunk in self.chunks.clone() {
                match chunk {
                    Chunk::Data { blk, blkcnt } => {
                        let data = vec![0x5Au8; (blkcnt * ctx.blksz() as u64) as usize];
                        if ctx.write(blk, blkcnt, &data) != blkcnt {
                            ctx.fail("flash write failure");
                            return Err(Error::SparseError);
                        }
                    }
                    Chunk::Skip { blk, blkcnt } => {
                        self.reserved.push((blk, blkcnt));
                        if ctx.reserve(blk, blkcnt) != blkcnt {
                            ctx.fail("flash reserve failure");
                            return Err(Error::SparseError);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    fn sparse_image() -> Vec<u8> {
        let mut img = vec![0u8; SPARSE_HEADER_LEN];
        img[..4].copy_from_slice(&SPARSE_HEADER_MAGIC.to_le_bytes());
        img
    }

    #[test]
    fn test_raw_write_clamps_erase_to_partition() {
        // 16 pages of 4 KiB, erase blocks larger than the partition
        let driver = MockDriver::single(65536, 131072, 4096);
        let log = driver.log.clone();
        let mut flash = FastbootFlash::new(driver, NoSparseSupport);
        let mut resp = FastbootResponse::new();

        flash.write("system", &[0xAB; 5000], &mut resp).unwrap();

        let log = log.borrow();
        assert_eq!(log.erases.as_slice(), &[(0, 65536)]);
        assert_eq!(log.writes.as_slice(), &[(0, 5000)]);
        assert_eq!(log.puts, 1);
        assert_eq!(resp.as_str(), "OKAY");
    }

    #[test]
    fn test_raw_write_erases_aligned_superset() {
        let mut driver = MockDriver::single(1024 * 1024, 131072, 2048);
        let mut resp = FastbootResponse::new();
        write_raw(&mut driver, "system", &[0u8; 131073], &mut resp).unwrap();
        assert_eq!(driver.log.borrow().erases.as_slice(), &[(0, 262144)]);
    }

    #[test]
    fn test_empty_name_rejected_everywhere() {
        let driver = MockDriver::single(65536, 4096, 2048);
        let log = driver.log.clone();
        let mut flash = FastbootFlash::new(driver, NoSparseSupport);

        let mut resp = FastbootResponse::new();
        assert_eq!(flash.write("", &[0u8; 16], &mut resp), Err(Error::InvalidArgument));
        assert_eq!(resp.message(), "partition not given");

        let mut resp = FastbootResponse::new();
        assert_eq!(flash.erase("", &mut resp), Err(Error::InvalidArgument));
        assert_eq!(resp.message(), "partition not given");

        let mut resp = FastbootResponse::new();
        assert_eq!(
            flash.get_part_info("", &mut resp).unwrap_err(),
            Error::InvalidArgument
        );
        assert_eq!(resp.message(), "partition not given");

        let log = log.borrow();
        assert_eq!(log.probes, 0);
        assert_eq!(log.lookups, 0);
        assert!(log.erases.is_empty());
        assert!(log.writes.is_empty());
    }

    #[test]
    fn test_raw_write_unknown_partition() {
        let mut driver = MockDriver::single(65536, 4096, 2048);
        let mut resp = FastbootResponse::new();
        assert_eq!(
            write_raw(&mut driver, "cache", &[0u8; 16], &mut resp),
            Err(Error::NoDevice)
        );
        assert_eq!(resp.message(), "partition not found");
        assert!(driver.log.borrow().erases.is_empty());
    }

    #[test]
    fn test_raw_write_erase_failure_skips_write() {
        let mut driver = MockDriver::single(65536, 4096, 2048);
        driver.fail_erase = true;
        let mut resp = FastbootResponse::new();

        assert_eq!(
            write_raw(&mut driver, "system", &[0u8; 100], &mut resp),
            Err(Error::EraseError)
        );

        let log = driver.log.borrow();
        assert_eq!(log.erases.len(), 1);
        assert!(log.writes.is_empty());
        assert_eq!(log.puts, 1);
        assert_eq!(resp.message(), "erase failed");
    }

    #[test]
    fn test_raw_write_failure() {
        let mut driver = MockDriver::single(65536, 4096, 2048);
        driver.fail_write = true;
        let mut resp = FastbootResponse::new();

        assert_eq!(
            write_raw(&mut driver, "system", &[0u8; 100], &mut resp),
            Err(Error::WriteError)
        );
        assert_eq!(resp.message(), "write failed");
        assert_eq!(driver.log.borrow().puts, 1);
    }

    #[test]
    fn test_erase_whole_partition() {
        let mut driver = MockDriver::single(65536, 4096, 2048);
        let mut resp = FastbootResponse::new();
        erase_partition(&mut driver, "system", &mut resp).unwrap();
        assert_eq!(driver.log.borrow().erases.as_slice(), &[(0, 65536)]);
        assert_eq!(resp.kind(), Some(ResponseKind::Okay));
    }

    #[test]
    fn test_erase_failure_releases_once() {
        let mut driver = MockDriver::single(65536, 4096, 2048);
        driver.fail_erase = true;
        let mut resp = FastbootResponse::new();

        assert_eq!(
            erase_partition(&mut driver, "system", &mut resp),
            Err(Error::EraseError)
        );
        assert_eq!(resp.message(), "failed erasing mtd device");
        let log = driver.log.borrow();
        assert_eq!(log.gets, 1);
        assert_eq!(log.puts, 1);
    }

    #[test]
    fn test_sparse_data_and_skip_chunks() {
        let mut driver = MockDriver::single(65536, 16384, 2048);
        let mut decoder = ScriptedDecoder::new(vec![
            Chunk::Data { blk: 3, blkcnt: 2 },
            Chunk::Skip { blk: 5, blkcnt: 1 },
        ]);
        let mut resp = FastbootResponse::new();

        write_sparse(&mut driver, &mut decoder, "system", &sparse_image(), &mut resp).unwrap();

        let log = driver.log.borrow();
        assert_eq!(log.writes.as_slice(), &[(6144, 4096)]);
        assert!(log.erases.is_empty());
        assert_eq!(log.puts, 1);
        assert_eq!(decoder.reserved.as_slice(), &[(5, 1)]);
        assert_eq!(resp.as_str(), "OKAY");
    }

    #[test]
    fn test_sparse_detected_by_engine() {
        let driver = MockDriver::single(65536, 16384, 2048);
        let log = driver.log.clone();
        let decoder = ScriptedDecoder::new(vec![Chunk::Data { blk: 0, blkcnt: 1 }]);
        let mut flash = FastbootFlash::new(driver, decoder);
        let mut resp = FastbootResponse::new();

        flash.write("system", &sparse_image(), &mut resp).unwrap();

        let log = log.borrow();
        assert!(log.erases.is_empty());
        assert_eq!(log.writes.as_slice(), &[(0, 2048)]);
    }

    #[test]
    fn test_sparse_write_failure_reported_by_decoder() {
        let mut driver = MockDriver::single(65536, 16384, 2048);
        driver.fail_write = true;
        let mut decoder = ScriptedDecoder::new(vec![Chunk::Data { blk: 0, blkcnt: 4 }]);
        let mut resp = FastbootResponse::new();

        assert_eq!(
            write_sparse(&mut driver, &mut decoder, "system", &sparse_image(), &mut resp),
            Err(Error::SparseError)
        );
        assert_eq!(resp.message(), "flash write failure");
        assert_eq!(driver.log.borrow().puts, 1);
    }

    #[test]
    fn test_sparse_silent_failure_reported_once() {
        let mut driver = MockDriver::single(65536, 16384, 2048);
        let mut decoder = ScriptedDecoder::new(Vec::new());
        decoder.fail_silently = true;
        let mut resp = FastbootResponse::new();

        assert!(write_sparse(&mut driver, &mut decoder, "system", &sparse_image(), &mut resp).is_err());
        assert_eq!(resp.message(), "sparse image write failed");
    }

    #[test]
    fn test_sparse_chunks_bounded_by_partition() {
        let mut driver = MockDriver::single(65536, 16384, 2048);
        let mut decoder = ScriptedDecoder::new(vec![Chunk::Data { blk: 30, blkcnt: 3 }]);
        let mut resp = FastbootResponse::new();

        assert!(write_sparse(&mut driver, &mut decoder, "system", &sparse_image(), &mut resp).is_err());
        assert!(driver.log.borrow().writes.is_empty());
    }

    #[test]
    fn test_sparse_refused_without_decoder() {
        let driver = MockDriver::single(65536, 16384, 2048);
        let log = driver.log.clone();
        let mut flash = FastbootFlash::new(driver, NoSparseSupport);
        let mut resp = FastbootResponse::new();

        assert_eq!(
            flash.write("system", &sparse_image(), &mut resp),
            Err(Error::SparseError)
        );
        assert_eq!(resp.message(), "sparse images not supported");
        let log = log.borrow();
        assert!(log.erases.is_empty());
        assert!(log.writes.is_empty());
        assert_eq!(log.puts, 1);
    }

    fn refuse() -> Result<()> {
        Err(Error::WriteProtected)
    }

    #[test]
    fn test_board_hook_refusal() {
        let driver = MockDriver::single(65536, 4096, 2048);
        let log = driver.log.clone();
        let config = FlashConfig {
            write_setup: Some(refuse),
            erase_setup: Some(refuse),
        };
        let mut flash = FastbootFlash::new(driver, NoSparseSupport).with_config(config);

        let mut resp = FastbootResponse::new();
        assert_eq!(
            flash.write("system", &[0u8; 16], &mut resp),
            Err(Error::BoardSetupFailed)
        );
        assert_eq!(resp.message(), "board setup failed");

        let mut resp = FastbootResponse::new();
        assert_eq!(flash.erase("system", &mut resp), Err(Error::BoardSetupFailed));
        assert_eq!(log.borrow().lookups, 0);
    }

    #[test]
    fn test_board_hook_accepts() {
        fn accept() -> Result<()> {
            Ok(())
        }
        let driver = MockDriver::single(65536, 4096, 2048);
        let config = FlashConfig {
            write_setup: Some(accept),
            erase_setup: None,
        };
        let mut flash = FastbootFlash::new(driver, NoSparseSupport).with_config(config);
        let mut resp = FastbootResponse::new();
        flash.write("system", &[0u8; 16], &mut resp).unwrap();
        assert_eq!(resp.as_str(), "OKAY");
    }
}
