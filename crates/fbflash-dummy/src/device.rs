//! In-memory MTD driver

use std::cell::RefCell;
use std::rc::Rc;

use fbflash_core::error::{Error, Result};
use fbflash_core::mtd::{MtdDevice, MtdDriver};

use crate::config::{DummyConfig, PartitionConfig};

/// Value of an erased byte
const ERASED: u8 = 0xFF;

/// Operation counters for one emulated partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionStats {
    /// Number of erase calls
    pub erases: u32,
    /// Total bytes erased
    pub erased_bytes: u64,
    /// Number of write calls
    pub writes: u32,
    /// Total bytes written
    pub written_bytes: u64,
}

/// State of one emulated partition
#[derive(Debug)]
struct Partition {
    config: PartitionConfig,
    data: Vec<u8>,
    refcount: u32,
    stats: PartitionStats,
    fail_erase: bool,
    fail_write: bool,
}

impl Partition {
    fn new(config: PartitionConfig) -> Self {
        let data = vec![ERASED; config.size as usize];
        Self {
            config,
            data,
            refcount: 0,
            stats: PartitionStats::default(),
            fail_erase: false,
            fail_write: false,
        }
    }

    fn erase(&mut self, offset: u64, len: u64) -> Result<()> {
        self.stats.erases += 1;

        let eb = self.config.erase_size;
        if offset % eb != 0 || len % eb != 0 {
            return Err(Error::InvalidAlignment);
        }
        let end = offset.checked_add(len).ok_or(Error::AddressOutOfBounds)?;
        if end > self.config.size {
            return Err(Error::AddressOutOfBounds);
        }
        if self.fail_erase {
            return Err(Error::EraseError);
        }

        self.data[offset as usize..end as usize].fill(ERASED);
        self.stats.erased_bytes += len;
        Ok(())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<usize> {
        self.stats.writes += 1;

        if offset % self.config.write_size != 0 {
            return Err(Error::InvalidAlignment);
        }
        let end = offset
            .checked_add(data.len() as u64)
            .ok_or(Error::AddressOutOfBounds)?;
        if end > self.config.size {
            return Err(Error::AddressOutOfBounds);
        }
        if self.fail_write {
            return Err(Error::WriteError);
        }

        // Programming can only clear bits
        for (cell, &byte) in self.data[offset as usize..end as usize].iter_mut().zip(data) {
            *cell &= byte;
        }
        self.stats.written_bytes += data.len() as u64;
        Ok(data.len())
    }
}

/// In-memory MTD driver
///
/// Emulates a set of NAND partitions: erases must cover whole erase
/// blocks and reset bytes to 0xFF, writes must start on a page boundary
/// and can only clear bits. Partitions with a `probe_delay` stay invisible
/// until enough probes have happened, which mimics drivers that register
/// their partitions lazily.
///
/// # Example
///
/// ```ignore
/// use fbflash_dummy::{DummyConfig, DummyMtd};
///
/// let mut mtd = DummyMtd::new(DummyConfig::default());
/// mtd.set_fail_erase("kernel", true);
/// ```
#[derive(Debug)]
pub struct DummyMtd {
    partitions: Vec<Rc<RefCell<Partition>>>,
    probes: u32,
}

impl DummyMtd {
    /// Create an emulator for the given board
    pub fn new(config: DummyConfig) -> Self {
        let partitions = config
            .partitions
            .into_iter()
            .map(|p| Rc::new(RefCell::new(Partition::new(p))))
            .collect();
        Self {
            partitions,
            probes: 0,
        }
    }

    /// Create an emulator for the default board
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    fn find(&self, name: &str) -> Option<&Rc<RefCell<Partition>>> {
        self.partitions
            .iter()
            .find(|p| p.borrow().config.name == name)
    }

    /// Number of probes so far
    pub fn probes(&self) -> u32 {
        self.probes
    }

    /// Copy of a partition's contents
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.find(name).map(|p| p.borrow().data.clone())
    }

    /// Outstanding references to a partition
    pub fn refcount(&self, name: &str) -> Option<u32> {
        self.find(name).map(|p| p.borrow().refcount)
    }

    /// Operation counters of a partition
    pub fn stats(&self, name: &str) -> Option<PartitionStats> {
        self.find(name).map(|p| p.borrow().stats)
    }

    /// Make erases of a partition fail
    pub fn set_fail_erase(&mut self, name: &str, fail: bool) {
        if let Some(p) = self.find(name) {
            p.borrow_mut().fail_erase = fail;
        }
    }

    /// Make writes to a partition fail
    pub fn set_fail_write(&mut self, name: &str, fail: bool) {
        if let Some(p) = self.find(name) {
            p.borrow_mut().fail_write = fail;
        }
    }

    /// Overwrite a partition's contents without erase semantics
    pub fn fill(&mut self, name: &str, value: u8) {
        if let Some(p) = self.find(name) {
            p.borrow_mut().data.fill(value);
        }
    }
}

/// Handle to an emulated partition
#[derive(Debug)]
pub struct DummyDevice {
    name: String,
    size: u64,
    erase_size: u32,
    write_size: u32,
    partition: Rc<RefCell<Partition>>,
}

impl MtdDevice for DummyDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn erase_size(&self) -> u32 {
        self.erase_size
    }

    fn write_size(&self) -> u32 {
        self.write_size
    }

    fn erase(&mut self, offset: u64, len: u64) -> Result<()> {
        self.partition.borrow_mut().erase(offset, len)
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<usize> {
        self.partition.borrow_mut().write(offset, data)
    }
}

impl MtdDriver for DummyMtd {
    type Device = DummyDevice;

    fn probe_devices(&mut self) {
        self.probes += 1;
        log::trace!("Dummy MTD probe #{}", self.probes);
    }

    fn get_device(&mut self, name: &str) -> Result<DummyDevice> {
        let probes = self.probes;
        let partition = self
            .find(name)
            .filter(|p| probes > p.borrow().config.probe_delay)
            .ok_or(Error::NoDevice)?;

        let device = {
            let mut part = partition.borrow_mut();
            part.refcount += 1;
            DummyDevice {
                name: part.config.name.clone(),
                size: part.config.size,
                erase_size: part.config.erase_size as u32,
                write_size: part.config.write_size as u32,
                partition: Rc::clone(partition),
            }
        };
        log::debug!("Dummy MTD: got '{}'", name);
        Ok(device)
    }

    fn put_device(&mut self, device: DummyDevice) {
        let mut part = device.partition.borrow_mut();
        part.refcount = part.refcount.saturating_sub(1);
        log::debug!("Dummy MTD: put '{}' (refcount {})", device.name, part.refcount);
    }

    fn device_names(&mut self) -> Vec<String> {
        let probes = self.probes;
        self.partitions
            .iter()
            .map(|p| p.borrow())
            .filter(|p| probes > p.config.probe_delay)
            .map(|p| p.config.name.clone())
            .collect()
    }
}
