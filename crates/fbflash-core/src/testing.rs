//! Recording mock driver shared by the unit tests

use crate::error::{Error, Result};
use crate::mtd::{MtdDevice, MtdDriver};
use core::cell::RefCell;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

/// Everything the mock driver and its devices observed
#[derive(Debug, Default)]
pub struct Log {
    pub probes: u32,
    pub lookups: u32,
    pub gets: u32,
    pub puts: u32,
    pub erases: Vec<(u64, u64)>,
    pub writes: Vec<(u64, usize)>,
}

pub struct MockPart {
    pub name: &'static str,
    pub size: u64,
    pub erase_size: u32,
    pub write_size: u32,
    /// Number of probes needed before the partition becomes visible
    pub visible_after: u32,
}

impl MockPart {
    pub fn new(name: &'static str, size: u64, erase_size: u32, write_size: u32) -> Self {
        Self {
            name,
            size,
            erase_size,
            write_size,
            visible_after: 1,
        }
    }
}

pub struct MockDriver {
    pub parts: Vec<MockPart>,
    pub log: Rc<RefCell<Log>>,
    pub fail_erase: bool,
    pub fail_write: bool,
    pub lookup_error: Option<Error>,
}

impl MockDriver {
    pub fn new(parts: Vec<MockPart>) -> Self {
        Self {
            parts,
            log: Rc::new(RefCell::new(Log::default())),
            fail_erase: false,
            fail_write: false,
            lookup_error: None,
        }
    }

    pub fn single(size: u64, erase_size: u32, write_size: u32) -> Self {
        Self::new(std::vec![MockPart::new("system", size, erase_size, write_size)])
    }
}

pub struct MockDevice {
    name: String,
    size: u64,
    erase_size: u32,
    write_size: u32,
    fail_erase: bool,
    fail_write: bool,
    log: Rc<RefCell<Log>>,
}

impl MtdDevice for MockDevice {
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
        self.log.borrow_mut().erases.push((offset, len));
        if self.fail_erase {
            return Err(Error::EraseError);
        }
        Ok(())
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> Result<usize> {
        self.log.borrow_mut().writes.push((offset, data.len()));
        if self.fail_write {
            return Err(Error::WriteError);
        }
        Ok(data.len())
    }
}

impl MtdDriver for MockDriver {
    type Device = MockDevice;

    fn probe_devices(&mut self) {
        self.log.borrow_mut().probes += 1;
    }

    fn get_device(&mut self, name: &str) -> Result<MockDevice> {
        let mut log = self.log.borrow_mut();
        log.lookups += 1;
        if let Some(err) = self.lookup_error {
            return Err(err);
        }
        let part = self
            .parts
            .iter()
            .find(|p| p.name == name && log.probes >= p.visible_after)
            .ok_or(Error::NoDevice)?;
        log.gets += 1;
        Ok(MockDevice {
            name: part.name.to_string(),
            size: part.size,
            erase_size: part.erase_size,
            write_size: part.write_size,
            fail_erase: self.fail_erase,
            fail_write: self.fail_write,
            log: Rc::clone(&self.log),
        })
    }

    fn put_device(&mut self, _device: MockDevice) {
        self.log.borrow_mut().puts += 1;
    }
}
