//! Linux MTD driver implementation

use crate::error::{LinuxMtdError, Result};
use bitflags::bitflags;
use fbflash_core::error::{Error as CoreError, Result as CoreResult};
use fbflash_core::mtd::{MtdDevice, MtdDriver};
use log::{debug, error, info, warn};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// Sysfs root for MTD devices
const MTD_SYSFS_ROOT: &str = "/sys/class/mtd";

/// Device root
const DEV_ROOT: &str = "/dev";

/// Device types that accept erase/program cycles
const SUPPORTED_TYPES: &[&str] = &["nand", "mlc-nand", "nor", "dataflash", "ram"];

bitflags! {
    /// MTD flags from kernel headers (`include/uapi/mtd/mtd-abi.h`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MtdFlags: u64 {
        /// Device is writable
        const WRITEABLE = 0x400;
        /// Single bits can be flipped
        const BIT_WRITEABLE = 0x800;
        /// Device doesn't require erase before write
        const NO_ERASE = 0x1000;
        /// Always locked after reset
        const POWERUP_LOCK = 0x2000;
    }
}

/// Information about an MTD device read from sysfs
#[derive(Debug, Clone)]
pub struct MtdInfo {
    /// Device number (N in /dev/mtdN)
    pub index: u32,
    /// Partition name from sysfs
    pub name: String,
    /// Device type ("nand", "nor", ...)
    pub mtd_type: String,
    /// Total size in bytes
    pub total_size: u64,
    /// Erase block size in bytes
    pub erase_size: u64,
    /// Page size in bytes
    pub write_size: u64,
    /// Number of erase regions (must be 0 for uniform erase)
    pub num_erase_regions: u64,
    /// Device flags
    pub flags: MtdFlags,
}

impl MtdInfo {
    /// Whether the device is writable
    pub fn is_writable(&self) -> bool {
        self.flags.contains(MtdFlags::WRITEABLE)
    }

    /// Whether the device requires erase before write
    pub fn requires_erase(&self) -> bool {
        !self.flags.contains(MtdFlags::NO_ERASE)
    }
}

/// Configuration for the Linux MTD driver
#[derive(Debug, Clone)]
pub struct LinuxMtdConfig {
    /// Directory holding the `mtdN` sysfs entries
    pub sysfs_root: PathBuf,
    /// Directory holding the `mtdN` character devices
    pub dev_root: PathBuf,
}

impl Default for LinuxMtdConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(MTD_SYSFS_ROOT),
            dev_root: PathBuf::from(DEV_ROOT),
        }
    }
}

/// Linux MTD driver
///
/// Partitions are discovered through sysfs and looked up by their `name`
/// attribute. Every probe re-reads sysfs, so partitions registered after
/// the driver was created (for example by a late `modprobe`) become
/// visible on the next probe.
///
/// # Example
///
/// ```ignore
/// use fbflash_linux_mtd::{LinuxMtdConfig, LinuxMtdDriver};
/// use fbflash_core::mtd::MtdDriver;
///
/// let mut driver = LinuxMtdDriver::new(LinuxMtdConfig::default());
/// driver.probe_devices();
/// let dev = driver.get_device("kernel")?;
/// ```
pub struct LinuxMtdDriver {
    config: LinuxMtdConfig,
    devices: Vec<MtdInfo>,
}

impl LinuxMtdDriver {
    /// Create a driver; no device is scanned until the first probe
    pub fn new(config: LinuxMtdConfig) -> Self {
        Self {
            config,
            devices: Vec::new(),
        }
    }

    /// Devices found by the last probe
    pub fn devices(&self) -> &[MtdInfo] {
        &self.devices
    }

    /// Scan sysfs for MTD devices
    pub fn scan(&self) -> Result<Vec<MtdInfo>> {
        let root = &self.config.sysfs_root;
        let entries = std::fs::read_dir(root).map_err(|e| LinuxMtdError::SysfsRead {
            path: root.display().to_string(),
            source: e,
        })?;

        let mut devices = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            // "mtdN" only; "mtdNro" are the read-only twins
            let Some(index) = file_name
                .to_str()
                .and_then(|n| n.strip_prefix("mtd"))
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };

            match read_mtd_info(&entry.path(), index) {
                Ok(info) => {
                    if !SUPPORTED_TYPES.contains(&info.mtd_type.as_str()) {
                        warn!(
                            "{}",
                            LinuxMtdError::UnsupportedType {
                                index,
                                mtd_type: info.mtd_type.clone(),
                            }
                        );
                        continue;
                    }
                    devices.push(info);
                }
                Err(e) => warn!("Skipping mtd{}: {}", index, e),
            }
        }

        devices.sort_by_key(|d| d.index);
        Ok(devices)
    }

    /// Open a device by partition name
    pub fn open(&self, name: &str) -> Result<LinuxMtd> {
        let info = self
            .devices
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| LinuxMtdError::DeviceNotFound(name.to_string()))?;

        if !info.erase_size.is_power_of_two() {
            return Err(LinuxMtdError::InvalidEraseSize(info.erase_size));
        }
        if info.num_erase_regions != 0 {
            return Err(LinuxMtdError::NonUniformEraseRegions(info.num_erase_regions));
        }

        let dev_path = self.config.dev_root.join(format!("mtd{}", info.index));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&dev_path)
            .map_err(|e| LinuxMtdError::Open {
                path: dev_path.display().to_string(),
                source: e,
            })?;

        info!(
            "Opened {} (name='{}', size={} bytes, erase_size={} bytes, write_size={} bytes)",
            dev_path.display(),
            info.name,
            info.total_size,
            info.erase_size,
            info.write_size
        );

        Ok(LinuxMtd {
            file,
            info: info.clone(),
        })
    }
}

impl MtdDriver for LinuxMtdDriver {
    type Device = LinuxMtd;

    fn probe_devices(&mut self) {
        match self.scan() {
            Ok(devices) => {
                debug!("Found {} MTD device(s)", devices.len());
                self.devices = devices;
            }
            Err(e) => warn!("MTD probe failed: {}", e),
        }
    }

    fn get_device(&mut self, name: &str) -> CoreResult<LinuxMtd> {
        self.open(name).map_err(|e| {
            if !matches!(e, LinuxMtdError::DeviceNotFound(_)) {
                error!("{}", e);
            }
            CoreError::from(&e)
        })
    }

    fn put_device(&mut self, device: LinuxMtd) {
        debug!("Closing mtd{} ('{}')", device.info.index, device.info.name);
    }

    fn device_names(&mut self) -> Vec<String> {
        self.devices.iter().map(|d| d.name.clone()).collect()
    }
}

/// Handle to an open MTD partition
pub struct LinuxMtd {
    /// Device file handle
    file: File,
    /// Device information
    info: MtdInfo,
}

impl LinuxMtd {
    /// Get the device information
    pub fn info(&self) -> &MtdInfo {
        &self.info
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.info.total_size => Ok(()),
            _ => Err(LinuxMtdError::OutOfBounds {
                offset,
                len,
                size: self.info.total_size,
            }),
        }
    }

    fn erase_blocks(&mut self, offset: u64, len: u64) -> Result<()> {
        if !self.info.is_writable() {
            return Err(LinuxMtdError::NotWritable);
        }
        self.check_range(offset, len)?;

        let erase_size = self.info.erase_size;
        if offset % erase_size != 0 || len % erase_size != 0 {
            return Err(LinuxMtdError::Unaligned {
                offset,
                len,
                align: erase_size,
            });
        }

        if !self.info.requires_erase() {
            // e.g. RAM-backed MTD
            return Ok(());
        }

        let mut pos = offset;
        while pos < offset + len {
            let erase_info = EraseInfo64 {
                start: pos,
                length: erase_size,
            };

            // SAFETY: We're calling an ioctl with a valid file descriptor and
            // a properly initialized EraseInfo64 struct
            unsafe {
                memerase64(self.file.as_raw_fd(), &erase_info)
                    .map_err(|e| LinuxMtdError::EraseFailed { offset: pos, source: e })?;
            }

            pos += erase_size;
        }

        Ok(())
    }

    fn program(&mut self, offset: u64, data: &[u8]) -> Result<usize> {
        if !self.info.is_writable() {
            return Err(LinuxMtdError::NotWritable);
        }
        self.check_range(offset, data.len() as u64)?;

        let write_size = self.info.write_size.max(1);
        if offset % write_size != 0 {
            return Err(LinuxMtdError::Unaligned {
                offset,
                len: data.len() as u64,
                align: write_size,
            });
        }

        self.file
            .write_all_at(data, offset)
            .map_err(|e| LinuxMtdError::WriteFailed {
                offset,
                len: data.len(),
                source: e,
            })?;

        Ok(data.len())
    }
}

impl MtdDevice for LinuxMtd {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn size(&self) -> u64 {
        self.info.total_size
    }

    fn erase_size(&self) -> u32 {
        self.info.erase_size as u32
    }

    fn write_size(&self) -> u32 {
        self.info.write_size as u32
    }

    fn erase(&mut self, offset: u64, len: u64) -> CoreResult<()> {
        self.erase_blocks(offset, len).map_err(|e| {
            error!("mtd{}: {}", self.info.index, e);
            CoreError::from(&e)
        })
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> CoreResult<usize> {
        self.program(offset, data).map_err(|e| {
            error!("mtd{}: {}", self.info.index, e);
            CoreError::from(&e)
        })
    }
}

/// Read a string from a sysfs file and sanitize it
fn read_sysfs_string(sysfs_path: &Path, filename: &str) -> Result<String> {
    let path = sysfs_path.join(filename);
    let content = std::fs::read_to_string(&path).map_err(|e| LinuxMtdError::SysfsRead {
        path: path.display().to_string(),
        source: e,
    })?;

    // Sanitize: remove non-printable characters and trailing whitespace
    let sanitized: String = content
        .chars()
        .take_while(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    Ok(sanitized.trim_end().to_string())
}

/// Read an integer from a sysfs file
fn read_sysfs_int(sysfs_path: &Path, filename: &str) -> Result<u64> {
    let value_str = read_sysfs_string(sysfs_path, filename)?;

    // Support hex (0x...) and decimal
    let value = if let Some(hex) = value_str
        .strip_prefix("0x")
        .or_else(|| value_str.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else {
        value_str.parse::<u64>()
    };

    value.map_err(|_| LinuxMtdError::SysfsParse {
        path: sysfs_path.join(filename).display().to_string(),
        value: value_str,
    })
}

/// Read MTD device information from sysfs
fn read_mtd_info(sysfs_path: &Path, index: u32) -> Result<MtdInfo> {
    let flags = MtdFlags::from_bits_retain(read_sysfs_int(sysfs_path, "flags")?);

    Ok(MtdInfo {
        index,
        name: read_sysfs_string(sysfs_path, "name")?,
        mtd_type: read_sysfs_string(sysfs_path, "type")?,
        total_size: read_sysfs_int(sysfs_path, "size")?,
        erase_size: read_sysfs_int(sysfs_path, "erasesize")?,
        write_size: read_sysfs_int(sysfs_path, "writesize")?,
        num_erase_regions: read_sysfs_int(sysfs_path, "numeraseregions")?,
        flags,
    })
}

/// MEMERASE64 ioctl argument structure
/// Matches struct erase_info_user64 from mtd/mtd-abi.h
#[repr(C)]
struct EraseInfo64 {
    start: u64,
    length: u64,
}

// MEMERASE64 = _IOW('M', 20, struct erase_info_user64)
nix::ioctl_write_ptr!(memerase64, b'M', 20, EraseInfo64);

/// Parse backend options from key-value pairs
///
/// # Supported options
/// - `sysfs=<dir>` - sysfs MTD class directory (default `/sys/class/mtd`)
/// - `dev=<dir>` - directory of MTD character devices (default `/dev`)
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxMtdConfig> {
    let mut config = LinuxMtdConfig::default();

    for (key, value) in options {
        match *key {
            "sysfs" | "dev" if value.is_empty() => {
                return Err(LinuxMtdError::InvalidParameter {
                    name: if *key == "sysfs" { "sysfs" } else { "dev" },
                    message: "path must not be empty".to_string(),
                });
            }
            "sysfs" => config.sysfs_root = PathBuf::from(value),
            "dev" => config.dev_root = PathBuf::from(value),
            _ => {
                warn!("Unknown linux_mtd option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FakeMtd<'a> {
        index: u32,
        name: &'a str,
        mtd_type: &'a str,
        size: u64,
        flags: u64,
    }

    /// Build a fake sysfs tree and matching /dev nodes (plain files)
    fn fake_system(devices: &[FakeMtd<'_>]) -> (TempDir, LinuxMtdConfig) {
        let tmp = TempDir::new().unwrap();
        let sysfs = tmp.path().join("sys");
        let dev = tmp.path().join("dev");
        fs::create_dir_all(&dev).unwrap();

        for d in devices {
            for dir in [format!("mtd{}", d.index), format!("mtd{}ro", d.index)] {
                let path = sysfs.join(dir);
                fs::create_dir_all(&path).unwrap();
                fs::write(path.join("name"), format!("{}\n", d.name)).unwrap();
                fs::write(path.join("type"), format!("{}\n", d.mtd_type)).unwrap();
                fs::write(path.join("size"), format!("{}\n", d.size)).unwrap();
                fs::write(path.join("erasesize"), "131072\n").unwrap();
                fs::write(path.join("writesize"), "2048\n").unwrap();
                fs::write(path.join("numeraseregions"), "0\n").unwrap();
                fs::write(path.join("flags"), format!("0x{:x}\n", d.flags)).unwrap();
            }
            fs::write(dev.join(format!("mtd{}", d.index)), vec![0xFFu8; d.size as usize])
                .unwrap();
        }

        let config = LinuxMtdConfig {
            sysfs_root: sysfs,
            dev_root: dev,
        };
        (tmp, config)
    }

    fn nand(index: u32, name: &str) -> FakeMtd<'_> {
        FakeMtd {
            index,
            name,
            mtd_type: "nand",
            size: 4 * 131072,
            flags: 0x400,
        }
    }

    #[test]
    fn test_scan_finds_partitions_by_name() {
        let (_tmp, config) = fake_system(&[nand(1, "kernel"), nand(0, "u-boot")]);
        let mut driver = LinuxMtdDriver::new(config);
        assert!(driver.device_names().is_empty());

        driver.probe_devices();
        assert_eq!(driver.device_names(), vec!["u-boot", "kernel"]);

        let info = &driver.devices()[1];
        assert_eq!(info.index, 1);
        assert_eq!(info.total_size, 4 * 131072);
        assert_eq!(info.erase_size, 131072);
        assert_eq!(info.write_size, 2048);
        assert!(info.is_writable());
        assert!(info.requires_erase());
    }

    #[test]
    fn test_unsupported_type_skipped() {
        let mut ubi = nand(2, "ubi-vol");
        ubi.mtd_type = "ubi";
        let (_tmp, config) = fake_system(&[nand(0, "boot"), ubi]);
        let mut driver = LinuxMtdDriver::new(config);
        driver.probe_devices();
        assert_eq!(driver.device_names(), vec!["boot"]);
    }

    #[test]
    fn test_get_device_unknown_name() {
        let (_tmp, config) = fake_system(&[nand(0, "boot")]);
        let mut driver = LinuxMtdDriver::new(config);
        driver.probe_devices();
        assert_eq!(driver.get_device("rootfs").err(), Some(CoreError::NoDevice));
    }

    #[test]
    fn test_write_goes_to_device_node() {
        let (tmp, config) = fake_system(&[nand(3, "boot")]);
        let mut driver = LinuxMtdDriver::new(config);
        driver.probe_devices();

        let mut dev = driver.get_device("boot").unwrap();
        assert_eq!(dev.name(), "boot");
        assert_eq!(dev.erase_size(), 131072);
        assert_eq!(dev.write_size(), 2048);
        assert_eq!(dev.write(2048, &[0x12, 0x34]).unwrap(), 2);
        driver.put_device(dev);

        let node = fs::read(tmp.path().join("dev/mtd3")).unwrap();
        assert_eq!(&node[2048..2050], &[0x12, 0x34]);
    }

    #[test]
    fn test_write_checks_geometry() {
        let (_tmp, config) = fake_system(&[nand(0, "boot")]);
        let mut driver = LinuxMtdDriver::new(config);
        driver.probe_devices();
        let mut dev = driver.get_device("boot").unwrap();

        assert_eq!(dev.write(100, &[0]).err(), Some(CoreError::InvalidAlignment));
        assert_eq!(
            dev.write(4 * 131072 - 2048, &[0; 4096]).err(),
            Some(CoreError::AddressOutOfBounds)
        );
        assert_eq!(dev.erase(0, 4096).err(), Some(CoreError::InvalidAlignment));
    }

    #[test]
    fn test_read_only_device_refused() {
        let mut ro = nand(0, "factory");
        ro.flags = 0;
        let (_tmp, config) = fake_system(&[ro]);
        let mut driver = LinuxMtdDriver::new(config);
        driver.probe_devices();
        let mut dev = driver.get_device("factory").unwrap();

        assert_eq!(dev.write(0, &[0]).err(), Some(CoreError::WriteProtected));
        assert_eq!(dev.erase(0, 131072).err(), Some(CoreError::WriteProtected));
    }

    #[test]
    fn test_erase_ioctl_failure_is_erase_error() {
        // The fake device node is a plain file, so MEMERASE64 fails
        let (_tmp, config) = fake_system(&[nand(0, "boot")]);
        let mut driver = LinuxMtdDriver::new(config);
        driver.probe_devices();
        let mut dev = driver.get_device("boot").unwrap();
        assert_eq!(dev.erase(0, 131072).err(), Some(CoreError::EraseError));
    }

    #[test]
    fn test_no_erase_device_skips_ioctl() {
        let mut ram = nand(0, "scratch");
        ram.mtd_type = "ram";
        ram.flags = 0x400 | 0x1000;
        let (_tmp, config) = fake_system(&[ram]);
        let mut driver = LinuxMtdDriver::new(config);
        driver.probe_devices();
        let mut dev = driver.get_device("scratch").unwrap();
        assert!(dev.erase(0, 2 * 131072).is_ok());
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("sysfs", "/tmp/sys"), ("dev", "/tmp/dev")]).unwrap();
        assert_eq!(config.sysfs_root, PathBuf::from("/tmp/sys"));
        assert_eq!(config.dev_root, PathBuf::from("/tmp/dev"));
        assert!(parse_options(&[("dev", "")]).is_err());
    }
}
