//! fbflash-linux-mtd - Linux MTD (Memory Technology Device) backend
//!
//! This crate flashes partitions exposed by the Linux MTD subsystem at
//! `/dev/mtdN`. Partitions are looked up by the `name` attribute the kernel
//! publishes in sysfs, so the fastboot partition name is the same name that
//! appears in `/proc/mtd`.
//!
//! # Usage with fbflash CLI
//!
//! ```bash
//! # Show geometry of the "kernel" partition
//! fbflash -p linux_mtd info kernel
//!
//! # Flash a raw image
//! fbflash -p linux_mtd flash kernel zImage
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with MTD support (`CONFIG_MTD`, `CONFIG_MTD_CHAR`)
//! - Read/write access to `/dev/mtdN`
//! - May require root access or udev rules
//!
//! Only `nand`, `mlc-nand`, `nor`, `dataflash` and `ram` devices are used.
//! UBI volumes and devices with non-uniform erase regions are skipped.

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxMtd, LinuxMtdConfig, LinuxMtdDriver, MtdFlags, MtdInfo};
pub use error::{LinuxMtdError, Result};

/// Create a Linux MTD driver from backend options
///
/// # Example Options
///
/// - `sysfs=/sys/class/mtd` - sysfs MTD class directory
/// - `dev=/dev` - directory of the MTD character devices
pub fn open_linux_mtd(options: &[(&str, &str)]) -> Result<LinuxMtdDriver> {
    let config = parse_options(options)?;
    Ok(LinuxMtdDriver::new(config))
}
