//! Error types for Linux MTD operations

use std::io;
use thiserror::Error;

use fbflash_core::Error as CoreError;

/// Linux MTD-specific errors
#[derive(Debug, Error)]
pub enum LinuxMtdError {
    /// No MTD partition with this name
    #[error("MTD partition not found: {0}")]
    DeviceNotFound(String),

    /// MTD device type is not one we can flash
    #[error("MTD device {index} has unsupported type '{mtd_type}'")]
    UnsupportedType { index: u32, mtd_type: String },

    /// Failed to read sysfs attribute
    #[error("Failed to read sysfs attribute '{path}': {source}")]
    SysfsRead {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse sysfs attribute
    #[error("Failed to parse sysfs attribute '{path}': {value}")]
    SysfsParse { path: String, value: String },

    /// MTD erase size is not a power of 2
    #[error("MTD erase size is not a power of 2: {0}")]
    InvalidEraseSize(u64),

    /// Non-uniform erase regions are not supported
    #[error("MTD device has non-uniform erase regions (count: {0}), which is not supported")]
    NonUniformEraseRegions(u64),

    /// Failed to open the character device
    #[error("Failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Device is not writable
    #[error("MTD device is not writable")]
    NotWritable,

    /// Offset or length not aligned to the device geometry
    #[error("Unaligned access at offset {offset:#x} (length {len:#x}, alignment {align:#x})")]
    Unaligned { offset: u64, len: u64, align: u64 },

    /// Access beyond the end of the partition
    #[error("Access at offset {offset:#x} (length {len:#x}) exceeds partition size {size:#x}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// Erase operation failed
    #[error("Erase operation failed at offset {offset:#x}: {source}")]
    EraseFailed {
        offset: u64,
        #[source]
        source: nix::errno::Errno,
    },

    /// Write error
    #[error("Write of {len} bytes at offset {offset:#x} failed: {source}")]
    WriteFailed {
        offset: u64,
        len: usize,
        #[source]
        source: io::Error,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: &'static str, message: String },
}

impl From<&LinuxMtdError> for CoreError {
    fn from(err: &LinuxMtdError) -> Self {
        match err {
            LinuxMtdError::DeviceNotFound(_) => CoreError::NoDevice,
            LinuxMtdError::NotWritable => CoreError::WriteProtected,
            LinuxMtdError::Unaligned { .. } => CoreError::InvalidAlignment,
            LinuxMtdError::OutOfBounds { .. } => CoreError::AddressOutOfBounds,
            LinuxMtdError::EraseFailed { .. } => CoreError::EraseError,
            LinuxMtdError::WriteFailed { .. } => CoreError::WriteError,
            LinuxMtdError::UnsupportedType { .. }
            | LinuxMtdError::SysfsRead { .. }
            | LinuxMtdError::SysfsParse { .. }
            | LinuxMtdError::InvalidEraseSize(_)
            | LinuxMtdError::NonUniformEraseRegions(_)
            | LinuxMtdError::Open { .. }
            | LinuxMtdError::InvalidParameter { .. } => CoreError::DriverError,
        }
    }
}

/// Result type for Linux MTD operations
pub type Result<T> = std::result::Result<T, LinuxMtdError>;
