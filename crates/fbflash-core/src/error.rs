//! Error types for fbflash-core
//!
//! This module provides a no_std compatible error type shared by the
//! resolver, the write paths and the storage driver traits.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Request errors
    /// Partition name missing or empty
    InvalidArgument,

    // Driver errors
    /// No device with the requested name is registered
    NoDevice,
    /// Driver rejected the lookup for a reason other than "no such device"
    DriverError,
    /// Device is read-only
    WriteProtected,

    // Operation errors
    /// Erase operation failed
    EraseError,
    /// Write/program operation failed
    WriteError,
    /// Sparse image decoding or one of its storage callbacks failed
    SparseError,
    /// Board-specific setup hook refused the operation
    BoardSetupFailed,

    // Address/size errors
    /// Operation extends beyond the device size
    AddressOutOfBounds,
    /// Operation requires an aligned offset or length
    InvalidAlignment,
}

/// errno values used for numeric status codes
mod errno {
    pub const ENOENT: i32 = 2;
    pub const EIO: i32 = 5;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
    pub const EROFS: i32 = 30;
}

impl Error {
    /// Numeric status for callers that speak errno
    ///
    /// The value is negative, following the kernel convention used by
    /// MTD drivers and bootloader command handlers.
    pub fn errno(&self) -> i32 {
        let code = match self {
            Self::InvalidArgument => errno::ENOENT,
            Self::NoDevice => errno::ENODEV,
            Self::WriteProtected => errno::EROFS,
            Self::AddressOutOfBounds | Self::InvalidAlignment => errno::EINVAL,
            Self::DriverError
            | Self::EraseError
            | Self::WriteError
            | Self::SparseError
            | Self::BoardSetupFailed => errno::EIO,
        };
        -code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "partition not given"),
            Self::NoDevice => write!(f, "no such device"),
            Self::DriverError => write!(f, "storage driver error"),
            Self::WriteProtected => write!(f, "device is write protected"),
            Self::EraseError => write!(f, "erase operation failed"),
            Self::WriteError => write!(f, "write operation failed"),
            Self::SparseError => write!(f, "sparse image write failed"),
            Self::BoardSetupFailed => write!(f, "board setup failed"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
