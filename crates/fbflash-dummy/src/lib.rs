//! fbflash-dummy - In-memory NAND partition emulator
//!
//! This crate provides an MTD driver that keeps its partitions in memory.
//! It's useful for testing the flashing engine and for trying the CLI
//! without real hardware.
//!
//! # Usage with fbflash CLI
//!
//! ```bash
//! # Default board (u-boot, env, kernel, rootfs)
//! fbflash -p dummy info kernel
//!
//! # Board described in a TOML file
//! fbflash -p dummy:board=board.toml flash boot boot.img
//! ```

pub mod config;
pub mod device;
pub mod error;

pub use config::{parse_size, DummyConfig, PartitionConfig};
pub use device::{DummyDevice, DummyMtd, PartitionStats};
pub use error::{DummyError, Result};

use log::warn;
use std::path::Path;

/// Parse backend options from key-value pairs
///
/// # Supported options
/// - `board=<path>` - TOML board file (default board if omitted)
///
/// # Example
/// ```ignore
/// let config = parse_options(&[("board", "board.toml")])?;
/// ```
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyConfig> {
    let mut config = None;

    for (key, value) in options {
        match *key {
            "board" => {
                if value.is_empty() {
                    return Err(DummyError::MissingParameter("board"));
                }
                config = Some(DummyConfig::from_toml_file(Path::new(value))?);
            }
            _ => {
                warn!("Unknown dummy option: {}={}", key, value);
            }
        }
    }

    Ok(config.unwrap_or_default())
}

/// Open the emulator from backend options
pub fn open_dummy(options: &[(&str, &str)]) -> Result<DummyMtd> {
    let config = parse_options(options)?;
    Ok(DummyMtd::new(config))
}
