//! Board description for the emulator
//!
//! A board file lists the partitions to emulate:
//!
//! ```toml
//! [[partition]]
//! name = "boot"
//! size = "1 MiB"
//! erase_size = "128 KiB"
//! write_size = 2048
//!
//! [[partition]]
//! name = "rootfs"
//! size = "16 MiB"
//! erase_size = "128 KiB"
//! write_size = 2048
//! probe_delay = 1
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DummyError, Result};

/// Geometry of one emulated partition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PartitionConfig {
    /// Partition name
    pub name: String,
    /// Size in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub size: u64,
    /// Erase block size in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub erase_size: u64,
    /// Page size in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub write_size: u64,
    /// Number of probes that miss the partition before it registers
    #[serde(default)]
    pub probe_delay: u32,
}

impl PartitionConfig {
    /// Create a partition that registers on the first probe
    pub fn new(name: impl Into<String>, size: u64, erase_size: u64, write_size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            erase_size,
            write_size,
            probe_delay: 0,
        }
    }

    /// Delay registration by `probes` probes
    pub fn with_probe_delay(mut self, probes: u32) -> Self {
        self.probe_delay = probes;
        self
    }

    fn validate(&self) -> Result<()> {
        let reason = if self.erase_size == 0 || self.write_size == 0 {
            "erase and write sizes must be non-zero"
        } else if self.erase_size > u32::MAX as u64 || self.write_size > u32::MAX as u64 {
            "erase and write sizes must fit in 32 bits"
        } else if self.erase_size % self.write_size != 0 {
            "erase size must be a multiple of the write size"
        } else if self.size % self.erase_size != 0 {
            "size must be a multiple of the erase size"
        } else {
            return Ok(());
        };
        Err(DummyError::InvalidGeometry {
            name: self.name.clone(),
            reason,
        })
    }
}

/// Emulated board
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DummyConfig {
    /// Partitions, in registration order
    #[serde(rename = "partition")]
    pub partitions: Vec<PartitionConfig>,
}

impl Default for DummyConfig {
    /// A small SPI-NAND board: 128 KiB erase blocks, 2 KiB pages
    fn default() -> Self {
        const EB: u64 = 128 * 1024;
        const PAGE: u64 = 2048;
        Self {
            partitions: vec![
                PartitionConfig::new("u-boot", 8 * EB, EB, PAGE),
                PartitionConfig::new("env", EB, EB, PAGE),
                PartitionConfig::new("kernel", 32 * EB, EB, PAGE),
                PartitionConfig::new("rootfs", 128 * EB, EB, PAGE),
            ],
        }
    }
}

impl DummyConfig {
    /// Parse a board description from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a board description from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DummyError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check every partition's geometry and name uniqueness
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for part in &self.partitions {
            part.validate()?;
            if !names.insert(part.name.as_str()) {
                return Err(DummyError::DuplicatePartition(part.name.clone()));
            }
        }
        Ok(())
    }
}

/// Deserialize a size that can be an integer or a string like "128 KiB"
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeOrStr {
        Int(u64),
        Str(String),
    }

    match SizeOrStr::deserialize(deserializer)? {
        SizeOrStr::Int(n) => Ok(n),
        SizeOrStr::Str(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a size string like "16 MiB", "0x20000" or "4096"
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim();
    let invalid = || DummyError::InvalidSize(s.to_string());

    if let Ok(n) = s.parse::<u64>() {
        return Ok(n);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex.trim(), 16).map_err(|_| invalid());
    }

    let lower = s.to_lowercase();
    let (num, multiplier) = if let Some(n) = lower.strip_suffix("gib") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = lower.strip_suffix("mib") {
        (n, 1024 * 1024)
    } else if let Some(n) = lower.strip_suffix("kib") {
        (n, 1024)
    } else if let Some(n) = lower.strip_suffix('b') {
        (n, 1)
    } else {
        return Err(invalid());
    };

    num.trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}
