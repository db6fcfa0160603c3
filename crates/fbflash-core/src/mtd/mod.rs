//! Storage driver traits
//!
//! This module defines the traits a storage backend must implement so the
//! flashing engine can resolve, erase and program MTD-style partitions.

mod traits;

pub use traits::*;
