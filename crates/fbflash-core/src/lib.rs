//! fbflash-core - Core library for flashing images onto MTD partitions
//!
//! This crate implements the storage side of a fastboot-style flashing
//! service: it resolves partitions by name, erases them in erase-unit
//! aligned regions, writes raw images and streams sparse images onto the
//! device through a chunk sink. It is designed to be `no_std` compatible
//! so the same code can run inside a bootloader.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation for device listing
//!
//! # Example
//!
//! ```ignore
//! use fbflash_core::flash::FastbootFlash;
//! use fbflash_core::response::FastbootResponse;
//! use fbflash_core::sparse::NoSparseSupport;
//!
//! fn flash_kernel<D: fbflash_core::mtd::MtdDriver>(driver: D, image: &[u8]) {
//!     let mut flash = FastbootFlash::new(driver, NoSparseSupport);
//!     let mut response = FastbootResponse::new();
//!     let _ = flash.write("kernel", image, &mut response);
//!     println!("{}", response.as_str());
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod erase;
pub mod error;
pub mod flash;
pub mod mtd;
pub mod partition;
pub mod resolve;
pub mod response;
pub mod sparse;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
