//! Partition lookup by name
//!
//! Resolving a partition returns a [`DeviceGuard`] that hands the device
//! back to its driver when dropped, so every exit path of an operation
//! releases the device exactly once.

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

use crate::error::{Error, Result};
use crate::mtd::MtdDriver;
use crate::response::Response;

/// Scoped ownership of a resolved partition
///
/// Dereferences to the driver's device type. Dropping the guard calls
/// [`MtdDriver::put_device`].
pub struct DeviceGuard<'a, D: MtdDriver + ?Sized> {
    driver: &'a mut D,
    device: ManuallyDrop<D::Device>,
}

impl<'a, D: MtdDriver + ?Sized> DeviceGuard<'a, D> {
    fn new(driver: &'a mut D, device: D::Device) -> Self {
        Self {
            driver,
            device: ManuallyDrop::new(device),
        }
    }
}

impl<D: MtdDriver + ?Sized> Deref for DeviceGuard<'_, D> {
    type Target = D::Device;

    fn deref(&self) -> &D::Device {
        &self.device
    }
}

impl<D: MtdDriver + ?Sized> DerefMut for DeviceGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut D::Device {
        &mut self.device
    }
}

impl<D: MtdDriver + ?Sized> Drop for DeviceGuard<'_, D> {
    fn drop(&mut self) {
        // SAFETY: `device` is never touched again after this point; the
        // guard is being dropped and this is the only place it is taken.
        let device = unsafe { ManuallyDrop::take(&mut self.device) };
        self.driver.put_device(device);
    }
}

/// Resolve a partition by name
///
/// Probes the driver, then looks the partition up. Drivers that register
/// partitions lazily may report `NoDevice` on the first lookup, so a
/// `NoDevice` result triggers one more probe and exactly one retry. Any
/// other lookup error is returned as is.
///
/// # Errors
/// * `InvalidArgument` - If `name` is empty (the driver is not touched)
/// * `NoDevice` - If the partition is still unknown after the retry
/// * any error the driver's lookup returns
pub fn resolve<'a, D: MtdDriver + ?Sized>(
    driver: &'a mut D,
    name: &str,
) -> Result<DeviceGuard<'a, D>> {
    if name.is_empty() {
        return Err(Error::InvalidArgument);
    }

    driver.probe_devices();
    let device = match driver.get_device(name) {
        Ok(device) => device,
        Err(Error::NoDevice) => {
            log::debug!("Partition '{}' not registered yet, probing again", name);
            driver.probe_devices();
            driver.get_device(name)?
        }
        Err(e) => return Err(e),
    };

    Ok(DeviceGuard::new(driver, device))
}

/// Report a [`resolve`] failure the way every operation does
///
/// An empty name is reported as "partition not given", anything else as
/// "partition not found". Returns the error for propagation.
pub(crate) fn report_resolve_error(name: &str, err: Error, response: &mut dyn Response) -> Error {
    if err == Error::InvalidArgument {
        response.fail("partition not given");
    } else {
        log::warn!("Partition '{}' not found via MTD: {}", name, err);
        response.fail("partition not found");
    }
    err
}
