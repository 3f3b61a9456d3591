//! Virtual device identities
//!
//! Device ids at or above [`VIRTUAL_DEVICE_BASE`] do not name a physical
//! sensor device; they stand for a host's own connection.

use crate::{Result, TelemetryError};

/// First device id of the virtual range.
pub const VIRTUAL_DEVICE_BASE: i32 = 0x2000_0000;

/// Virtual device id representing the given host.
pub fn virtual_device_for_host(host_id: i32) -> i32 {
    host_id.wrapping_add(VIRTUAL_DEVICE_BASE)
}

/// Host id a virtual device id stands for.
pub fn host_for_virtual_device(device_id: i32) -> Result<i32> {
    if !is_virtual_device(device_id) {
        return Err(TelemetryError::NotVirtualDevice { device_id });
    }
    Ok(device_id - VIRTUAL_DEVICE_BASE)
}

pub fn is_virtual_device(device_id: i32) -> bool {
    device_id >= VIRTUAL_DEVICE_BASE
}
