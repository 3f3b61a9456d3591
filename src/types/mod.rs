//! Core wire-level types.
//!
//! - [`PackageFormat`] selects how a package payload is interpreted
//! - [`EventTag`] identifies one record inside an event or snapshot payload,
//!   together with its fixed wire length
//! - virtual device helpers map host identities into the reserved device range

mod device;
mod format;

pub use device::{
    VIRTUAL_DEVICE_BASE, host_for_virtual_device, is_virtual_device, virtual_device_for_host,
};
pub use format::{EventTag, PackageFormat, RESERVE_MODE_ENTRY_LEN, RESERVE_MODE_HEADER_LEN};
