//! Device resolver — binds a logical device name to a live endpoint.

use minibar_domain::device::{Capability, DeviceDescriptor};

use crate::ports::{DeviceDirectory, DeviceError};

/// Find the first attached device named exactly `name` that supports
/// `capability`.
///
/// Enumerates through `directory` on every call; nothing is cached, so a
/// device plugged in between two triggers is found by the second one.
/// Returns `Ok(None)` when nothing matches: missing hardware is expected.
///
/// # Errors
///
/// Returns [`DeviceError::Enumeration`] when the directory cannot be queried.
#[tracing::instrument(skip(directory))]
pub fn resolve<D: DeviceDirectory>(
    directory: &D,
    name: &str,
    capability: Capability,
) -> Result<Option<DeviceDescriptor>, DeviceError> {
    let devices = directory.devices()?;
    tracing::debug!(count = devices.len(), "enumerated devices");
    Ok(devices
        .into_iter()
        .filter(|d| d.supports(capability))
        .find(|d| d.name == name))
}
