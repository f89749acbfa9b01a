//! Device enumeration
//!
//! Probes the candidate device ids, reads identity and capacity from each
//! one that answers, and flags the device the running system lives on so
//! front-ends can mark it.

use crate::host::{AccessMode, DeviceControl, DeviceIdentity, StorageHost, VolumeControl};

/// Device ids probed by `list_devices`
pub const MAX_DEVICES: u32 = 16;

/// Identity shown when the hardware query fails outright
pub const UNKNOWN_MODEL: &str = "(Unknown)";

/// Identity shown when the query succeeds but names nothing
pub const UNNAMED_MODEL: &str = "(Unknown Device)";

/// One enumerated device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    /// Physical device id (the N in the device path)
    pub device_id: u32,
    /// Vendor/product identity, or a sentinel
    pub model: String,
    /// Capacity in bytes; 0 when the geometry query failed
    pub size_bytes: u64,
    /// Whether the running system's volume lives on this device
    pub is_system: bool,
}

/// Enumerate devices `0..max_candidates`
///
/// Ids that fail to open are skipped without comment (most of the probe
/// range is simply absent). Identity and capacity failures on a present
/// device degrade to sentinels instead of dropping it from the list.
pub fn enumerate_devices<H: StorageHost>(host: &H, max_candidates: u32) -> Vec<DiskInfo> {
    let system_id = system_device_id(host);
    let mut devices = Vec::new();

    for device_id in 0..max_candidates {
        let device = match host.open_device(device_id) {
            Ok(device) => device,
            Err(error) => {
                log::debug!("device {device_id} not present: {error}");
                continue;
            }
        };

        let model = match device.identity() {
            Ok(identity) => model_string(&identity),
            Err(_) => UNKNOWN_MODEL.to_string(),
        };
        let size_bytes = device.geometry().map(|g| g.size_bytes).unwrap_or(0);

        devices.push(DiskInfo {
            device_id,
            model,
            size_bytes,
            is_system: system_id == Some(device_id),
        });
    }
    devices
}

/// Device id holding the system volume, when resolvable
///
/// Walks system drive letter to volume handle to backing extents and
/// takes the first. Best-effort: any failure along the way means no
/// device gets the system flag, never an error.
pub fn system_device_id<H: StorageHost>(host: &H) -> Option<u32> {
    let letter = host.system_drive_letter()?;
    let volume = host.open_volume(letter, AccessMode::Read).ok()?;
    let devices = volume.backing_devices().ok()?;
    devices.first().copied()
}

/// Compose the display identity from the descriptor strings
fn model_string(identity: &DeviceIdentity) -> String {
    match (identity.vendor.as_deref(), identity.product.as_deref()) {
        (Some(vendor), Some(product)) => format!("{vendor} {product}"),
        (None, Some(product)) => product.to_string(),
        (Some(vendor), None) => vendor.to_string(),
        (None, None) => UNNAMED_MODEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(vendor: Option<&str>, product: Option<&str>) -> DeviceIdentity {
        DeviceIdentity {
            vendor: vendor.map(str::to_string),
            product: product.map(str::to_string),
        }
    }

    #[test]
    fn test_model_string_prefers_both() {
        assert_eq!(
            model_string(&identity(Some("SAMSUNG"), Some("870 EVO"))),
            "SAMSUNG 870 EVO"
        );
    }

    #[test]
    fn test_model_string_fallbacks() {
        assert_eq!(model_string(&identity(None, Some("870 EVO"))), "870 EVO");
        assert_eq!(model_string(&identity(Some("SAMSUNG"), None)), "SAMSUNG");
        assert_eq!(model_string(&identity(None, None)), UNNAMED_MODEL);
    }
}
