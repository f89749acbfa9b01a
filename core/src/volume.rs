//! Volume discovery
//!
//! Maps mounted drive letters back to the physical device underneath, so
//! the access controller knows what to lock before trimming.

use std::ops::RangeInclusive;

use crate::host::{AccessMode, StorageHost, VolumeControl};

/// Drive letters probed for resident volumes
pub const VOLUME_LETTERS: RangeInclusive<char> = 'A'..='Z';

/// Find every lettered volume with an extent on `device_id`
///
/// Scans ascending A through Z. Letters that do not open are unassigned
/// and skipped; volumes whose extent query fails are skipped too; handles
/// to volumes on other devices close immediately. Never fails, the worst
/// case is an empty result.
pub fn volumes_on_device<H: StorageHost>(host: &H, device_id: u32) -> Vec<(char, H::Volume)> {
    let mut found = Vec::new();
    for letter in VOLUME_LETTERS {
        let volume = match host.open_volume(letter, AccessMode::ReadWrite) {
            Ok(volume) => volume,
            Err(_) => continue,
        };
        match volume.backing_devices() {
            Ok(devices) if devices.contains(&device_id) => found.push((letter, volume)),
            Ok(_) => {}
            Err(error) => {
                log::debug!("extent query failed for volume {letter}: {error}");
            }
        }
    }
    found
}
