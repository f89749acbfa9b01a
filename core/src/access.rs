//! Exclusive device access
//!
//! Scoped acquisition of everything the OS lets us claim before issuing
//! destructive commands: locks and dismounts on the resident volumes, the
//! device handle itself, and the offline transition. Soft failures become
//! `AccessWarning` values for the caller to surface; teardown is
//! drop-driven so every exit path releases, in order, without cleanup
//! code at each return.

use std::io;

use thiserror::Error;

use crate::error::{Result, TrimError};
use crate::host::{DeviceControl, StorageHost, VolumeControl};
use crate::volume;

/// Soft failure while preparing exclusive access
///
/// None of these stop a run on their own; they are collected and reported
/// so the operator knows how clean the takeover was.
#[derive(Debug, Error)]
pub enum AccessWarning {
    /// The volume refused the lock; something still holds it open
    #[error("could not lock volume {letter}: {source}")]
    VolumeLock { letter: char, source: io::Error },

    /// The filesystem would not dismount
    #[error("could not dismount volume {letter}: {source}")]
    VolumeDismount { letter: char, source: io::Error },

    /// The device stayed online, so the OS may keep probing it mid-trim
    #[error("could not take the device offline: {source}")]
    SetOffline { source: io::Error },
}

/// One retained volume handle on the target device
///
/// The unlock on drop is unconditional: a volume that refused the lock
/// may still have dismounted, and unlocking an unlocked volume is
/// harmless, so tracking which attempts succeeded buys nothing.
pub struct VolumeLock<V: VolumeControl> {
    letter: char,
    volume: V,
}

impl<V: VolumeControl> VolumeLock<V> {
    /// Drive letter this lock covers
    pub fn letter(&self) -> char {
        self.letter
    }
}

impl<V: VolumeControl> Drop for VolumeLock<V> {
    fn drop(&mut self) {
        if let Err(error) = self.volume.unlock() {
            log::warn!("unlock of volume {} failed: {error}", self.letter);
        }
    }
}

/// Exclusive-access aggregate for one device
///
/// Declaration order is teardown order: the drop body restores the online
/// state while the device handle is still open, then the volume locks
/// release, then the device handle closes.
pub struct AccessSession<D: DeviceControl, V: VolumeControl> {
    device_id: u32,
    volumes: Vec<VolumeLock<V>>,
    device: D,
    took_offline: bool,
}

impl<D: DeviceControl, V: VolumeControl> AccessSession<D, V> {
    /// Device this session holds
    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    /// Volume locks retained on the device
    pub fn volumes(&self) -> &[VolumeLock<V>] {
        &self.volumes
    }

    /// The open device handle
    pub fn device(&self) -> &D {
        &self.device
    }

    /// The open device handle, for command submission
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: DeviceControl, V: VolumeControl> Drop for AccessSession<D, V> {
    fn drop(&mut self) {
        if self.took_offline {
            if let Err(error) = self.device.set_offline(false) {
                log::warn!("device {} was left offline: {error}", self.device_id);
            }
        }
    }
}

/// Acquire exclusive access to `device_id`
///
/// Scans for resident volumes, locks and dismounts each (best-effort,
/// failures append to `warnings`), opens the device, and tries to take it
/// offline (also best-effort). Only the device open itself is fatal; on
/// that path the volume locks already taken are released before the error
/// returns.
pub fn acquire<H: StorageHost>(
    host: &H,
    device_id: u32,
    warnings: &mut Vec<AccessWarning>,
) -> Result<AccessSession<H::Device, H::Volume>> {
    let mut volumes = Vec::new();
    for (letter, mut volume) in volume::volumes_on_device(host, device_id) {
        if let Err(source) = volume.lock() {
            warnings.push(AccessWarning::VolumeLock { letter, source });
        }
        if let Err(source) = volume.dismount() {
            warnings.push(AccessWarning::VolumeDismount { letter, source });
        }
        volumes.push(VolumeLock { letter, volume });
    }
    log::debug!(
        "retained {} volume handle(s) on device {device_id}",
        volumes.len()
    );

    let device = match host.open_device(device_id) {
        Ok(device) => device,
        // `volumes` drops here, unlocking everything taken so far
        Err(source) => return Err(TrimError::DeviceOpen { device_id, source }),
    };

    let mut session = AccessSession {
        device_id,
        volumes,
        device,
        took_offline: false,
    };
    match session.device.set_offline(true) {
        Ok(()) => session.took_offline = true,
        Err(source) => warnings.push(AccessWarning::SetOffline { source }),
    }
    Ok(session)
}
