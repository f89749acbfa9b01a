//! Host storage access
//!
//! Trait seam between the portable trim logic and the operating system.
//! Enumeration, locking, and dispatch are written against these traits;
//! the only real backend is Win32 (`WindowsHost`), and the test suite
//! drives the same code through an in-memory host.

use std::io;

use crate::scsi::{CommandStatus, UnmapCommand};

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub use windows::WindowsHost;

/// How a volume handle will be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Query-only access (extent lookups)
    Read,
    /// Lock/dismount access
    ReadWrite,
}

/// Identity strings from the device's hardware descriptor
///
/// Either field may be absent; devices routinely report only one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor: Option<String>,
    pub product: Option<String>,
}

/// Capacity and addressing geometry as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskGeometry {
    pub size_bytes: u64,
    pub bytes_per_sector: u32,
}

/// Factory for device and volume handles
pub trait StorageHost {
    type Device: DeviceControl;
    type Volume: VolumeControl;

    /// Open a physical device by id, read/write with shared sharing mode.
    /// Closing is the handle's own concern (drop).
    fn open_device(&self, device_id: u32) -> io::Result<Self::Device>;

    /// Open a volume by drive letter
    fn open_volume(&self, letter: char, mode: AccessMode) -> io::Result<Self::Volume>;

    /// Drive letter of the volume holding the running system, if resolvable
    fn system_drive_letter(&self) -> Option<char>;
}

/// Control channel to one physical device
pub trait DeviceControl {
    /// Hardware identity strings
    fn identity(&self) -> io::Result<DeviceIdentity>;

    /// Capacity and sector size
    fn geometry(&self) -> io::Result<DiskGeometry>;

    /// Toggle the OS-level offline state of the device
    fn set_offline(&mut self, offline: bool) -> io::Result<()>;

    /// Submit one UNMAP through the pass-through channel
    ///
    /// `Ok` means the transport delivered the command and brought back a
    /// status; the status itself may still be non-good. `Err` covers
    /// driver rejection, device loss, and timeout.
    fn submit_unmap(
        &mut self,
        command: &UnmapCommand,
        timeout_secs: u32,
    ) -> io::Result<CommandStatus>;
}

/// Control channel to one mounted volume
pub trait VolumeControl {
    /// Physical device ids backing this volume's extents
    fn backing_devices(&self) -> io::Result<Vec<u32>>;

    /// Take the volume lock (denies new file-system opens)
    fn lock(&mut self) -> io::Result<()>;

    /// Force the mounted filesystem off the volume
    fn dismount(&mut self) -> io::Result<()>;

    /// Release the volume lock
    fn unlock(&mut self) -> io::Result<()>;
}
