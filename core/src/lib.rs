//! Full-device trim engine
//!
//! Issues SCSI UNMAP across the whole logical block range of a device,
//! which on a well-behaved SSD deallocates every block it has. Built for
//! sanitizing flash storage behind USB-to-storage (UASP) bridges, where
//! the usual secure-erase paths are unavailable but pass-through UNMAP
//! works.
//!
//! The crate is UI-agnostic and returns values: enumeration yields
//! [`DiskInfo`] descriptors, a run yields a [`TrimReport`] with structured
//! warnings. Consent gathering is entirely the caller's job; by the time
//! [`run_full_trim`] is called, the data is forfeit.
//!
//! # Usage
//!
//! ```ignore
//! use fulltrim_core::{list_devices, run_full_trim, WindowsHost};
//!
//! let host = WindowsHost;
//! for disk in list_devices(&host) {
//!     println!("{}: {} ({} bytes)", disk.device_id, disk.model, disk.size_bytes);
//! }
//! let report = run_full_trim(&host, 2, |p| eprint!("\r{:5.1}%", p.percent()));
//! ```

pub mod access;
pub mod device;
pub mod error;
pub mod host;
pub mod scsi;
pub mod trim;
pub mod volume;

pub use access::{acquire, AccessSession, AccessWarning, VolumeLock};
pub use device::{
    enumerate_devices, system_device_id, DiskInfo, MAX_DEVICES, UNKNOWN_MODEL, UNNAMED_MODEL,
};
pub use error::{Result, TrimError};
pub use host::{
    AccessMode, DeviceControl, DeviceIdentity, DiskGeometry, StorageHost, VolumeControl,
};
pub use scsi::{CommandStatus, SenseData, UnmapCommand};
pub use trim::{
    chunks_needed, run_full_trim, BlockRange, ChunkPlan, DispatchState, TrimProgress, TrimReport,
    UnmapDispatcher, MAX_BLOCKS_PER_UNMAP, UNMAP_TIMEOUT_SECS,
};

#[cfg(windows)]
pub use host::WindowsHost;

/// Enumerate the standard candidate id range
pub fn list_devices<H: StorageHost>(host: &H) -> Vec<DiskInfo> {
    device::enumerate_devices(host, MAX_DEVICES)
}
