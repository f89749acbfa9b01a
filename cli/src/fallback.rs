//! Stand-in host for platforms without a storage backend
//!
//! Keeps the binary buildable and `--list`-runnable off Windows. Every
//! open fails with `Unsupported`, so enumeration finds nothing and a trim
//! attempt reports a clean device-open error instead of compiling the
//! whole front-end away.

use std::io;

use fulltrim_core::{
    AccessMode, CommandStatus, DeviceControl, DeviceIdentity, DiskGeometry, StorageHost,
    UnmapCommand, VolumeControl,
};

/// Host with no devices behind it
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedHost;

/// Uninhabited handle type; no open ever produces one
pub enum NoHandle {}

impl StorageHost for UnsupportedHost {
    type Device = NoHandle;
    type Volume = NoHandle;

    fn open_device(&self, _device_id: u32) -> io::Result<NoHandle> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    fn open_volume(&self, _letter: char, _mode: AccessMode) -> io::Result<NoHandle> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    fn system_drive_letter(&self) -> Option<char> {
        None
    }
}

impl DeviceControl for NoHandle {
    fn identity(&self) -> io::Result<DeviceIdentity> {
        match *self {}
    }

    fn geometry(&self) -> io::Result<DiskGeometry> {
        match *self {}
    }

    fn set_offline(&mut self, _offline: bool) -> io::Result<()> {
        match *self {}
    }

    fn submit_unmap(
        &mut self,
        _command: &UnmapCommand,
        _timeout_secs: u32,
    ) -> io::Result<CommandStatus> {
        match *self {}
    }
}

impl VolumeControl for NoHandle {
    fn backing_devices(&self) -> io::Result<Vec<u32>> {
        match *self {}
    }

    fn lock(&mut self) -> io::Result<()> {
        match *self {}
    }

    fn dismount(&mut self) -> io::Result<()> {
        match *self {}
    }

    fn unlock(&mut self) -> io::Result<()> {
        match *self {}
    }
}
