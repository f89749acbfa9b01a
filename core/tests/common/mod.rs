//! Common test utilities: an in-memory storage host with scripted
//! failures and an event journal for ordering assertions.

#![allow(dead_code)] // not every test binary uses every knob

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;

use fulltrim_core::scsi::{decode_parameter_list, SENSE_BUFFER_LEN};
use fulltrim_core::{
    AccessMode, CommandStatus, DeviceControl, DeviceIdentity, DiskGeometry, StorageHost,
    UnmapCommand, VolumeControl,
};

/// Everything observable that happened to the mock, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    OpenDevice { id: u32, ok: bool },
    CloseDevice { id: u32 },
    OpenVolume { letter: char, write: bool, ok: bool },
    CloseVolume { letter: char },
    Lock { letter: char, ok: bool },
    Dismount { letter: char, ok: bool },
    Unlock { letter: char, ok: bool },
    SetOffline { id: u32, offline: bool, ok: bool },
    SubmitUnmap { id: u32, lba: u64, blocks: u32, timeout_secs: u32 },
}

/// Scripted result for one UNMAP submission
#[derive(Debug, Clone)]
pub enum UnmapOutcome {
    /// Clean GOOD status
    Accept,
    /// Delivered, but the device reports this status byte, optionally
    /// with a fixed-format sense triple `(key, asc, ascq)`
    Status(u8, Option<(u8, u8, u8)>),
    /// The transport itself fails
    Transport(io::ErrorKind),
}

/// Behavior of one mock device
#[derive(Debug, Clone, Default)]
pub struct DeviceSpec {
    /// `None` makes the identity query fail
    pub identity: Option<DeviceIdentity>,
    /// `None` makes the geometry query fail
    pub geometry: Option<DiskGeometry>,
    /// `Some` makes every open of this device fail with that kind
    pub open_error: Option<io::ErrorKind>,
    /// Make the offline toggle fail
    pub offline_error: bool,
    /// Per-submission script; once exhausted, submissions are accepted
    pub unmap_script: Vec<UnmapOutcome>,
    /// Internal script position; leave at 0
    pub script_cursor: usize,
}

impl DeviceSpec {
    /// A device that answers everything and accepts every command
    pub fn healthy(vendor: &str, product: &str, size_bytes: u64) -> Self {
        Self {
            identity: Some(DeviceIdentity {
                vendor: Some(vendor.to_string()),
                product: Some(product.to_string()),
            }),
            geometry: Some(DiskGeometry {
                size_bytes,
                bytes_per_sector: 512,
            }),
            ..Self::default()
        }
    }
}

/// Behavior of one mock volume
#[derive(Debug, Clone, Default)]
pub struct VolumeSpec {
    /// Device ids this volume has extents on
    pub on_devices: Vec<u32>,
    /// Make the extent query fail
    pub extent_error: bool,
    /// `Some` makes every open of this volume fail with that kind
    pub open_error: Option<io::ErrorKind>,
    pub lock_error: bool,
    pub dismount_error: bool,
    pub unlock_error: bool,
}

impl VolumeSpec {
    /// A volume resident on a single device, cooperating fully
    pub fn on(device_id: u32) -> Self {
        Self {
            on_devices: vec![device_id],
            ..Self::default()
        }
    }
}

struct HostState {
    devices: BTreeMap<u32, DeviceSpec>,
    volumes: BTreeMap<char, VolumeSpec>,
    system_letter: Option<char>,
    journal: Vec<Event>,
}

/// In-memory storage host
#[derive(Clone)]
pub struct MockHost {
    state: Rc<RefCell<HostState>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HostState {
                devices: BTreeMap::new(),
                volumes: BTreeMap::new(),
                system_letter: None,
                journal: Vec::new(),
            })),
        }
    }

    pub fn with_device(self, id: u32, spec: DeviceSpec) -> Self {
        self.state.borrow_mut().devices.insert(id, spec);
        self
    }

    pub fn with_volume(self, letter: char, spec: VolumeSpec) -> Self {
        self.state.borrow_mut().volumes.insert(letter, spec);
        self
    }

    pub fn with_system_letter(self, letter: char) -> Self {
        self.state.borrow_mut().system_letter = Some(letter);
        self
    }

    /// Snapshot of the full event journal
    pub fn journal(&self) -> Vec<Event> {
        self.state.borrow().journal.clone()
    }

    /// All UNMAP submissions so far as `(lba, blocks)` pairs
    pub fn submissions(&self) -> Vec<(u64, u32)> {
        self.state
            .borrow()
            .journal
            .iter()
            .filter_map(|e| match e {
                Event::SubmitUnmap { lba, blocks, .. } => Some((*lba, *blocks)),
                _ => None,
            })
            .collect()
    }

    /// Position of the first journal event matching `pred`
    pub fn position<P: FnMut(&Event) -> bool>(&self, pred: P) -> Option<usize> {
        self.state.borrow().journal.iter().position(pred)
    }
}

pub struct MockDevice {
    id: u32,
    state: Rc<RefCell<HostState>>,
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.state
            .borrow_mut()
            .journal
            .push(Event::CloseDevice { id: self.id });
    }
}

pub struct MockVolume {
    letter: char,
    state: Rc<RefCell<HostState>>,
}

impl Drop for MockVolume {
    fn drop(&mut self) {
        self.state
            .borrow_mut()
            .journal
            .push(Event::CloseVolume {
                letter: self.letter,
            });
    }
}

impl StorageHost for MockHost {
    type Device = MockDevice;
    type Volume = MockVolume;

    fn open_device(&self, device_id: u32) -> io::Result<MockDevice> {
        let mut state = self.state.borrow_mut();
        let result = match state.devices.get(&device_id) {
            Some(spec) => match spec.open_error {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(()),
            },
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        };
        state.journal.push(Event::OpenDevice {
            id: device_id,
            ok: result.is_ok(),
        });
        drop(state);
        result.map(|()| MockDevice {
            id: device_id,
            state: Rc::clone(&self.state),
        })
    }

    fn open_volume(&self, letter: char, mode: AccessMode) -> io::Result<MockVolume> {
        let mut state = self.state.borrow_mut();
        let result = match state.volumes.get(&letter) {
            Some(spec) => match spec.open_error {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(()),
            },
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        };
        state.journal.push(Event::OpenVolume {
            letter,
            write: mode == AccessMode::ReadWrite,
            ok: result.is_ok(),
        });
        drop(state);
        result.map(|()| MockVolume {
            letter,
            state: Rc::clone(&self.state),
        })
    }

    fn system_drive_letter(&self) -> Option<char> {
        self.state.borrow().system_letter
    }
}

impl DeviceControl for MockDevice {
    fn identity(&self) -> io::Result<DeviceIdentity> {
        self.state.borrow().devices[&self.id]
            .identity
            .clone()
            .ok_or_else(|| io::Error::from(io::ErrorKind::InvalidData))
    }

    fn geometry(&self) -> io::Result<DiskGeometry> {
        self.state.borrow().devices[&self.id]
            .geometry
            .ok_or_else(|| io::Error::from(io::ErrorKind::Unsupported))
    }

    fn set_offline(&mut self, offline: bool) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        let ok = !state.devices[&self.id].offline_error;
        state.journal.push(Event::SetOffline {
            id: self.id,
            offline,
            ok,
        });
        if ok {
            Ok(())
        } else {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    fn submit_unmap(
        &mut self,
        command: &UnmapCommand,
        timeout_secs: u32,
    ) -> io::Result<CommandStatus> {
        let (lba, blocks) = decode_parameter_list(command.parameter_list())
            .expect("dispatcher submitted a malformed parameter list");

        let mut state = self.state.borrow_mut();
        state.journal.push(Event::SubmitUnmap {
            id: self.id,
            lba,
            blocks,
            timeout_secs,
        });
        let spec = state
            .devices
            .get_mut(&self.id)
            .expect("submission on unknown device");
        let outcome = spec
            .unmap_script
            .get(spec.script_cursor)
            .cloned()
            .unwrap_or(UnmapOutcome::Accept);
        spec.script_cursor += 1;

        match outcome {
            UnmapOutcome::Accept => Ok(CommandStatus::good()),
            UnmapOutcome::Status(status, sense) => Ok(CommandStatus {
                scsi_status: status,
                sense: fixed_sense(sense),
            }),
            UnmapOutcome::Transport(kind) => Err(io::Error::from(kind)),
        }
    }
}

impl VolumeControl for MockVolume {
    fn backing_devices(&self) -> io::Result<Vec<u32>> {
        let spec = self.state.borrow().volumes[&self.letter].clone();
        if spec.extent_error {
            Err(io::Error::from(io::ErrorKind::InvalidData))
        } else {
            Ok(spec.on_devices)
        }
    }

    fn lock(&mut self) -> io::Result<()> {
        self.volume_op(|s| s.lock_error, |letter, ok| Event::Lock { letter, ok })
    }

    fn dismount(&mut self) -> io::Result<()> {
        self.volume_op(|s| s.dismount_error, |letter, ok| Event::Dismount { letter, ok })
    }

    fn unlock(&mut self) -> io::Result<()> {
        self.volume_op(|s| s.unlock_error, |letter, ok| Event::Unlock { letter, ok })
    }
}

impl MockVolume {
    fn volume_op(
        &mut self,
        fails: impl Fn(&VolumeSpec) -> bool,
        event: impl Fn(char, bool) -> Event,
    ) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        let ok = !fails(&state.volumes[&self.letter]);
        state.journal.push(event(self.letter, ok));
        if ok {
            Ok(())
        } else {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }
}

/// Build a fixed-format sense buffer from a `(key, asc, ascq)` triple
fn fixed_sense(triple: Option<(u8, u8, u8)>) -> [u8; SENSE_BUFFER_LEN] {
    let mut buf = [0u8; SENSE_BUFFER_LEN];
    if let Some((key, asc, ascq)) = triple {
        buf[0] = 0x70;
        buf[2] = key & 0x0F;
        buf[12] = asc;
        buf[13] = ascq;
    }
    buf
}
