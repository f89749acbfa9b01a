//! Win32 storage backend
//!
//! Hand-declared bindings for the small slice of kernel32 and the ioctl
//! surface this tool touches: `CreateFileW`/`DeviceIoControl` over
//! `\\.\PhysicalDriveN` and `\\.\X:` namespaces, storage property and
//! geometry queries, volume lock/dismount, the disk offline attribute,
//! and direct SCSI pass-through. Struct shapes follow the DDK headers;
//! control codes are derived with the `CTL_CODE` formula rather than
//! pasted as magic numbers.

use std::ffi::c_void;
use std::io;
use std::iter;
use std::mem;
use std::ptr;

use crate::host::{
    AccessMode, DeviceControl, DeviceIdentity, DiskGeometry, StorageHost, VolumeControl,
};
use crate::scsi::{CommandStatus, UnmapCommand, SENSE_BUFFER_LEN, UNMAP_CDB_LEN};

type Handle = isize;

const INVALID_HANDLE_VALUE: Handle = -1;

const GENERIC_READ: u32 = 0x8000_0000;
const GENERIC_WRITE: u32 = 0x4000_0000;
const FILE_SHARE_READ: u32 = 0x0000_0001;
const FILE_SHARE_WRITE: u32 = 0x0000_0002;
const OPEN_EXISTING: u32 = 3;

// CTL_CODE(DeviceType, Function, Method, Access) from winioctl.h
const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

const FILE_DEVICE_CONTROLLER: u32 = 0x0004;
const FILE_DEVICE_DISK: u32 = 0x0007;
const FILE_DEVICE_FILE_SYSTEM: u32 = 0x0009;
const FILE_DEVICE_MASS_STORAGE: u32 = 0x002D;
const IOCTL_VOLUME_BASE: u32 = 0x0056; // 'V'

const METHOD_BUFFERED: u32 = 0;
const FILE_ANY_ACCESS: u32 = 0;
const FILE_READ_ACCESS: u32 = 1;
const FILE_WRITE_ACCESS: u32 = 2;

const IOCTL_STORAGE_QUERY_PROPERTY: u32 =
    ctl_code(FILE_DEVICE_MASS_STORAGE, 0x0500, METHOD_BUFFERED, FILE_ANY_ACCESS);
const IOCTL_DISK_GET_DRIVE_GEOMETRY_EX: u32 =
    ctl_code(FILE_DEVICE_DISK, 0x0028, METHOD_BUFFERED, FILE_ANY_ACCESS);
const IOCTL_DISK_SET_DISK_ATTRIBUTES: u32 = ctl_code(
    FILE_DEVICE_DISK,
    0x003D,
    METHOD_BUFFERED,
    FILE_READ_ACCESS | FILE_WRITE_ACCESS,
);
const IOCTL_VOLUME_GET_VOLUME_DISK_EXTENTS: u32 =
    ctl_code(IOCTL_VOLUME_BASE, 0x0000, METHOD_BUFFERED, FILE_ANY_ACCESS);
const IOCTL_SCSI_PASS_THROUGH_DIRECT: u32 = ctl_code(
    FILE_DEVICE_CONTROLLER,
    0x0405,
    METHOD_BUFFERED,
    FILE_READ_ACCESS | FILE_WRITE_ACCESS,
);
const FSCTL_LOCK_VOLUME: u32 =
    ctl_code(FILE_DEVICE_FILE_SYSTEM, 6, METHOD_BUFFERED, FILE_ANY_ACCESS);
const FSCTL_UNLOCK_VOLUME: u32 =
    ctl_code(FILE_DEVICE_FILE_SYSTEM, 7, METHOD_BUFFERED, FILE_ANY_ACCESS);
const FSCTL_DISMOUNT_VOLUME: u32 =
    ctl_code(FILE_DEVICE_FILE_SYSTEM, 8, METHOD_BUFFERED, FILE_ANY_ACCESS);

// STORAGE_PROPERTY_QUERY selectors
const STORAGE_DEVICE_PROPERTY: u32 = 0;
const PROPERTY_STANDARD_QUERY: u32 = 0;

// STORAGE_DEVICE_DESCRIPTOR field offsets (fixed-size header prefix)
const DESCRIPTOR_VENDOR_ID_OFFSET: usize = 12;
const DESCRIPTOR_PRODUCT_ID_OFFSET: usize = 16;

const DISK_ATTRIBUTE_OFFLINE: u64 = 0x1;

const SCSI_IOCTL_DATA_OUT: u8 = 0;

#[repr(C)]
struct StoragePropertyQuery {
    property_id: u32,
    query_type: u32,
    additional_parameters: [u8; 1],
}

#[repr(C)]
struct RawDiskGeometry {
    cylinders: i64,
    media_type: u32,
    tracks_per_cylinder: u32,
    sectors_per_track: u32,
    bytes_per_sector: u32,
}

#[repr(C)]
struct RawDiskGeometryEx {
    geometry: RawDiskGeometry,
    disk_size: i64,
    data: [u8; 1],
}

#[repr(C)]
#[derive(Clone, Copy)]
struct DiskExtent {
    disk_number: u32,
    starting_offset: i64,
    extent_length: i64,
}

/// Room for multi-extent volumes; spanned volumes beyond this are rare
/// enough that the query failing outright (and the volume being skipped)
/// is acceptable.
const MAX_EXTENTS: usize = 8;

#[repr(C)]
struct VolumeDiskExtents {
    number_of_disk_extents: u32,
    extents: [DiskExtent; MAX_EXTENTS],
}

#[repr(C)]
struct SetDiskAttributes {
    version: u32,
    persist: u8,
    reserved1: [u8; 3],
    attributes: u64,
    attributes_mask: u64,
    reserved2: [u32; 4],
}

#[repr(C)]
struct ScsiPassThroughDirect {
    length: u16,
    scsi_status: u8,
    path_id: u8,
    target_id: u8,
    lun: u8,
    cdb_length: u8,
    sense_info_length: u8,
    data_in: u8,
    data_transfer_length: u32,
    time_out_value: u32,
    data_buffer: *mut c_void,
    sense_info_offset: u32,
    cdb: [u8; 16],
}

#[repr(C)]
struct ScsiPassThroughDirectWithSense {
    sptd: ScsiPassThroughDirect,
    sense: [u8; SENSE_BUFFER_LEN],
}

#[link(name = "kernel32")]
extern "system" {
    fn CreateFileW(
        file_name: *const u16,
        desired_access: u32,
        share_mode: u32,
        security_attributes: *mut c_void,
        creation_disposition: u32,
        flags_and_attributes: u32,
        template_file: Handle,
    ) -> Handle;
    fn CloseHandle(handle: Handle) -> i32;
    fn DeviceIoControl(
        handle: Handle,
        control_code: u32,
        in_buffer: *const c_void,
        in_buffer_size: u32,
        out_buffer: *mut c_void,
        out_buffer_size: u32,
        bytes_returned: *mut u32,
        overlapped: *mut c_void,
    ) -> i32;
    fn GetSystemDirectoryW(buffer: *mut u16, size: u32) -> u32;
}

/// Owned Win32 handle, closed on drop
struct Win32Handle(Handle);

impl Drop for Win32Handle {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

fn open_path(path: &str, desired_access: u32) -> io::Result<Win32Handle> {
    let wide: Vec<u16> = path.encode_utf16().chain(iter::once(0)).collect();
    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            desired_access,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            ptr::null_mut(),
            OPEN_EXISTING,
            0,
            0,
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        Err(io::Error::last_os_error())
    } else {
        Ok(Win32Handle(handle))
    }
}

fn ioctl(
    handle: &Win32Handle,
    control_code: u32,
    in_buffer: *const c_void,
    in_size: u32,
    out_buffer: *mut c_void,
    out_size: u32,
) -> io::Result<u32> {
    let mut returned = 0u32;
    let ok = unsafe {
        DeviceIoControl(
            handle.0,
            control_code,
            in_buffer,
            in_size,
            out_buffer,
            out_size,
            &mut returned,
            ptr::null_mut(),
        )
    };
    if ok == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(returned)
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut field = [0u8; 4];
    field.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_ne_bytes(field)
}

/// Pull a NUL-terminated identity string out of a descriptor buffer.
/// Offset 0 means the field is absent.
fn descriptor_string(buf: &[u8], offset: u32) -> Option<String> {
    let offset = offset as usize;
    if offset == 0 || offset >= buf.len() {
        return None;
    }
    let tail = &buf[offset..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    let text = String::from_utf8_lossy(&tail[..end]);
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The Win32 backend
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsHost;

/// Open handle to a `\\.\PhysicalDriveN` device
pub struct WindowsDevice {
    handle: Win32Handle,
}

/// Open handle to a `\\.\X:` volume
pub struct WindowsVolume {
    handle: Win32Handle,
}

impl StorageHost for WindowsHost {
    type Device = WindowsDevice;
    type Volume = WindowsVolume;

    fn open_device(&self, device_id: u32) -> io::Result<WindowsDevice> {
        let path = format!(r"\\.\PhysicalDrive{device_id}");
        let handle = open_path(&path, GENERIC_READ | GENERIC_WRITE)?;
        Ok(WindowsDevice { handle })
    }

    fn open_volume(&self, letter: char, mode: AccessMode) -> io::Result<WindowsVolume> {
        let access = match mode {
            AccessMode::Read => GENERIC_READ,
            AccessMode::ReadWrite => GENERIC_READ | GENERIC_WRITE,
        };
        let path = format!(r"\\.\{letter}:");
        let handle = open_path(&path, access)?;
        Ok(WindowsVolume { handle })
    }

    fn system_drive_letter(&self) -> Option<char> {
        let mut buf = [0u16; 260];
        let len = unsafe { GetSystemDirectoryW(buf.as_mut_ptr(), buf.len() as u32) };
        if len == 0 || len as usize >= buf.len() {
            return None;
        }
        let first = char::from_u32(buf[0] as u32)?;
        if first.is_ascii_alphabetic() {
            Some(first.to_ascii_uppercase())
        } else {
            None
        }
    }
}

impl DeviceControl for WindowsDevice {
    fn identity(&self) -> io::Result<DeviceIdentity> {
        let query = StoragePropertyQuery {
            property_id: STORAGE_DEVICE_PROPERTY,
            query_type: PROPERTY_STANDARD_QUERY,
            additional_parameters: [0],
        };
        let mut buf = [0u8; 4096];
        ioctl(
            &self.handle,
            IOCTL_STORAGE_QUERY_PROPERTY,
            &query as *const StoragePropertyQuery as *const c_void,
            mem::size_of::<StoragePropertyQuery>() as u32,
            buf.as_mut_ptr() as *mut c_void,
            buf.len() as u32,
        )?;
        Ok(DeviceIdentity {
            vendor: descriptor_string(&buf, read_u32(&buf, DESCRIPTOR_VENDOR_ID_OFFSET)),
            product: descriptor_string(&buf, read_u32(&buf, DESCRIPTOR_PRODUCT_ID_OFFSET)),
        })
    }

    fn geometry(&self) -> io::Result<DiskGeometry> {
        let mut geo: RawDiskGeometryEx = unsafe { mem::zeroed() };
        ioctl(
            &self.handle,
            IOCTL_DISK_GET_DRIVE_GEOMETRY_EX,
            ptr::null(),
            0,
            &mut geo as *mut RawDiskGeometryEx as *mut c_void,
            mem::size_of::<RawDiskGeometryEx>() as u32,
        )?;
        Ok(DiskGeometry {
            size_bytes: geo.disk_size.max(0) as u64,
            bytes_per_sector: geo.geometry.bytes_per_sector,
        })
    }

    fn set_offline(&mut self, offline: bool) -> io::Result<()> {
        let attributes = SetDiskAttributes {
            version: mem::size_of::<SetDiskAttributes>() as u32,
            persist: 0,
            reserved1: [0; 3],
            attributes: if offline { DISK_ATTRIBUTE_OFFLINE } else { 0 },
            attributes_mask: DISK_ATTRIBUTE_OFFLINE,
            reserved2: [0; 4],
        };
        ioctl(
            &self.handle,
            IOCTL_DISK_SET_DISK_ATTRIBUTES,
            &attributes as *const SetDiskAttributes as *const c_void,
            mem::size_of::<SetDiskAttributes>() as u32,
            ptr::null_mut(),
            0,
        )?;
        Ok(())
    }

    fn submit_unmap(
        &mut self,
        command: &UnmapCommand,
        timeout_secs: u32,
    ) -> io::Result<CommandStatus> {
        // The kernel reads the data-out buffer through a raw pointer, so
        // it has to stay alive (and mutable per the API) across the call.
        let mut data = *command.parameter_list();

        let mut cdb = [0u8; 16];
        cdb[..UNMAP_CDB_LEN].copy_from_slice(command.cdb());

        let mut wrapper = ScsiPassThroughDirectWithSense {
            sptd: ScsiPassThroughDirect {
                length: mem::size_of::<ScsiPassThroughDirect>() as u16,
                scsi_status: 0,
                path_id: 0,
                target_id: 0,
                lun: 0,
                cdb_length: UNMAP_CDB_LEN as u8,
                sense_info_length: SENSE_BUFFER_LEN as u8,
                data_in: SCSI_IOCTL_DATA_OUT,
                data_transfer_length: data.len() as u32,
                time_out_value: timeout_secs,
                data_buffer: data.as_mut_ptr() as *mut c_void,
                sense_info_offset: mem::size_of::<ScsiPassThroughDirect>() as u32,
                cdb,
            },
            sense: [0u8; SENSE_BUFFER_LEN],
        };

        let wrapper_ptr = &mut wrapper as *mut ScsiPassThroughDirectWithSense;
        ioctl(
            &self.handle,
            IOCTL_SCSI_PASS_THROUGH_DIRECT,
            wrapper_ptr as *const c_void,
            mem::size_of::<ScsiPassThroughDirectWithSense>() as u32,
            wrapper_ptr as *mut c_void,
            mem::size_of::<ScsiPassThroughDirectWithSense>() as u32,
        )?;

        Ok(CommandStatus {
            scsi_status: wrapper.sptd.scsi_status,
            sense: wrapper.sense,
        })
    }
}

impl VolumeControl for WindowsVolume {
    fn backing_devices(&self) -> io::Result<Vec<u32>> {
        let mut extents: VolumeDiskExtents = unsafe { mem::zeroed() };
        ioctl(
            &self.handle,
            IOCTL_VOLUME_GET_VOLUME_DISK_EXTENTS,
            ptr::null(),
            0,
            &mut extents as *mut VolumeDiskExtents as *mut c_void,
            mem::size_of::<VolumeDiskExtents>() as u32,
        )?;
        let count = (extents.number_of_disk_extents as usize).min(MAX_EXTENTS);
        Ok(extents.extents[..count].iter().map(|e| e.disk_number).collect())
    }

    fn lock(&mut self) -> io::Result<()> {
        ioctl(
            &self.handle,
            FSCTL_LOCK_VOLUME,
            ptr::null(),
            0,
            ptr::null_mut(),
            0,
        )?;
        Ok(())
    }

    fn dismount(&mut self) -> io::Result<()> {
        ioctl(
            &self.handle,
            FSCTL_DISMOUNT_VOLUME,
            ptr::null(),
            0,
            ptr::null_mut(),
            0,
        )?;
        Ok(())
    }

    fn unlock(&mut self) -> io::Result<()> {
        ioctl(
            &self.handle,
            FSCTL_UNLOCK_VOLUME,
            ptr::null(),
            0,
            ptr::null_mut(),
            0,
        )?;
        Ok(())
    }
}
