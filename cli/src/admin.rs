//! Elevation check
//!
//! Raw device handles and volume locks need administrator rights, so the
//! interactive flow refuses early with a readable message instead of
//! failing later with access-denied noise. Membership in
//! BUILTIN\Administrators is the test, same as the OS uses.

#[cfg(windows)]
pub use windows::is_elevated;

/// Elevation is a Windows concept; elsewhere there is nothing to check
#[cfg(not(windows))]
pub fn is_elevated() -> bool {
    true
}

#[cfg(windows)]
mod windows {
    use std::ffi::c_void;
    use std::ptr;

    #[repr(C)]
    struct SidIdentifierAuthority {
        value: [u8; 6],
    }

    const SECURITY_NT_AUTHORITY: SidIdentifierAuthority = SidIdentifierAuthority {
        value: [0, 0, 0, 0, 0, 5],
    };
    const SECURITY_BUILTIN_DOMAIN_RID: u32 = 0x20;
    const DOMAIN_ALIAS_RID_ADMINS: u32 = 0x220;

    #[link(name = "advapi32")]
    extern "system" {
        fn AllocateAndInitializeSid(
            identifier_authority: *const SidIdentifierAuthority,
            sub_authority_count: u8,
            sub_authority0: u32,
            sub_authority1: u32,
            sub_authority2: u32,
            sub_authority3: u32,
            sub_authority4: u32,
            sub_authority5: u32,
            sub_authority6: u32,
            sub_authority7: u32,
            sid: *mut *mut c_void,
        ) -> i32;
        fn CheckTokenMembership(
            token_handle: *mut c_void,
            sid_to_check: *mut c_void,
            is_member: *mut i32,
        ) -> i32;
        fn FreeSid(sid: *mut c_void) -> *mut c_void;
    }

    /// Whether the current token belongs to BUILTIN\Administrators.
    /// Any failure along the way reads as not elevated.
    pub fn is_elevated() -> bool {
        let mut sid: *mut c_void = ptr::null_mut();
        let allocated = unsafe {
            AllocateAndInitializeSid(
                &SECURITY_NT_AUTHORITY,
                2,
                SECURITY_BUILTIN_DOMAIN_RID,
                DOMAIN_ALIAS_RID_ADMINS,
                0,
                0,
                0,
                0,
                0,
                0,
                &mut sid,
            )
        };
        if allocated == 0 {
            return false;
        }

        let mut is_member = 0i32;
        let checked = unsafe { CheckTokenMembership(ptr::null_mut(), sid, &mut is_member) };
        unsafe {
            FreeSid(sid);
        }
        checked != 0 && is_member != 0
    }
}
