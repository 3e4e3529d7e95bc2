//! Integer handle for a pinned region's base address.

use std::ffi::c_void;
use std::fmt;

/// Base address of a pinned region, as it crosses the FFI boundary.
///
/// Wire-compatible with a `u64` (`#[repr(transparent)]`), but deliberately
/// has no arithmetic. A handle is only meaningful between the allocation
/// that produced it and its matching release.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinnedHandle(u64);

impl PinnedHandle {
    /// The null handle. Never returned by a successful allocation.
    pub const NULL: PinnedHandle = PinnedHandle(0);

    /// Wrap a raw address received from the other side of the boundary.
    pub const fn from_raw(addr: u64) -> Self {
        PinnedHandle(addr)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }

    pub fn from_ptr(ptr: *mut c_void) -> Self {
        PinnedHandle(ptr as usize as u64)
    }

    /// Reinterpret as a native pointer. Truncates on targets narrower than 64 bits,
    /// which cannot have produced a wider address in the first place.
    pub fn as_ptr(self) -> *mut c_void {
        self.0 as usize as *mut c_void
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PinnedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<PinnedHandle> for u64 {
    fn from(handle: PinnedHandle) -> Self {
        handle.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_round_trip() {
        let mut byte = 0u8;
        let ptr = &mut byte as *mut u8 as *mut c_void;
        let handle = PinnedHandle::from_ptr(ptr);
        assert_eq!(handle.as_ptr(), ptr);
        assert!(!handle.is_null());
    }

    #[test]
    fn test_wire_layout() {
        assert_eq!(std::mem::size_of::<PinnedHandle>(), std::mem::size_of::<u64>());
        assert_eq!(PinnedHandle::from_raw(0x1000).to_string(), "0x1000");
        assert!(PinnedHandle::NULL.is_null());
    }
}
