//! Owned pinned regions.
//!
//! [`PinnedRegion`] is the single exclusive owner of one allocation: base
//! handle, byte length and the flags it was allocated with. Dropping it
//! releases the memory; [`PinnedRegion::release`] does the same but reports
//! the runtime's answer, and [`PinnedRegion::into_handle`] hands ownership
//! back to the caller as a bare handle.

use std::mem::ManuallyDrop;

use tracing::warn;

use crate::error::ReleaseError;
use crate::flags::HostAllocFlags;
use crate::gateway::PinnedMemoryGateway;
use crate::handle::PinnedHandle;
use crate::runtime::HostMemoryRuntime;

/// A live pinned allocation, released when dropped.
#[derive(Debug)]
pub struct PinnedRegion<'g, R: HostMemoryRuntime> {
    gateway: &'g PinnedMemoryGateway<R>,
    handle: PinnedHandle,
    len: usize,
    flags: HostAllocFlags,
}

impl<'g, R: HostMemoryRuntime> PinnedRegion<'g, R> {
    /// Take ownership of a region allocated through `gateway`.
    ///
    /// # Safety
    ///
    /// `handle` must come from a successful `gateway.allocate` of `len` bytes
    /// that has not been released, and nothing else may release it.
    pub unsafe fn from_raw_parts(
        gateway: &'g PinnedMemoryGateway<R>,
        handle: PinnedHandle,
        len: usize,
        flags: HostAllocFlags,
    ) -> Self {
        Self {
            gateway,
            handle,
            len,
            flags,
        }
    }

    pub fn handle(&self) -> PinnedHandle {
        self.handle
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn flags(&self) -> HostAllocFlags {
        self.flags
    }

    pub fn as_bytes(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: a live region owns `len` contiguous bytes at `handle`.
        unsafe { std::slice::from_raw_parts(self.handle.as_ptr() as *const u8, self.len) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        if self.len == 0 {
            return &mut [];
        }
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.handle.as_ptr() as *mut u8, self.len) }
    }

    /// View the region as a slice of `T`, ignoring trailing bytes that don't
    /// fill a whole element. Zero-sized `T` yields an empty slice.
    pub fn cast_slice<T: bytemuck::Pod>(&self) -> &[T] {
        let elem = std::mem::size_of::<T>();
        if elem == 0 {
            return &[];
        }
        let bytes = self.as_bytes();
        bytemuck::cast_slice(&bytes[..bytes.len() - bytes.len() % elem])
    }

    pub fn cast_slice_mut<T: bytemuck::Pod>(&mut self) -> &mut [T] {
        let elem = std::mem::size_of::<T>();
        if elem == 0 {
            return &mut [];
        }
        let bytes = self.as_bytes_mut();
        let whole = bytes.len() - bytes.len() % elem;
        bytemuck::cast_slice_mut(&mut bytes[..whole])
    }

    /// Release now and report the runtime's answer.
    pub fn release(self) -> Result<(), ReleaseError> {
        let this = ManuallyDrop::new(self);
        this.gateway.release(this.handle)
    }

    /// Give up ownership without releasing. The caller becomes responsible
    /// for passing the handle to [`PinnedMemoryGateway::release`] exactly once.
    pub fn into_handle(self) -> PinnedHandle {
        let this = ManuallyDrop::new(self);
        this.handle
    }
}

impl<R: HostMemoryRuntime> Drop for PinnedRegion<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.gateway.release(self.handle) {
            warn!(handle = %self.handle, len = self.len, error = %e, "Failed to release pinned region on drop");
        }
    }
}
