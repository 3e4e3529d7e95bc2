//! The pinned memory gateway.
//!
//! Two stateless pass-throughs to a [`HostMemoryRuntime`]: allocate a
//! page-locked region and hand back its address as an integer handle, or take
//! a handle back and free the region. Any non-success status from the runtime
//! becomes an error carrying that status. Nothing is retried, logged as an
//! error, or tracked here.

use tracing::debug;

use crate::error::{AllocationError, ReleaseError};
use crate::flags::HostAllocFlags;
use crate::handle::PinnedHandle;
use crate::region::PinnedRegion;
use crate::runtime::HostMemoryRuntime;
use crate::status::RuntimeStatus;

/// Gateway over a host-memory runtime.
#[derive(Debug, Default)]
pub struct PinnedMemoryGateway<R> {
    runtime: R,
}

impl<R: HostMemoryRuntime> PinnedMemoryGateway<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Allocate `size` bytes of pinned host memory.
    ///
    /// Blocks until the runtime answers. A `size` that does not fit the
    /// platform's `usize` is rejected with `INVALID_VALUE` without reaching
    /// the runtime.
    pub fn allocate(&self, size: u64, flags: HostAllocFlags) -> Result<PinnedHandle, AllocationError> {
        let size = usize::try_from(size)
            .map_err(|_| AllocationError::new(RuntimeStatus::INVALID_VALUE))?;

        let ptr = self
            .runtime
            .host_alloc(size, flags)
            .map_err(AllocationError::new)?;

        let handle = PinnedHandle::from_ptr(ptr);
        debug!(
            runtime = self.runtime.name(),
            handle = %handle,
            size,
            flags = flags.bits(),
            "Allocated pinned region"
        );
        Ok(handle)
    }

    /// Free a region previously returned by [`allocate`](Self::allocate).
    ///
    /// The handle must not be used again after this returns `Ok`. Releasing a
    /// handle twice, or one this runtime never produced, is left to the
    /// runtime to detect.
    pub fn release(&self, handle: PinnedHandle) -> Result<(), ReleaseError> {
        self.runtime
            .host_free(handle.as_ptr())
            .map_err(ReleaseError::new)?;

        debug!(runtime = self.runtime.name(), handle = %handle, "Released pinned region");
        Ok(())
    }

    /// Allocate a region owned by the returned guard, released on drop.
    pub fn allocate_region(
        &self,
        size: usize,
        flags: HostAllocFlags,
    ) -> Result<PinnedRegion<'_, R>, AllocationError> {
        let handle = self.allocate(size as u64, flags)?;
        // SAFETY: `handle` was just produced by this gateway for `size` bytes.
        Ok(unsafe { PinnedRegion::from_raw_parts(self, handle, size, flags) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::SimulatedRuntime;

    #[test]
    fn test_allocate_then_release() {
        let gw = PinnedMemoryGateway::new(SimulatedRuntime::new(1 << 20));
        let handle = gw.allocate(4096, HostAllocFlags::DEFAULT).unwrap();
        assert!(!handle.is_null());
        gw.release(handle).unwrap();
        assert_eq!(gw.runtime().live_allocations(), 0);
    }

    #[test]
    fn test_allocation_error_carries_status() {
        let gw = PinnedMemoryGateway::new(SimulatedRuntime::new(1024));
        let err = gw.allocate(4096, HostAllocFlags::DEFAULT).unwrap_err();
        assert_eq!(err.status, RuntimeStatus::MEMORY_ALLOCATION);
    }

    #[test]
    fn test_release_null() {
        let gw = PinnedMemoryGateway::new(SimulatedRuntime::default());
        let err = gw.release(PinnedHandle::NULL).unwrap_err();
        assert_eq!(err.status, RuntimeStatus::INVALID_VALUE);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn test_size_wider_than_usize() {
        let gw = PinnedMemoryGateway::new(SimulatedRuntime::default());
        let err = gw.allocate(u64::MAX, HostAllocFlags::DEFAULT).unwrap_err();
        assert_eq!(err.status, RuntimeStatus::INVALID_VALUE);
        assert_eq!(gw.runtime().live_allocations(), 0);
    }
}
