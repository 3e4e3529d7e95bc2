//! Opt-in bookkeeping of live allocations.
//!
//! [`TrackingRuntime`] wraps another runtime and records every region it hands
//! out. Releasing an address it has no record of fails with `INVALID_VALUE`
//! before the inner runtime is touched, which turns double-release and
//! foreign-pointer release into reported errors instead of undefined behavior.
//! Regions still live when the tracker is dropped are logged as leaks.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use super::HostMemoryRuntime;
use crate::flags::HostAllocFlags;
use crate::handle::PinnedHandle;
use crate::status::RuntimeStatus;

/// Runtime decorator that tracks live regions and their sizes.
#[derive(Debug)]
pub struct TrackingRuntime<R> {
    inner: R,

    /// Base address → requested size.
    live: Mutex<HashMap<usize, usize>>,
}

impl<R: HostMemoryRuntime> TrackingRuntime<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            live: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, usize>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of regions allocated and not yet released.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// Total bytes in live regions.
    pub fn live_bytes(&self) -> usize {
        self.lock().values().sum()
    }

    /// Size of a live region, if `handle` refers to one.
    pub fn size_of(&self, handle: PinnedHandle) -> Option<usize> {
        self.lock().get(&(handle.as_raw() as usize)).copied()
    }

    /// Handles of all live regions, in address order.
    pub fn live_handles(&self) -> Vec<PinnedHandle> {
        let mut addrs: Vec<usize> = self.lock().keys().copied().collect();
        addrs.sort_unstable();
        addrs
            .into_iter()
            .map(|addr| PinnedHandle::from_raw(addr as u64))
            .collect()
    }
}

impl<R: HostMemoryRuntime> HostMemoryRuntime for TrackingRuntime<R> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn host_alloc(&self, size: usize, flags: HostAllocFlags) -> Result<*mut c_void, RuntimeStatus> {
        let ptr = self.inner.host_alloc(size, flags)?;
        self.lock().insert(ptr as usize, size);
        Ok(ptr)
    }

    fn host_free(&self, ptr: *mut c_void) -> Result<(), RuntimeStatus> {
        // Claim the entry first so two racing releases cannot both reach the runtime.
        let size = self
            .lock()
            .remove(&(ptr as usize))
            .ok_or(RuntimeStatus::INVALID_VALUE)?;

        if let Err(status) = self.inner.host_free(ptr) {
            self.lock().insert(ptr as usize, size);
            return Err(status);
        }
        Ok(())
    }
}

impl<R> Drop for TrackingRuntime<R> {
    fn drop(&mut self) {
        let live = self.live.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        for (addr, size) in live.iter() {
            warn!(handle = %PinnedHandle::from_raw(*addr as u64), size, "Pinned region leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::SimulatedRuntime;

    #[test]
    fn test_tracks_live_regions() {
        let rt = TrackingRuntime::new(SimulatedRuntime::new(1 << 20));
        let a = rt.host_alloc(4096, HostAllocFlags::DEFAULT).unwrap();
        let b = rt.host_alloc(100, HostAllocFlags::PORTABLE).unwrap();

        assert_eq!(rt.live_count(), 2);
        assert_eq!(rt.live_bytes(), 4196);
        assert_eq!(rt.size_of(PinnedHandle::from_ptr(b)), Some(100));

        rt.host_free(a).unwrap();
        assert_eq!(rt.live_handles(), vec![PinnedHandle::from_ptr(b)]);
        rt.host_free(b).unwrap();
        assert_eq!(rt.live_count(), 0);
    }

    #[test]
    fn test_double_free_stops_at_tracker() {
        let rt = TrackingRuntime::new(SimulatedRuntime::new(1 << 20));
        let ptr = rt.host_alloc(64, HostAllocFlags::DEFAULT).unwrap();
        rt.host_free(ptr).unwrap();
        assert_eq!(rt.host_free(ptr), Err(RuntimeStatus::INVALID_VALUE));
        assert_eq!(rt.inner().live_allocations(), 0);
    }

    #[test]
    fn test_failed_alloc_not_tracked() {
        let rt = TrackingRuntime::new(SimulatedRuntime::new(16));
        assert!(rt.host_alloc(32, HostAllocFlags::DEFAULT).is_err());
        assert_eq!(rt.live_count(), 0);
    }
}
