//! Host-only pinned-memory runtime for CPU-only builds.
//!
//! Hands out page-aligned host memory from a fixed byte budget, page-locked
//! with the OS (`mlock` / `VirtualLock`) but not registered with any GPU
//! driver. Applies the same checks the CUDA runtime does and reports the same
//! status codes: null, unknown, or already-freed pointers are
//! `INVALID_VALUE`; requests beyond the remaining budget, or that the OS
//! refuses to lock (e.g. `RLIMIT_MEMLOCK`), are `MEMORY_ALLOCATION`.

use std::alloc::{self, Layout};
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use super::HostMemoryRuntime;
use crate::flags::HostAllocFlags;
use crate::status::RuntimeStatus;

/// Alignment of every simulated allocation.
pub const PAGE_SIZE: usize = 4096;

/// Default budget: 1 GiB.
pub const DEFAULT_CAPACITY: usize = 1024 * 1024 * 1024;

#[derive(Debug)]
struct Allocation {
    layout: Layout,
    /// Bytes requested by the caller (0 for zero-size requests).
    size: usize,
}

#[derive(Debug, Default)]
struct PoolState {
    /// Live allocations keyed by base address.
    live: HashMap<usize, Allocation>,

    /// Bytes charged against the budget.
    used: usize,
}

/// Budgeted, page-aligned stand-in for the CUDA host allocator.
#[derive(Debug)]
pub struct SimulatedRuntime {
    /// Total bytes that may be live at once.
    capacity: usize,

    state: Mutex<PoolState>,
}

impl SimulatedRuntime {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(PoolState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Byte budget.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently allocated.
    pub fn used_bytes(&self) -> usize {
        self.lock().used
    }

    /// Number of regions currently allocated.
    pub fn live_allocations(&self) -> usize {
        self.lock().live.len()
    }

    /// Fraction of the budget in use.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.used_bytes() as f64 / self.capacity as f64
    }
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HostMemoryRuntime for SimulatedRuntime {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn host_alloc(&self, size: usize, flags: HostAllocFlags) -> Result<*mut c_void, RuntimeStatus> {
        let mut state = self.lock();
        let remaining = self.capacity - state.used;
        if size > remaining {
            return Err(RuntimeStatus::MEMORY_ALLOCATION);
        }

        // Zero-size requests still get a distinct, releasable address. Whole
        // pages only: locks are per page and must not be shared between blocks.
        let layout = Layout::from_size_align(size.max(1), PAGE_SIZE)
            .map_err(|_| RuntimeStatus::MEMORY_ALLOCATION)?
            .pad_to_align();

        // SAFETY: `layout` has non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(RuntimeStatus::MEMORY_ALLOCATION);
        }

        // Zero-size blocks are never dereferenced, so there is nothing to lock.
        if size > 0 {
            match region::lock(ptr as *const u8, size) {
                // Unlocked explicitly in `host_free` / `drop`.
                Ok(guard) => std::mem::forget(guard),
                Err(e) => {
                    // SAFETY: just allocated with `layout` and never handed out.
                    unsafe { alloc::dealloc(ptr, layout) };
                    debug!(size, error = %e, "Failed to page-lock host allocation");
                    return Err(RuntimeStatus::MEMORY_ALLOCATION);
                }
            }
        }

        state.used += size;
        state.live.insert(ptr as usize, Allocation { layout, size });
        debug!(
            addr = ptr as usize,
            size,
            flags = flags.bits(),
            used = state.used,
            "Simulated host allocation"
        );
        Ok(ptr.cast())
    }

    fn host_free(&self, ptr: *mut c_void) -> Result<(), RuntimeStatus> {
        if ptr.is_null() {
            return Err(RuntimeStatus::INVALID_VALUE);
        }

        let mut state = self.lock();
        let allocation = state
            .live
            .remove(&(ptr as usize))
            .ok_or(RuntimeStatus::INVALID_VALUE)?;
        state.used = state.used.saturating_sub(allocation.size);

        // SAFETY: `ptr` was returned by `alloc_zeroed` with this layout, locked
        // for `size` bytes, and is removed from the live map, so it cannot be
        // freed twice.
        unsafe { unlock_and_dealloc(ptr as usize, &allocation) };
        debug!(addr = ptr as usize, size = allocation.size, "Simulated host free");
        Ok(())
    }
}

impl Drop for SimulatedRuntime {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !state.live.is_empty() {
            warn!(
                regions = state.live.len(),
                bytes = state.used,
                "Simulated runtime torn down with live allocations; reclaiming"
            );
        }
        for (addr, allocation) in state.live.drain() {
            // SAFETY: every live entry was produced by `host_alloc` with its layout.
            unsafe { unlock_and_dealloc(addr, &allocation) };
        }
    }
}

/// Undo `host_alloc` for one block.
///
/// # Safety
///
/// `addr` must be a live block from `host_alloc` described by `allocation`.
unsafe fn unlock_and_dealloc(addr: usize, allocation: &Allocation) {
    if allocation.size > 0 {
        if let Err(e) = region::unlock(addr as *const u8, allocation.size) {
            warn!(addr, size = allocation.size, error = %e, "Failed to unlock host allocation");
        }
    }
    alloc::dealloc(addr as *mut u8, allocation.layout);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_is_page_aligned() {
        let rt = SimulatedRuntime::new(1 << 20);
        let ptr = rt.host_alloc(100, HostAllocFlags::DEFAULT).unwrap();
        assert_eq!(ptr as usize % PAGE_SIZE, 0);
        assert_eq!(rt.used_bytes(), 100);
        rt.host_free(ptr).unwrap();
        assert_eq!(rt.used_bytes(), 0);
    }

    #[test]
    fn test_capacity_exhaustion() {
        let rt = SimulatedRuntime::new(8192);
        let a = rt.host_alloc(4096, HostAllocFlags::DEFAULT).unwrap();
        let b = rt.host_alloc(4096, HostAllocFlags::DEFAULT).unwrap();

        // Full.
        assert_eq!(
            rt.host_alloc(1, HostAllocFlags::DEFAULT),
            Err(RuntimeStatus::MEMORY_ALLOCATION)
        );

        rt.host_free(a).unwrap();
        let c = rt.host_alloc(4096, HostAllocFlags::DEFAULT).unwrap();
        rt.host_free(b).unwrap();
        rt.host_free(c).unwrap();
    }

    #[test]
    fn test_free_unknown_pointer() {
        let rt = SimulatedRuntime::default();
        let mut local = 0u64;
        let bogus = &mut local as *mut u64 as *mut c_void;
        assert_eq!(rt.host_free(bogus), Err(RuntimeStatus::INVALID_VALUE));
        assert_eq!(rt.host_free(std::ptr::null_mut()), Err(RuntimeStatus::INVALID_VALUE));
    }

    #[test]
    fn test_zero_size_gets_distinct_addresses() {
        let rt = SimulatedRuntime::new(0);
        let a = rt.host_alloc(0, HostAllocFlags::DEFAULT).unwrap();
        let b = rt.host_alloc(0, HostAllocFlags::DEFAULT).unwrap();
        assert!(!a.is_null());
        assert_ne!(a, b);
        assert_eq!(rt.used_bytes(), 0);
        rt.host_free(a).unwrap();
        rt.host_free(b).unwrap();
    }

    #[test]
    fn test_utilization() {
        let rt = SimulatedRuntime::new(4096);
        assert_eq!(rt.utilization(), 0.0);
        let ptr = rt.host_alloc(2048, HostAllocFlags::DEFAULT).unwrap();
        assert!((rt.utilization() - 0.5).abs() < 1e-10);
        rt.host_free(ptr).unwrap();
    }

    #[test]
    fn test_drop_reclaims_leaks() {
        let rt = SimulatedRuntime::new(1 << 20);
        rt.host_alloc(4096, HostAllocFlags::DEFAULT).unwrap();
        assert_eq!(rt.live_allocations(), 1);
        drop(rt);
    }
}
