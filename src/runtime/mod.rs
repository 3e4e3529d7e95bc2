//! Host-memory runtimes the gateway can sit on.
//!
//! - [`cuda`]: the CUDA runtime's `cudaHostAlloc` / `cudaFreeHost` (feature `cuda`)
//! - [`simulated`]: page-aligned host memory with CUDA-like status codes, for CPU-only builds
//! - [`tracking`]: opt-in decorator that records live allocations

#[cfg(feature = "cuda")]
pub mod cuda;
pub mod simulated;
pub mod tracking;

use std::ffi::c_void;
use std::sync::Arc;

use crate::flags::HostAllocFlags;
use crate::status::RuntimeStatus;

#[cfg(feature = "cuda")]
pub use cuda::CudaRuntime;
pub use simulated::SimulatedRuntime;
pub use tracking::TrackingRuntime;

/// The runtime compiled in as this build's default: CUDA with the `cuda`
/// feature, otherwise the host-only runtime.
pub fn default_runtime() -> Box<dyn HostMemoryRuntime> {
    #[cfg(feature = "cuda")]
    {
        Box::new(CudaRuntime::new())
    }

    #[cfg(not(feature = "cuda"))]
    {
        Box::new(SimulatedRuntime::default())
    }
}

/// A vendor API that hands out and takes back page-locked host memory.
///
/// Implementations report failures as the vendor's raw status. They are
/// expected to be safe to call concurrently for distinct regions; callers
/// own the rule that a region is freed exactly once.
pub trait HostMemoryRuntime: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Allocate `size` contiguous page-locked bytes.
    fn host_alloc(&self, size: usize, flags: HostAllocFlags) -> Result<*mut c_void, RuntimeStatus>;

    /// Free a region previously returned by [`host_alloc`](Self::host_alloc).
    fn host_free(&self, ptr: *mut c_void) -> Result<(), RuntimeStatus>;
}

impl<R: HostMemoryRuntime + ?Sized> HostMemoryRuntime for Box<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn host_alloc(&self, size: usize, flags: HostAllocFlags) -> Result<*mut c_void, RuntimeStatus> {
        (**self).host_alloc(size, flags)
    }

    fn host_free(&self, ptr: *mut c_void) -> Result<(), RuntimeStatus> {
        (**self).host_free(ptr)
    }
}

impl<R: HostMemoryRuntime + ?Sized> HostMemoryRuntime for Arc<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn host_alloc(&self, size: usize, flags: HostAllocFlags) -> Result<*mut c_void, RuntimeStatus> {
        (**self).host_alloc(size, flags)
    }

    fn host_free(&self, ptr: *mut c_void) -> Result<(), RuntimeStatus> {
        (**self).host_free(ptr)
    }
}
