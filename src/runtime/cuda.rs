//! CUDA runtime backend.
//!
//! Calls `cudaHostAlloc` / `cudaFreeHost` through `cudarc`'s runtime bindings.
//! Both calls block until the driver returns; nothing is retried.

use std::ffi::c_void;

use cudarc::runtime::sys;

use super::HostMemoryRuntime;
use crate::flags::HostAllocFlags;
use crate::status::RuntimeStatus;

/// The process's CUDA runtime, on whatever device is current.
#[derive(Debug, Default, Clone, Copy)]
pub struct CudaRuntime;

impl CudaRuntime {
    pub fn new() -> Self {
        CudaRuntime
    }
}

fn check(err: sys::cudaError_t) -> Result<(), RuntimeStatus> {
    if err == sys::cudaError_t::cudaSuccess {
        Ok(())
    } else {
        Err(RuntimeStatus::from_raw(err as i32))
    }
}

impl HostMemoryRuntime for CudaRuntime {
    fn name(&self) -> &'static str {
        "cuda"
    }

    fn host_alloc(&self, size: usize, flags: HostAllocFlags) -> Result<*mut c_void, RuntimeStatus> {
        let mut ptr: *mut c_void = std::ptr::null_mut();
        // SAFETY: `ptr` is a valid out-parameter; the runtime writes it only on success.
        let err = unsafe { sys::cudaHostAlloc(&mut ptr, size, flags.bits()) };
        check(err).map(|()| ptr)
    }

    fn host_free(&self, ptr: *mut c_void) -> Result<(), RuntimeStatus> {
        // SAFETY: the runtime validates the pointer and reports an error for
        // anything it did not allocate; pointers it did allocate are the
        // caller's to free exactly once.
        let err = unsafe { sys::cudaFreeHost(ptr) };
        check(err)
    }
}
