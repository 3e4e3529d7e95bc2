//! Tests against a real CUDA device. Run with `--features cuda -- --ignored`.

#![cfg(feature = "cuda")]

use pinned_host_mem::runtime::CudaRuntime;
use pinned_host_mem::{HostAllocFlags, PinnedHandle, PinnedMemoryGateway};

#[test]
#[ignore = "requires a CUDA device"]
fn test_cuda_allocate_4096_then_release() {
    let gw = PinnedMemoryGateway::new(CudaRuntime::new());
    let addr = gw.allocate(4096, HostAllocFlags::DEFAULT).unwrap();
    assert!(!addr.is_null());
    gw.release(addr).unwrap();
}

#[test]
#[ignore = "requires a CUDA device"]
fn test_cuda_region_is_writable() {
    let gw = PinnedMemoryGateway::new(CudaRuntime::new());
    let mut region = gw
        .allocate_region(1 << 20, HostAllocFlags::PORTABLE)
        .unwrap();
    region.as_bytes_mut().fill(0xab);
    assert!(region.as_bytes().iter().all(|&b| b == 0xab));
    region.release().unwrap();
}

#[test]
#[ignore = "requires a CUDA device"]
fn test_cuda_oversized_allocation_fails() {
    let gw = PinnedMemoryGateway::new(CudaRuntime::new());
    let err = gw.allocate(1 << 50, HostAllocFlags::DEFAULT).unwrap_err();
    assert_ne!(err.status.code(), 0);
}

#[test]
#[ignore = "requires a CUDA device"]
fn test_cuda_release_unknown_handle_fails() {
    let gw = PinnedMemoryGateway::new(CudaRuntime::new());
    let mut local = 0u64;
    let bogus = PinnedHandle::from_ptr(&mut local as *mut u64 as *mut std::ffi::c_void);
    assert!(gw.release(bogus).is_err());
}
