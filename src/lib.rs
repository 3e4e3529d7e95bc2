//! pinned-host-mem: pinned (page-locked) host memory for GPU runtimes.
//!
//! A thin gateway over the GPU vendor's host allocator: allocate a
//! page-locked region and get its address back as an integer handle, or
//! release a handle. Runtime failures come back as [`AllocationError`] /
//! [`ReleaseError`] carrying the runtime's raw status.
//!
//! - [`gateway`]: the two operations
//! - [`region`]: RAII ownership of a single region
//! - [`runtime`]: CUDA, simulated, and tracking backends
//! - [`ffi`]: C ABI over a process-wide gateway
//! - [`config`]: backend selection and the probe CLI

pub mod config;
pub mod error;
pub mod ffi;
pub mod flags;
pub mod gateway;
pub mod handle;
pub mod region;
pub mod runtime;
pub mod status;

pub use error::{AllocationError, GatewayError, ReleaseError};
pub use flags::HostAllocFlags;
pub use gateway::PinnedMemoryGateway;
pub use handle::PinnedHandle;
pub use region::PinnedRegion;
pub use runtime::HostMemoryRuntime;
pub use status::RuntimeStatus;
