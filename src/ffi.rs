//! C ABI for host runtimes.
//!
//! Exposes the gateway as two calls on raw integers, backed by one
//! process-wide gateway:
//!
//! ```c
//! int32_t pinned_alloc(uint64_t size, uint32_t flags, uint64_t *addr_out);
//! int32_t pinned_free(uint64_t addr);
//! ```
//!
//! `0` is success. A positive value is the runtime's own status code. Negative
//! values are boundary failures from [`FfiStatus`]. The text of the most
//! recent failure on the calling thread is available from
//! [`pinned_last_error_message`].

use std::cell::RefCell;
use std::ffi::{c_char, CStr};
use std::path::Path;
use std::sync::OnceLock;

use crate::config::Config;
use crate::error::{AllocationError, GatewayError, ReleaseError};
use crate::flags::HostAllocFlags;
use crate::gateway::PinnedMemoryGateway;
use crate::handle::PinnedHandle;
use crate::runtime::{default_runtime, HostMemoryRuntime};

/// Gateway type shared across the boundary.
pub type DynGateway = PinnedMemoryGateway<Box<dyn HostMemoryRuntime>>;

/// Boundary status codes. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FfiStatus {
    /// Success.
    Ok = 0,
    /// A pointer argument is null or a string is not valid UTF-8.
    InvalidArgument = -1,
    /// The default gateway was already initialized.
    AlreadyInitialized = -2,
    /// The configuration file is missing, unreadable, or malformed.
    ConfigError = -3,
    /// The configured backend is not compiled into this library.
    BackendUnavailable = -4,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&GatewayError> for FfiStatus {
    fn from(e: &GatewayError) -> Self {
        match e {
            GatewayError::AlreadyInitialized => FfiStatus::AlreadyInitialized,
            GatewayError::Config(_) => FfiStatus::ConfigError,
            GatewayError::BackendUnavailable(_) => FfiStatus::BackendUnavailable,
            GatewayError::Allocation(_) | GatewayError::Release(_) => FfiStatus::InvalidArgument,
        }
    }
}

static GATEWAY: OnceLock<DynGateway> = OnceLock::new();

thread_local! {
    static LAST_ERROR: RefCell<String> = const { RefCell::new(String::new()) };
}

fn set_last_error(msg: impl ToString) {
    LAST_ERROR.with(|e| *e.borrow_mut() = msg.to_string());
}

macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(status) => status,
            Err(_) => {
                set_last_error("panic caught at FFI boundary");
                FfiStatus::Panicked as i32
            }
        }
    };
}

/// The process-wide gateway, backed by [`default_runtime`] unless
/// [`init_default_gateway`] ran first.
pub fn default_gateway() -> &'static DynGateway {
    GATEWAY.get_or_init(|| PinnedMemoryGateway::new(default_runtime()))
}

/// Install the process-wide gateway. Fails once any gateway is in place,
/// including one created lazily by a prior allocation.
pub fn init_default_gateway(runtime: Box<dyn HostMemoryRuntime>) -> Result<(), GatewayError> {
    GATEWAY
        .set(PinnedMemoryGateway::new(runtime))
        .map_err(|_| GatewayError::AlreadyInitialized)
}

/// Allocate through the default gateway and return the raw address.
pub fn alloc_pinned_ptr(size: u64, flags: u32) -> Result<u64, AllocationError> {
    default_gateway()
        .allocate(size, HostAllocFlags::from_raw(flags))
        .map(PinnedHandle::as_raw)
}

/// Release a raw address through the default gateway.
pub fn free_pinned_ptr(addr: u64) -> Result<(), ReleaseError> {
    default_gateway().release(PinnedHandle::from_raw(addr))
}

/// Initialize the default gateway from a JSON config file.
///
/// Must be called before the first `pinned_alloc` / `pinned_free`.
#[no_mangle]
pub extern "C" fn pinned_init_from_config(path: *const c_char) -> i32 {
    ffi_guard!({
        if path.is_null() {
            set_last_error("path is null");
            return FfiStatus::InvalidArgument as i32;
        }
        // SAFETY: caller passes a NUL-terminated string.
        let path = match unsafe { CStr::from_ptr(path) }.to_str() {
            Ok(p) => p,
            Err(e) => {
                set_last_error(e);
                return FfiStatus::InvalidArgument as i32;
            }
        };

        let result = Config::load_strict(Path::new(path))
            .and_then(|config| config.runtime.build())
            .and_then(init_default_gateway);
        match result {
            Ok(()) => FfiStatus::Ok as i32,
            Err(e) => {
                set_last_error(&e);
                FfiStatus::from(&e) as i32
            }
        }
    })
}

/// Allocate `size` bytes of pinned host memory; the address is written to `addr_out`.
#[no_mangle]
pub extern "C" fn pinned_alloc(size: u64, flags: u32, addr_out: *mut u64) -> i32 {
    ffi_guard!({
        if addr_out.is_null() {
            set_last_error("addr_out is null");
            return FfiStatus::InvalidArgument as i32;
        }
        match alloc_pinned_ptr(size, flags) {
            Ok(addr) => {
                // SAFETY: checked non-null; caller provides a writable u64.
                unsafe { *addr_out = addr };
                FfiStatus::Ok as i32
            }
            Err(e) => {
                set_last_error(e);
                e.status.code()
            }
        }
    })
}

/// Free a region returned by [`pinned_alloc`].
#[no_mangle]
pub extern "C" fn pinned_free(addr: u64) -> i32 {
    ffi_guard!({
        match free_pinned_ptr(addr) {
            Ok(()) => FfiStatus::Ok as i32,
            Err(e) => {
                set_last_error(e);
                e.status.code()
            }
        }
    })
}

/// Copy the calling thread's last error message into `buf` (NUL-terminated,
/// truncated to `cap - 1` bytes). Returns the full message length in bytes.
/// `buf` may be null to query the length.
#[no_mangle]
pub extern "C" fn pinned_last_error_message(buf: *mut c_char, cap: usize) -> usize {
    LAST_ERROR.with(|e| {
        let msg = e.borrow();
        if !buf.is_null() && cap > 0 {
            let n = msg.len().min(cap - 1);
            // SAFETY: caller provides `cap` writable bytes at `buf`.
            unsafe {
                std::ptr::copy_nonoverlapping(msg.as_ptr(), buf.cast::<u8>(), n);
                *buf.add(n) = 0;
            }
        }
        msg.len()
    })
}
