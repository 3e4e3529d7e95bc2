//! Raw status codes reported by the host-memory runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A numeric status returned by the underlying GPU runtime.
///
/// The gateway only distinguishes success from failure. The value is carried
/// verbatim into errors so callers can decode it against their runtime's
/// documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeStatus(i32);

impl RuntimeStatus {
    /// `cudaSuccess`.
    pub const SUCCESS: RuntimeStatus = RuntimeStatus(0);

    /// `cudaErrorInvalidValue`: bad size, flags, or pointer.
    pub const INVALID_VALUE: RuntimeStatus = RuntimeStatus(1);

    /// `cudaErrorMemoryAllocation`: out of pinned memory.
    pub const MEMORY_ALLOCATION: RuntimeStatus = RuntimeStatus(2);

    pub const fn from_raw(code: i32) -> Self {
        RuntimeStatus(code)
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RuntimeStatus> for i32 {
    fn from(status: RuntimeStatus) -> Self {
        status.0
    }
}
