//! Error types surfaced by the gateway.

use thiserror::Error;

use crate::status::RuntimeStatus;

/// The runtime rejected an allocation request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cudaHostAlloc failed: {status}")]
pub struct AllocationError {
    pub status: RuntimeStatus,
}

/// The runtime rejected a release request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cudaFreeHost failed: {status}")]
pub struct ReleaseError {
    pub status: RuntimeStatus,
}

impl AllocationError {
    pub fn new(status: RuntimeStatus) -> Self {
        Self { status }
    }
}

impl ReleaseError {
    pub fn new(status: RuntimeStatus) -> Self {
        Self { status }
    }
}

/// Any failure from this crate, for callers that don't care which side failed.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Release(#[from] ReleaseError),

    #[error("Runtime backend {0:?} is not available in this build")]
    BackendUnavailable(String),

    #[error("Default gateway already initialized")]
    AlreadyInitialized,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Raw runtime status, if the failure came from the runtime.
    pub fn status(&self) -> Option<RuntimeStatus> {
        match self {
            GatewayError::Allocation(e) => Some(e.status),
            GatewayError::Release(e) => Some(e.status),
            GatewayError::BackendUnavailable(_)
            | GatewayError::AlreadyInitialized
            | GatewayError::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_embed_status() {
        let err = AllocationError::new(RuntimeStatus::MEMORY_ALLOCATION);
        assert_eq!(err.to_string(), "cudaHostAlloc failed: 2");

        let err = ReleaseError::new(RuntimeStatus::INVALID_VALUE);
        assert_eq!(err.to_string(), "cudaFreeHost failed: 1");
    }

    #[test]
    fn test_gateway_error_status() {
        let err: GatewayError = ReleaseError::new(RuntimeStatus::from_raw(17)).into();
        assert_eq!(err.status(), Some(RuntimeStatus::from_raw(17)));
        assert_eq!(err.to_string(), "cudaFreeHost failed: 17");
    }
}
