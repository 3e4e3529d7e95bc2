//! Allocation flags forwarded to the runtime.

use bitflags::bitflags;

bitflags! {
    /// Flags for a pinned host allocation.
    ///
    /// Values mirror `cudaHostAlloc*`. The gateway never interprets them;
    /// unknown bits survive the round trip so the runtime can accept or
    /// reject them itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HostAllocFlags: u32 {
        /// Memory is pinned for all CUDA contexts, not just the current one.
        const PORTABLE = 0x01;
        /// Map the allocation into the device address space.
        const MAPPED = 0x02;
        /// Write-combined memory: fast host writes and PCIe reads, slow host reads.
        const WRITE_COMBINED = 0x04;
    }
}

impl HostAllocFlags {
    /// `cudaHostAllocDefault`.
    pub const DEFAULT: HostAllocFlags = HostAllocFlags::empty();

    /// Build from a raw wire value, keeping bits this crate does not name.
    pub const fn from_raw(bits: u32) -> Self {
        HostAllocFlags::from_bits_retain(bits)
    }
}

impl Default for HostAllocFlags {
    fn default() -> Self {
        HostAllocFlags::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bits_retained() {
        let flags = HostAllocFlags::from_raw(0x80 | 0x02);
        assert_eq!(flags.bits(), 0x82);
        assert!(flags.contains(HostAllocFlags::MAPPED));
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(HostAllocFlags::default().bits(), 0);
    }
}
