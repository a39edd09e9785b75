//! Common data structures.

use serde::Serialize;

/// Identifier of a host.
pub type HostId = u32;
/// Identifier of a VM.
pub type VmId = u32;
/// Identifier of a cloudlet.
pub type CloudletId = u32;

/// Result of checking whether a VM fits on a host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AllocationVerdict {
    Success,
    HostFailed,
    NotEnoughPes,
    NotEnoughRam,
    NotEnoughBw,
    NotEnoughStorage,
}

impl std::fmt::Display for AllocationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AllocationVerdict::Success => write!(f, "success"),
            AllocationVerdict::HostFailed => write!(f, "host_failed"),
            AllocationVerdict::NotEnoughPes => write!(f, "not_enough_pes"),
            AllocationVerdict::NotEnoughRam => write!(f, "not_enough_ram"),
            AllocationVerdict::NotEnoughBw => write!(f, "not_enough_bw"),
            AllocationVerdict::NotEnoughStorage => write!(f, "not_enough_storage"),
        }
    }
}
