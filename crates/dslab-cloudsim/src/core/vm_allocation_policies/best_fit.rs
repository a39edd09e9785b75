//! Best Fit policy.

use crate::core::common::{AllocationVerdict, HostId};
use crate::core::host::HostPool;
use crate::core::vm::Vm;
use crate::core::vm_allocation_policy::VmAllocationPolicy;

/// Uses the suitable host with the fewest free PEs, ties are broken by the host order.
#[derive(Default)]
pub struct BestFit;

impl BestFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmAllocationPolicy for BestFit {
    fn name(&self) -> &str {
        "BestFit"
    }

    fn select_host(&self, vm: &Vm, hosts: &HostPool) -> Option<HostId> {
        let mut result: Option<HostId> = None;
        let mut min_free_pes = u32::MAX;

        for host in hosts.values() {
            if host.can_allocate(vm) == AllocationVerdict::Success && host.free_pes() < min_free_pes {
                min_free_pes = host.free_pes();
                result = Some(host.id);
            }
        }
        result
    }
}
