//! Worst Fit policy.

use crate::core::common::{AllocationVerdict, HostId};
use crate::core::host::HostPool;
use crate::core::vm::Vm;
use crate::core::vm_allocation_policy::VmAllocationPolicy;

/// Uses the suitable host with the most free PEs, ties are broken by the host order.
#[derive(Default)]
pub struct WorstFit;

impl WorstFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmAllocationPolicy for WorstFit {
    fn name(&self) -> &str {
        "WorstFit"
    }

    fn select_host(&self, vm: &Vm, hosts: &HostPool) -> Option<HostId> {
        let mut result: Option<HostId> = None;
        let mut max_free_pes = 0;

        for host in hosts.values() {
            let suitable = host.can_allocate(vm) == AllocationVerdict::Success;
            if suitable && (result.is_none() || host.free_pes() > max_free_pes) {
                max_free_pes = host.free_pes();
                result = Some(host.id);
            }
        }
        result
    }
}
