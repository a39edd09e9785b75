//! First Fit policy.

use crate::core::common::{AllocationVerdict, HostId};
use crate::core::host::HostPool;
use crate::core::vm::Vm;
use crate::core::vm_allocation_policy::VmAllocationPolicy;

/// Uses the first suitable host.
#[derive(Default)]
pub struct FirstFit;

impl FirstFit {
    pub fn new() -> Self {
        Self {}
    }
}

impl VmAllocationPolicy for FirstFit {
    fn name(&self) -> &str {
        "FirstFit"
    }

    fn select_host(&self, vm: &Vm, hosts: &HostPool) -> Option<HostId> {
        hosts
            .values()
            .find(|host| host.can_allocate(vm) == AllocationVerdict::Success)
            .map(|host| host.id)
    }
}
