//! Virtual machine allocation policies.

use sugars::boxed;

use crate::core::common::{AllocationVerdict, HostId};
use crate::core::config::parse_config_value;
use crate::core::error::{CloudSimError, Result};
use crate::core::host::HostPool;
use crate::core::vm::Vm;
use crate::core::vm_allocation_policies::best_fit::BestFit;
use crate::core::vm_allocation_policies::first_fit::FirstFit;
use crate::core::vm_allocation_policies::worst_fit::WorstFit;

/// Trait for implementation of VM allocation policies.
///
/// The policy is defined as a function of VM and current host states, which returns an ID of host selected
/// for VM placement or `None` if there is no suitable host. Hosts are visited in the order they were added.
pub trait VmAllocationPolicy {
    fn name(&self) -> &str;

    fn select_host(&self, vm: &Vm, hosts: &HostPool) -> Option<HostId>;

    /// Selects a host and reserves its resources for the VM.
    fn allocate(&self, vm: &Vm, hosts: &mut HostPool) -> Result<HostId> {
        let host_id = self
            .select_host(vm, hosts)
            .ok_or(CloudSimError::NoSuitableHost { vm_id: vm.id })?;
        let allocated = match hosts.get_mut(&host_id) {
            Some(host) => host.allocate(vm) == AllocationVerdict::Success,
            None => false,
        };
        if allocated {
            Ok(host_id)
        } else {
            Err(CloudSimError::NoSuitableHost { vm_id: vm.id })
        }
    }
}

/// Creates allocation policy by its name, `FirstFit`, `BestFit` or `WorstFit`.
pub fn allocation_policy_resolver(config_str: &str) -> Result<Box<dyn VmAllocationPolicy>> {
    let (policy_name, _) = parse_config_value(config_str);
    match policy_name.as_str() {
        "FirstFit" => Ok(boxed!(FirstFit::new())),
        "BestFit" => Ok(boxed!(BestFit::new())),
        "WorstFit" => Ok(boxed!(WorstFit::new())),
        _ => Err(CloudSimError::InvalidConfiguration(format!(
            "unknown allocation policy: {}",
            config_str
        ))),
    }
}
