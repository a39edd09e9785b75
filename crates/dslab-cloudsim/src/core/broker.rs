//! Broker routes submitted cloudlets to VMs.

use indexmap::IndexMap;

use dslab_clock::{log_debug, log_warn, SimulationContext};

use crate::core::cloudlet::Cloudlet;
use crate::core::common::VmId;
use crate::core::error::CloudSimError;
use crate::core::vm::Vm;
use crate::core::vm_selection::VmSelectionPolicy;

/// Broker keeps the list of submitted VMs and selects a VM for each cloudlet using the selection policy.
///
/// Only VMs placed on a host are considered as candidates. If there are none, the cloudlet goes to the default VM,
/// which is the first submitted VM unless set explicitly.
pub struct Broker {
    vm_ids: Vec<VmId>,
    default_vm: Option<VmId>,
    selection: Box<dyn VmSelectionPolicy>,
    ctx: SimulationContext,
}

impl Broker {
    pub fn new(selection: Box<dyn VmSelectionPolicy>, ctx: SimulationContext) -> Self {
        Self {
            vm_ids: Vec::new(),
            default_vm: None,
            selection,
            ctx,
        }
    }

    /// Registers submitted VM.
    pub fn add_vm(&mut self, vm_id: VmId) {
        self.vm_ids.push(vm_id);
        if self.default_vm.is_none() {
            self.default_vm = Some(vm_id);
        }
    }

    pub fn set_default_vm(&mut self, vm_id: VmId) {
        self.default_vm = Some(vm_id);
    }

    pub fn default_vm(&self) -> Option<VmId> {
        self.default_vm
    }

    /// Returns submitted VMs in submission order.
    pub fn vm_ids(&self) -> &[VmId] {
        &self.vm_ids
    }

    pub fn selection_policy(&self) -> &dyn VmSelectionPolicy {
        self.selection.as_ref()
    }

    /// Selects VM for the cloudlet, returns `None` only if no VMs were submitted.
    pub fn select_vm(&mut self, cloudlet: &Cloudlet, vms: &IndexMap<VmId, Vm>) -> Option<VmId> {
        let candidates: Vec<&Vm> = self
            .vm_ids
            .iter()
            .filter_map(|id| vms.get(id))
            .filter(|vm| vm.host_id().is_some())
            .collect();
        match self.selection.select_vm(cloudlet, &candidates, self.ctx.time()) {
            Some(vm_id) => {
                log_debug!(self.ctx, "cloudlet #{} -> vm #{}", cloudlet.id, vm_id);
                Some(vm_id)
            }
            None => {
                let error = CloudSimError::NoCandidateVm {
                    cloudlet_id: cloudlet.id,
                };
                match self.default_vm {
                    Some(vm_id) => log_warn!(self.ctx, "{}, using default vm #{}", error, vm_id),
                    None => log_warn!(self.ctx, "{}, no vms submitted", error),
                }
                self.default_vm
            }
        }
    }
}
