//! Datacenter holds the simulation model state.

use std::collections::HashMap;

use indexmap::IndexMap;

use dslab_clock::{log_debug, log_info, log_warn, SimulationContext, Tick};

use crate::core::broker::Broker;
use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::cloudlet_scheduler::VmCapacity;
use crate::core::common::{CloudletId, HostId, VmId};
use crate::core::energy_accumulator::{EnergyAccumulator, EnergySample};
use crate::core::error::{CloudSimError, Result};
use crate::core::failure_injector::HostFailurePolicy;
use crate::core::host::{Host, HostPool};
use crate::core::vm::Vm;
use crate::core::vm_allocation_policy::VmAllocationPolicy;

/// Contains hosts, VMs with their cloudlets, the broker and the energy accumulator.
///
/// The datacenter is the state passed to the clock listeners and actions.
pub struct Datacenter {
    hosts: HostPool,
    vms: IndexMap<VmId, Vm>,
    cloudlet_vms: HashMap<CloudletId, VmId>,
    pending_cloudlets: usize,
    allocation_policy: Box<dyn VmAllocationPolicy>,
    broker: Broker,
    energy: EnergyAccumulator,
    failure_policy: HostFailurePolicy,
    ctx: SimulationContext,
}

impl Datacenter {
    pub fn new(
        allocation_policy: Box<dyn VmAllocationPolicy>,
        broker: Broker,
        energy: EnergyAccumulator,
        failure_policy: HostFailurePolicy,
        ctx: SimulationContext,
    ) -> Self {
        Self {
            hosts: IndexMap::new(),
            vms: IndexMap::new(),
            cloudlet_vms: HashMap::new(),
            pending_cloudlets: 0,
            allocation_policy,
            broker,
            energy,
            failure_policy,
            ctx,
        }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn add_host(&mut self, host: Host) -> HostId {
        let id = host.id;
        log_debug!(
            self.ctx,
            "added host #{} ({}): {} pes, {} mips",
            id,
            host.name(),
            host.pe_count(),
            host.total_mips()
        );
        self.hosts.insert(id, host);
        id
    }

    /// Places the VM using the allocation policy.
    ///
    /// If there is no suitable host, the VM is kept unplaced and `NoSuitableHost` is returned.
    pub fn submit_vm(&mut self, mut vm: Vm) -> Result<HostId> {
        let vm_id = vm.id;
        if self.vms.contains_key(&vm_id) {
            return Err(CloudSimError::InvalidConfiguration(format!("duplicate vm id {}", vm_id)));
        }
        let result = self.allocation_policy.allocate(&vm, &mut self.hosts);
        match &result {
            Ok(host_id) => {
                vm.set_host(Some(*host_id));
                log_info!(self.ctx, "vm #{} placed on host #{}", vm_id, host_id);
            }
            Err(e) => log_warn!(self.ctx, "{}, vm stays unplaced", e),
        }
        self.vms.insert(vm_id, vm);
        self.broker.add_vm(vm_id);
        result
    }

    /// Routes the cloudlet to a VM selected by the broker, returns the VM id.
    pub fn submit_cloudlet(&mut self, cloudlet: Cloudlet) -> Result<VmId> {
        let cloudlet_id = cloudlet.id;
        if self.cloudlet_vms.contains_key(&cloudlet_id) {
            return Err(CloudSimError::InvalidConfiguration(format!(
                "duplicate cloudlet id {}",
                cloudlet_id
            )));
        }
        let vm_id = self
            .broker
            .select_vm(&cloudlet, &self.vms)
            .ok_or(CloudSimError::NoCandidateVm { cloudlet_id })?;
        let vm = self.vms.get_mut(&vm_id).ok_or(CloudSimError::UnknownVm(vm_id))?;
        vm.submit_cloudlet(cloudlet, self.ctx.time());
        self.cloudlet_vms.insert(cloudlet_id, vm_id);
        Ok(vm_id)
    }

    /// Registers cloudlet which will be submitted later.
    pub(crate) fn add_pending_cloudlet(&mut self) {
        self.pending_cloudlets += 1;
    }

    /// Submits cloudlet previously registered with `add_pending_cloudlet`.
    pub(crate) fn submit_pending_cloudlet(&mut self, cloudlet: Cloudlet) -> Result<VmId> {
        self.pending_cloudlets = self.pending_cloudlets.saturating_sub(1);
        self.submit_cloudlet(cloudlet)
    }

    /// Returns the number of cloudlets scheduled for submission but not submitted yet.
    pub fn pending_cloudlets(&self) -> usize {
        self.pending_cloudlets
    }

    /// Advances cloudlet processing on all VMs and updates host CPU utilization.
    pub fn update_processing(&mut self, tick: &Tick) {
        for vm in self.vms.values_mut() {
            let capacity = match vm.host_id().and_then(|host_id| self.hosts.get(&host_id)) {
                Some(host) => host.vm_capacity(vm),
                None => VmCapacity::none(),
            };
            for cloudlet_id in vm.update_processing(&capacity, tick) {
                log_debug!(self.ctx, "cloudlet #{} finished on vm #{}", cloudlet_id, vm.id);
            }
        }
        for host in self.hosts.values_mut() {
            let mips_in_use = if host.is_failed() {
                0.
            } else {
                host.vms()
                    .iter()
                    .filter_map(|vm_id| self.vms.get(vm_id))
                    .map(|vm| vm.mips_in_use())
                    .sum()
            };
            host.set_mips_in_use(mips_in_use);
        }
    }

    /// Adds the current power of non-failed hosts to the energy total.
    pub fn sample_energy(&mut self, tick: &Tick) -> EnergySample {
        self.energy.on_tick(tick, &mut self.hosts)
    }

    /// Marks the host as failed, and applies the failure policy to the cloudlets of its VMs.
    pub fn fail_host(&mut self, host_id: HostId) -> Result<()> {
        let host = self.hosts.get_mut(&host_id).ok_or(CloudSimError::UnknownHost(host_id))?;
        if !host.fail() {
            log_debug!(self.ctx, "host #{} is already failed", host_id);
            return Ok(());
        }
        let vm_ids: Vec<VmId> = host.vms().iter().copied().collect();
        for vm_id in vm_ids {
            if let Some(vm) = self.vms.get_mut(&vm_id) {
                match self.failure_policy {
                    HostFailurePolicy::Freeze => vm.stop(),
                    HostFailurePolicy::Fail => {
                        let failed = vm.fail_cloudlets();
                        if !failed.is_empty() {
                            log_warn!(self.ctx, "cloudlets {:?} on vm #{} failed", failed, vm_id);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true if there are no pending submissions and every cloudlet is finished, failed or stalled.
    pub fn is_finished(&self) -> bool {
        self.pending_cloudlets == 0 && self.all_cloudlets_done()
    }

    /// Returns true if every cloudlet is finished, failed or stalled.
    ///
    /// A cloudlet is stalled if it can never progress: its VM is unplaced or placed on a failed host.
    pub fn all_cloudlets_done(&self) -> bool {
        self.vms.values().all(|vm| {
            self.vm_is_stalled(vm) || vm.cloudlets().iter().all(|cloudlet| cloudlet.is_terminal())
        })
    }

    fn vm_is_stalled(&self, vm: &Vm) -> bool {
        match vm.host_id() {
            Some(host_id) => self.hosts.get(&host_id).map_or(true, |host| host.is_failed()),
            None => true,
        }
    }

    /// Returns true if the cloudlet can never progress.
    pub fn is_stalled(&self, cloudlet: &Cloudlet) -> bool {
        !cloudlet.is_terminal()
            && cloudlet
                .vm_id()
                .and_then(|vm_id| self.vms.get(&vm_id))
                .map_or(true, |vm| self.vm_is_stalled(vm))
    }

    pub fn hosts(&self) -> &HostPool {
        &self.hosts
    }

    pub fn host(&self, host_id: HostId) -> Option<&Host> {
        self.hosts.get(&host_id)
    }

    pub fn vms(&self) -> &IndexMap<VmId, Vm> {
        &self.vms
    }

    pub fn vm(&self, vm_id: VmId) -> Option<&Vm> {
        self.vms.get(&vm_id)
    }

    /// Returns VMs which could not be placed.
    pub fn unplaced_vms(&self) -> Vec<VmId> {
        self.vms.values().filter(|vm| vm.host_id().is_none()).map(|vm| vm.id).collect()
    }

    pub fn cloudlet(&self, cloudlet_id: CloudletId) -> Option<&Cloudlet> {
        let vm_id = self.cloudlet_vms.get(&cloudlet_id)?;
        self.vms.get(vm_id)?.cloudlets().iter().find(|c| c.id == cloudlet_id)
    }

    /// Returns all submitted cloudlets grouped by VM.
    pub fn cloudlets(&self) -> impl Iterator<Item = &Cloudlet> {
        self.vms.values().flat_map(|vm| vm.cloudlets().iter())
    }

    pub fn cloudlet_count(&self) -> usize {
        self.cloudlet_vms.len()
    }

    pub fn count_cloudlets(&self, status: CloudletStatus) -> usize {
        self.cloudlets().filter(|c| c.status() == status).count()
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut Broker {
        &mut self.broker
    }

    pub fn energy(&self) -> &EnergyAccumulator {
        &self.energy
    }

    pub fn failure_policy(&self) -> HostFailurePolicy {
        self.failure_policy
    }

    pub fn allocation_policy(&self) -> &dyn VmAllocationPolicy {
        self.allocation_policy.as_ref()
    }
}
