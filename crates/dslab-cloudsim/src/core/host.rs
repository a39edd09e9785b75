//! Physical host.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use dslab_clock::{log_debug, log_warn, SimulationContext};

use crate::core::cloudlet_scheduler::VmCapacity;
use crate::core::common::{AllocationVerdict, HostId, VmId};
use crate::core::energy_meter::EnergyMeter;
use crate::core::pe::ProcessingElement;
use crate::core::power_model::PowerModel;
use crate::core::vm::Vm;

/// Hosts of a datacenter in the order they were added.
pub type HostPool = IndexMap<HostId, Host>;

/// Physical host with a list of PEs, RAM, bandwidth and storage capacity.
///
/// Allocated amounts never exceed the capacities. Each PE is reserved by at most one VM.
pub struct Host {
    pub id: HostId,
    pes: Vec<ProcessingElement>,

    ram_capacity: u64,
    bw_capacity: u64,
    storage_capacity: u64,

    ram_allocated: u64,
    bw_allocated: u64,
    storage_allocated: u64,

    vms: BTreeSet<VmId>,
    power_model: Box<dyn PowerModel>,
    failed: bool,
    mips_in_use: f64,
    energy_meter: EnergyMeter,

    ctx: SimulationContext,
}

impl Host {
    /// Creates host with PEs of the specified capacities (in MIPS).
    pub fn new(
        id: HostId,
        pe_mips: &[f64],
        ram: u64,
        bw: u64,
        storage: u64,
        power_model: Box<dyn PowerModel>,
        ctx: SimulationContext,
    ) -> Self {
        let pes = pe_mips
            .iter()
            .enumerate()
            .map(|(i, &mips)| ProcessingElement::new(i as u32, mips))
            .collect();
        Self {
            id,
            pes,
            ram_capacity: ram,
            bw_capacity: bw,
            storage_capacity: storage,
            ram_allocated: 0,
            bw_allocated: 0,
            storage_allocated: 0,
            vms: BTreeSet::new(),
            power_model,
            failed: false,
            mips_in_use: 0.,
            energy_meter: EnergyMeter::new(ctx.time()),
            ctx,
        }
    }

    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn pes(&self) -> &[ProcessingElement] {
        &self.pes
    }

    pub fn pe_count(&self) -> u32 {
        self.pes.len() as u32
    }

    pub fn free_pes(&self) -> u32 {
        self.pes.iter().filter(|pe| pe.is_free()).count() as u32
    }

    pub fn allocated_pes(&self) -> u32 {
        self.pe_count() - self.free_pes()
    }

    /// Returns the total capacity of all PEs in MIPS.
    pub fn total_mips(&self) -> f64 {
        self.pes.iter().map(|pe| pe.capacity_mips()).sum()
    }

    pub fn ram_capacity(&self) -> u64 {
        self.ram_capacity
    }

    pub fn ram_allocated(&self) -> u64 {
        self.ram_allocated
    }

    pub fn ram_available(&self) -> u64 {
        self.ram_capacity - self.ram_allocated
    }

    pub fn bw_capacity(&self) -> u64 {
        self.bw_capacity
    }

    pub fn bw_allocated(&self) -> u64 {
        self.bw_allocated
    }

    pub fn bw_available(&self) -> u64 {
        self.bw_capacity - self.bw_allocated
    }

    pub fn storage_capacity(&self) -> u64 {
        self.storage_capacity
    }

    pub fn storage_allocated(&self) -> u64 {
        self.storage_allocated
    }

    pub fn storage_available(&self) -> u64 {
        self.storage_capacity - self.storage_allocated
    }

    /// Returns VMs placed on this host.
    pub fn vms(&self) -> &BTreeSet<VmId> {
        &self.vms
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn power_model(&self) -> &dyn PowerModel {
        self.power_model.as_ref()
    }

    /// Checks if the VM can be placed on this host.
    pub fn can_allocate(&self, vm: &Vm) -> AllocationVerdict {
        if self.failed {
            return AllocationVerdict::HostFailed;
        }
        if self.free_pes() < vm.pes() {
            return AllocationVerdict::NotEnoughPes;
        }
        if self.ram_available() < vm.ram() {
            return AllocationVerdict::NotEnoughRam;
        }
        if self.bw_available() < vm.bw() {
            return AllocationVerdict::NotEnoughBw;
        }
        if self.storage_available() < vm.storage() {
            return AllocationVerdict::NotEnoughStorage;
        }
        AllocationVerdict::Success
    }

    /// Reserves host resources for the VM if it fits.
    ///
    /// The VM gets the free PEs with the lowest indices.
    pub fn allocate(&mut self, vm: &Vm) -> AllocationVerdict {
        if self.vms.contains(&vm.id) {
            return AllocationVerdict::Success;
        }
        let verdict = self.can_allocate(vm);
        if verdict != AllocationVerdict::Success {
            return verdict;
        }
        for pe in self.pes.iter_mut().filter(|pe| pe.is_free()).take(vm.pes() as usize) {
            pe.reserve(vm.id);
        }
        self.ram_allocated += vm.ram();
        self.bw_allocated += vm.bw();
        self.storage_allocated += vm.storage();
        self.vms.insert(vm.id);
        log_debug!(
            self.ctx,
            "allocated vm #{}: {} pes, {} ram, free pes: {}",
            vm.id,
            vm.pes(),
            vm.ram(),
            self.free_pes()
        );
        AllocationVerdict::Success
    }

    /// Reserves host resources for the VM, returns `false` if the VM does not fit.
    pub fn try_allocate(&mut self, vm: &Vm) -> bool {
        self.allocate(vm) == AllocationVerdict::Success
    }

    /// Returns resources reserved by the VM, returns `false` if the VM is not placed on this host.
    pub fn release(&mut self, vm: &Vm) -> bool {
        if !self.vms.remove(&vm.id) {
            return false;
        }
        for pe in self.pes.iter_mut().filter(|pe| pe.vm_id() == Some(vm.id)) {
            pe.release();
        }
        self.ram_allocated -= vm.ram();
        self.bw_allocated -= vm.bw();
        self.storage_allocated -= vm.storage();
        log_debug!(self.ctx, "released vm #{}", vm.id);
        true
    }

    /// Returns the processing capacity available to the VM placed on this host.
    ///
    /// Each reserved PE provides the VM requested MIPS limited by the PE capacity.
    /// A failed host provides no capacity.
    pub fn vm_capacity(&self, vm: &Vm) -> VmCapacity {
        if self.failed {
            return VmCapacity::none();
        }
        let pe_mips: Vec<f64> = self
            .pes
            .iter()
            .filter(|pe| pe.vm_id() == Some(vm.id))
            .map(|pe| pe.capacity_mips().min(vm.mips()))
            .collect();
        if pe_mips.is_empty() {
            return VmCapacity::none();
        }
        VmCapacity::new(pe_mips.len() as u32, pe_mips.iter().sum::<f64>() / pe_mips.len() as f64)
    }

    /// Returns the MIPS used by the VMs on average during the last tick.
    pub fn mips_in_use(&self) -> f64 {
        self.mips_in_use
    }

    /// Returns CPU utilization in [0, 1]: used MIPS divided by the total host MIPS.
    pub fn cpu_percent_utilization(&self) -> f64 {
        let total_mips = self.total_mips();
        if self.failed || total_mips <= 0. {
            return 0.;
        }
        (self.mips_in_use / total_mips).clamp(0., 1.)
    }

    /// Returns current power consumption in W.
    pub fn power(&self) -> f64 {
        self.power_model.power(self.cpu_percent_utilization())
    }

    /// Returns energy consumed by this host in Wh.
    pub fn energy_consumed(&self) -> f64 {
        self.energy_meter.energy_consumed()
    }

    pub(crate) fn set_mips_in_use(&mut self, mips: f64) {
        self.mips_in_use = mips;
    }

    pub(crate) fn update_energy(&mut self, time: f64, power: f64) {
        self.energy_meter.update(time, power);
    }

    /// Marks the host and all its PEs as failed, returns `false` if the host is already failed.
    pub(crate) fn fail(&mut self) -> bool {
        if self.failed {
            return false;
        }
        self.failed = true;
        self.mips_in_use = 0.;
        for pe in self.pes.iter_mut() {
            pe.fail();
        }
        log_warn!(self.ctx, "host failed, affected vms: {:?}", self.vms);
        true
    }
}
