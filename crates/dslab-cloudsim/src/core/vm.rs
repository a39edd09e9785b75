//! Virtual machine.

use dslab_clock::Tick;

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::cloudlet_scheduler::{CloudletScheduler, VmCapacity};
use crate::core::common::{CloudletId, HostId, VmId};

/// Virtual machine with requested per-PE capacity and resources.
///
/// VM is placed on at most one host for the whole simulation and owns the scheduler
/// which executes the cloudlets assigned to the VM.
#[derive(Clone)]
pub struct Vm {
    pub id: VmId,
    mips: f64,
    pes: u32,
    ram: u64,
    bw: u64,
    storage: u64,
    host_id: Option<HostId>,
    scheduler: Box<dyn CloudletScheduler>,
    mips_in_use: f64,
}

impl Vm {
    pub fn new(
        id: VmId,
        mips: f64,
        pes: u32,
        ram: u64,
        bw: u64,
        storage: u64,
        scheduler: Box<dyn CloudletScheduler>,
    ) -> Self {
        Self {
            id,
            mips,
            pes,
            ram,
            bw,
            storage,
            host_id: None,
            scheduler,
            mips_in_use: 0.,
        }
    }

    /// Returns the requested capacity of each PE in MIPS.
    pub fn mips(&self) -> f64 {
        self.mips
    }

    pub fn pes(&self) -> u32 {
        self.pes
    }

    pub fn ram(&self) -> u64 {
        self.ram
    }

    pub fn bw(&self) -> u64 {
        self.bw
    }

    pub fn storage(&self) -> u64 {
        self.storage
    }

    pub fn total_mips(&self) -> f64 {
        self.mips * self.pes as f64
    }

    /// Returns the host this VM is placed on.
    pub fn host_id(&self) -> Option<HostId> {
        self.host_id
    }

    pub fn scheduler(&self) -> &dyn CloudletScheduler {
        self.scheduler.as_ref()
    }

    pub fn cloudlets(&self) -> &[Cloudlet] {
        self.scheduler.cloudlets()
    }

    /// Returns the MIPS used on average during the last tick.
    pub fn mips_in_use(&self) -> f64 {
        self.mips_in_use
    }

    fn unfinished_cloudlets(&self) -> impl Iterator<Item = &Cloudlet> {
        self.scheduler
            .cloudlets()
            .iter()
            .filter(|c| matches!(c.status(), CloudletStatus::Queued | CloudletStatus::Executing))
    }

    /// Returns CPU utilization of the VM in [0, 1] based on the demand of its unfinished cloudlets.
    pub fn cpu_percent_utilization(&self, time: f64) -> f64 {
        if self.pes == 0 {
            return 0.;
        }
        let demand: f64 = self
            .unfinished_cloudlets()
            .map(|c| c.cpu_utilization(time) * c.pes().min(self.pes) as f64)
            .sum();
        (demand / self.pes as f64).min(1.)
    }

    /// Returns RAM utilization of the VM in [0, 1] based on the demand of its unfinished cloudlets.
    pub fn ram_percent_utilization(&self, time: f64) -> f64 {
        let demand: f64 = self.unfinished_cloudlets().map(|c| c.ram_utilization(time)).sum();
        demand.min(1.)
    }

    pub(crate) fn set_host(&mut self, host_id: Option<HostId>) {
        self.host_id = host_id;
    }

    pub(crate) fn submit_cloudlet(&mut self, mut cloudlet: Cloudlet, time: f64) {
        cloudlet.enqueue(self.id, time);
        self.scheduler.submit(cloudlet);
    }

    /// Advances cloudlet processing over the tick, returns the cloudlets finished during the tick.
    pub(crate) fn update_processing(&mut self, capacity: &VmCapacity, tick: &Tick) -> Vec<CloudletId> {
        let processed = self.scheduler.update_processing(capacity, tick);
        self.mips_in_use = if tick.duration() > 0. {
            processed / tick.duration()
        } else {
            0.
        };
        self.scheduler
            .cloudlets()
            .iter()
            .filter(|c| c.status() == CloudletStatus::Finished)
            .filter(|c| c.finish_time().map_or(false, |t| t > tick.prev_time))
            .map(|c| c.id)
            .collect()
    }

    pub(crate) fn fail_cloudlets(&mut self) -> Vec<CloudletId> {
        self.mips_in_use = 0.;
        self.scheduler.fail_unfinished()
    }

    pub(crate) fn stop(&mut self) {
        self.mips_in_use = 0.;
    }
}
