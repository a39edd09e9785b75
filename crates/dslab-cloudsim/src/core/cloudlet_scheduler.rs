//! Cloudlet scheduling within a VM.

use dyn_clone::{clone_trait_object, DynClone};
use serde::Serialize;
use sugars::boxed;

use dslab_clock::Tick;

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::cloudlet_schedulers::space_shared::SpaceSharedScheduler;
use crate::core::cloudlet_schedulers::time_shared::TimeSharedScheduler;
use crate::core::common::CloudletId;
use crate::core::config::parse_config_value;
use crate::core::error::{CloudSimError, Result};

/// Processing capacity granted to a VM by its host during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VmCapacity {
    /// Number of usable PEs.
    pub pes: u32,
    /// Capacity of each PE in MIPS.
    pub pe_mips: f64,
}

impl VmCapacity {
    pub fn new(pes: u32, pe_mips: f64) -> Self {
        Self { pes, pe_mips }
    }

    /// Capacity of a VM which is not running (not placed or placed on a failed host).
    pub fn none() -> Self {
        Self { pes: 0, pe_mips: 0. }
    }

    pub fn total_mips(&self) -> f64 {
        self.pes as f64 * self.pe_mips
    }
}

/// Cloudlet scheduler shares VM processing capacity among the cloudlets assigned to the VM.
///
/// The scheduler owns the cloudlets, keeping them in submission order.
pub trait CloudletScheduler: DynClone {
    /// Returns the scheduler name.
    fn name(&self) -> &str;

    /// Returns all cloudlets assigned to the VM.
    fn cloudlets(&self) -> &[Cloudlet];

    fn cloudlets_mut(&mut self) -> &mut Vec<Cloudlet>;

    /// Moves queued cloudlets submitted not later than `time` to execution.
    fn start_queued(&mut self, capacity: &VmCapacity, time: f64);

    /// Advances executing cloudlets over the tick interval, returns the processed length in MI.
    ///
    /// Cloudlets completing inside the interval are finished at the exact completion instant.
    fn process(&mut self, capacity: &VmCapacity, tick: &Tick) -> f64;

    /// Adds cloudlet to the queue.
    fn submit(&mut self, cloudlet: Cloudlet) {
        self.cloudlets_mut().push(cloudlet);
    }

    /// Invoked at each tick: starts the queued cloudlets at the beginning of the tick interval
    /// and then processes the interval. Returns the processed length in MI.
    fn update_processing(&mut self, capacity: &VmCapacity, tick: &Tick) -> f64 {
        if capacity.total_mips() > 0. {
            self.start_queued(capacity, tick.prev_time);
        }
        self.process(capacity, tick)
    }

    /// Returns the number of cloudlets in the specified status.
    fn count(&self, status: CloudletStatus) -> usize {
        self.cloudlets().iter().filter(|c| c.status() == status).count()
    }

    /// Marks all non-terminal cloudlets as failed, returns their ids.
    fn fail_unfinished(&mut self) -> Vec<CloudletId> {
        let mut failed = Vec::new();
        for cloudlet in self.cloudlets_mut().iter_mut().filter(|c| !c.is_terminal()) {
            cloudlet.fail();
            failed.push(cloudlet.id);
        }
        failed
    }
}

clone_trait_object!(CloudletScheduler);

/// Creates cloudlet scheduler by its name, `TimeShared` or `SpaceShared`.
pub fn cloudlet_scheduler_resolver(config_str: &str) -> Result<Box<dyn CloudletScheduler>> {
    let (scheduler_name, _) = parse_config_value(config_str);
    match scheduler_name.as_str() {
        "TimeShared" => Ok(boxed!(TimeSharedScheduler::new())),
        "SpaceShared" => Ok(boxed!(SpaceSharedScheduler::new())),
        _ => Err(CloudSimError::InvalidConfiguration(format!(
            "unknown cloudlet scheduler: {}",
            config_str
        ))),
    }
}
