//! Space-shared cloudlet scheduler.

use dslab_clock::{Tick, EPSILON};

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::cloudlet_scheduler::{CloudletScheduler, VmCapacity};

/// Runs each cloudlet on dedicated PEs, the cloudlets which do not fit wait in FIFO order.
///
/// A cloudlet requesting more PEs than the VM has uses all VM PEs. Waiting cloudlets are started only
/// at the beginning of a tick.
#[derive(Clone, Default)]
pub struct SpaceSharedScheduler {
    cloudlets: Vec<Cloudlet>,
}

impl SpaceSharedScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CloudletScheduler for SpaceSharedScheduler {
    fn name(&self) -> &str {
        "SpaceShared"
    }

    fn cloudlets(&self) -> &[Cloudlet] {
        &self.cloudlets
    }

    fn cloudlets_mut(&mut self) -> &mut Vec<Cloudlet> {
        &mut self.cloudlets
    }

    fn start_queued(&mut self, capacity: &VmCapacity, time: f64) {
        let mut busy_pes: u32 = self
            .cloudlets
            .iter()
            .filter(|c| c.status() == CloudletStatus::Executing)
            .map(|c| c.pes().min(capacity.pes))
            .sum();
        for cloudlet in self.cloudlets.iter_mut() {
            if cloudlet.status() != CloudletStatus::Queued || cloudlet.submission_time() > time + EPSILON {
                continue;
            }
            let required_pes = cloudlet.pes().min(capacity.pes);
            if busy_pes + required_pes > capacity.pes {
                break;
            }
            busy_pes += required_pes;
            cloudlet.start(time);
        }
    }

    fn process(&mut self, capacity: &VmCapacity, tick: &Tick) -> f64 {
        let duration = tick.duration();
        let mut processed = 0.;
        for cloudlet in self.cloudlets.iter_mut() {
            if cloudlet.status() != CloudletStatus::Executing {
                continue;
            }
            let pes = cloudlet.pes().min(capacity.pes);
            let rate = pes as f64 * capacity.pe_mips * cloudlet.cpu_utilization(tick.prev_time);
            if rate <= 0. {
                continue;
            }
            let time_to_finish = cloudlet.remaining_length() / rate;
            if time_to_finish <= duration + EPSILON {
                processed += cloudlet.remaining_length();
                cloudlet.finish((tick.prev_time + time_to_finish).min(tick.time));
            } else {
                processed += rate * duration;
                cloudlet.advance(rate * duration);
            }
        }
        processed
    }
}
