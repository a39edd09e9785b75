//! Time-shared cloudlet scheduler.

use dslab_clock::{Tick, EPSILON};

use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::cloudlet_scheduler::{CloudletScheduler, VmCapacity};

/// Shares the total VM capacity equally among all executing cloudlets.
///
/// A cloudlet never gets more than the capacity of the PEs it requires, the capacity left by such cloudlets
/// is split equally among the others. Each cloudlet progresses at its share times its CPU utilization.
/// When a cloudlet finishes inside a tick, the remaining cloudlets immediately get its share
/// for the rest of the tick.
#[derive(Clone, Default)]
pub struct TimeSharedScheduler {
    cloudlets: Vec<Cloudlet>,
}

impl TimeSharedScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CloudletScheduler for TimeSharedScheduler {
    fn name(&self) -> &str {
        "TimeShared"
    }

    fn cloudlets(&self) -> &[Cloudlet] {
        &self.cloudlets
    }

    fn cloudlets_mut(&mut self) -> &mut Vec<Cloudlet> {
        &mut self.cloudlets
    }

    fn start_queued(&mut self, _capacity: &VmCapacity, time: f64) {
        for cloudlet in self.cloudlets.iter_mut() {
            if cloudlet.status() == CloudletStatus::Queued && cloudlet.submission_time() <= time + EPSILON {
                cloudlet.start(time);
            }
        }
    }

    fn process(&mut self, capacity: &VmCapacity, tick: &Tick) -> f64 {
        let total_mips = capacity.total_mips();
        let duration = tick.duration();
        let mut elapsed = 0.;
        let mut processed = 0.;

        while total_mips > 0. && duration - elapsed > EPSILON {
            let active: Vec<usize> = (0..self.cloudlets.len())
                .filter(|&i| self.cloudlets[i].status() == CloudletStatus::Executing)
                .collect();
            if active.is_empty() {
                break;
            }
            let limits: Vec<f64> = active
                .iter()
                .map(|&i| self.cloudlets[i].pes().min(capacity.pes) as f64 * capacity.pe_mips)
                .collect();
            let rates: Vec<f64> = active
                .iter()
                .zip(fair_shares(&limits, total_mips))
                .map(|(&i, share)| share * self.cloudlets[i].cpu_utilization(tick.prev_time))
                .collect();

            // the sub-step lasts until the earliest completion or the end of the tick
            let step = active
                .iter()
                .zip(rates.iter())
                .filter(|&(_, &rate)| rate > 0.)
                .map(|(&i, &rate)| self.cloudlets[i].remaining_length() / rate)
                .fold(duration - elapsed, f64::min);

            for (&i, &rate) in active.iter().zip(rates.iter()) {
                if rate <= 0. {
                    continue;
                }
                let cloudlet = &mut self.cloudlets[i];
                let time_to_finish = cloudlet.remaining_length() / rate;
                if time_to_finish <= step + EPSILON {
                    processed += cloudlet.remaining_length();
                    let finish_time = (tick.prev_time + elapsed + time_to_finish).min(tick.time);
                    cloudlet.finish(finish_time);
                } else {
                    processed += rate * step;
                    cloudlet.advance(rate * step);
                }
            }
            elapsed += step;
        }
        processed
    }
}

/// Splits `total` equally among consumers, none of which gets more than its limit.
///
/// The capacity not taken by the limited consumers is shared among the rest.
fn fair_shares(limits: &[f64], total: f64) -> Vec<f64> {
    let mut order: Vec<usize> = (0..limits.len()).collect();
    order.sort_by(|&a, &b| limits[a].total_cmp(&limits[b]).then(a.cmp(&b)));
    let mut shares = vec![0.; limits.len()];
    let mut left = total;
    for (pos, &i) in order.iter().enumerate() {
        let share = (left / (limits.len() - pos) as f64).min(limits[i]);
        shares[i] = share;
        left -= share;
    }
    shares
}
