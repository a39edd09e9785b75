//! Simulation results.

use serde::Serialize;

use dslab_clock::{log_info, RunOutcome, SimulationContext};

use crate::core::cloudlet::CloudletStatus;
use crate::core::common::{CloudletId, HostId, VmId};
use crate::core::datacenter::Datacenter;
use crate::core::energy_accumulator::EnergySample;
use crate::core::error::Result;

#[derive(Clone, Debug, Serialize)]
pub struct HostReport {
    pub id: HostId,
    pub name: String,
    pub failed: bool,
    pub vms: usize,
    /// Energy consumed by the host in Wh.
    pub energy_consumed: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct CloudletReport {
    pub id: CloudletId,
    pub vm_id: Option<VmId>,
    pub status: CloudletStatus,
    pub stalled: bool,
    pub finished_length: f64,
    pub start_time: Option<f64>,
    pub finish_time: Option<f64>,
}

/// Summary of a simulation run.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub outcome: Option<RunOutcome>,
    pub end_time: f64,
    pub total_energy_wh: f64,
    pub total_energy_kwh: f64,
    pub average_power: f64,
    /// Number of routed cloudlets plus the delayed submissions which have not happened yet.
    pub submitted_cloudlets: usize,
    /// Number of delayed submissions which have not happened before the end of the run.
    pub pending_cloudlets: usize,
    pub finished_cloudlets: usize,
    pub failed_cloudlets: usize,
    pub stalled_cloudlets: usize,
    /// Percentage of finished cloudlets among the submitted ones.
    pub completion_percentage: f64,
    pub unplaced_vms: Vec<VmId>,
    pub hosts: Vec<HostReport>,
    pub cloudlets: Vec<CloudletReport>,
    pub samples: Vec<EnergySample>,
}

impl SimulationReport {
    pub fn new(datacenter: &Datacenter, end_time: f64, outcome: Option<RunOutcome>) -> Self {
        let cloudlets: Vec<CloudletReport> = datacenter
            .cloudlets()
            .map(|c| CloudletReport {
                id: c.id,
                vm_id: c.vm_id(),
                status: c.status(),
                stalled: datacenter.is_stalled(c),
                finished_length: c.finished_length(),
                start_time: c.start_time(),
                finish_time: c.finish_time(),
            })
            .collect();
        let pending_cloudlets = datacenter.pending_cloudlets();
        let submitted_cloudlets = cloudlets.len() + pending_cloudlets;
        let finished_cloudlets = cloudlets.iter().filter(|c| c.status == CloudletStatus::Finished).count();
        let failed_cloudlets = cloudlets.iter().filter(|c| c.status == CloudletStatus::Failed).count();
        let stalled_cloudlets = cloudlets.iter().filter(|c| c.stalled).count();
        let completion_percentage = if submitted_cloudlets > 0 {
            finished_cloudlets as f64 * 100. / submitted_cloudlets as f64
        } else {
            0.
        };
        let hosts = datacenter
            .hosts()
            .values()
            .map(|host| HostReport {
                id: host.id,
                name: host.name().to_string(),
                failed: host.is_failed(),
                vms: host.vms().len(),
                energy_consumed: host.energy_consumed(),
            })
            .collect();
        let energy = datacenter.energy();
        Self {
            outcome,
            end_time,
            total_energy_wh: energy.total_energy(),
            total_energy_kwh: energy.total_energy() / 1000.,
            average_power: energy.average_power(),
            submitted_cloudlets,
            pending_cloudlets,
            finished_cloudlets,
            failed_cloudlets,
            stalled_cloudlets,
            completion_percentage,
            unplaced_vms: datacenter.unplaced_vms(),
            hosts,
            cloudlets,
            samples: energy.samples().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Logs the summary at the info level.
    pub fn log_summary(&self, ctx: &SimulationContext) {
        log_info!(
            ctx,
            "finished at {:.1} sec: energy {:.4} Wh ({:.6} kWh), average power {:.2} W",
            self.end_time,
            self.total_energy_wh,
            self.total_energy_kwh,
            self.average_power
        );
        log_info!(
            ctx,
            "cloudlets: {}/{} finished ({:.1}%), {} failed, {} stalled, {} not submitted yet",
            self.finished_cloudlets,
            self.submitted_cloudlets,
            self.completion_percentage,
            self.failed_cloudlets,
            self.stalled_cloudlets,
            self.pending_cloudlets
        );
    }
}
