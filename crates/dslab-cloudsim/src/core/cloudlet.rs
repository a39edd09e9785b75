//! Cloudlet (compute task) representation.

use serde::Serialize;
use sugars::boxed;

use crate::core::common::{CloudletId, VmId};
use crate::core::utilization_model::{FullUtilization, UtilizationModel};

/// Cloudlet lifecycle: `Created -> Queued -> Executing -> Finished`, any non-terminal state may move to `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CloudletStatus {
    Created,
    Queued,
    Executing,
    Finished,
    Failed,
}

impl std::fmt::Display for CloudletStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CloudletStatus::Created => write!(f, "created"),
            CloudletStatus::Queued => write!(f, "queued"),
            CloudletStatus::Executing => write!(f, "executing"),
            CloudletStatus::Finished => write!(f, "finished"),
            CloudletStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A compute task with a fixed length in millions of instructions (MI).
#[derive(Clone)]
pub struct Cloudlet {
    pub id: CloudletId,
    length: f64,
    pes: u32,
    file_size: u64,
    output_size: u64,
    cpu_model: Box<dyn UtilizationModel>,
    ram_model: Box<dyn UtilizationModel>,
    bw_model: Box<dyn UtilizationModel>,
    status: CloudletStatus,
    remaining_length: f64,
    vm_id: Option<VmId>,
    submission_time: f64,
    start_time: Option<f64>,
    finish_time: Option<f64>,
}

impl Cloudlet {
    /// Creates cloudlet which fully utilizes all resources.
    pub fn new(id: CloudletId, length: f64, pes: u32) -> Self {
        Self {
            id,
            length,
            pes,
            file_size: 0,
            output_size: 0,
            cpu_model: boxed!(FullUtilization),
            ram_model: boxed!(FullUtilization),
            bw_model: boxed!(FullUtilization),
            status: CloudletStatus::Created,
            remaining_length: length,
            vm_id: None,
            submission_time: 0.,
            start_time: None,
            finish_time: None,
        }
    }

    pub fn with_cpu_model(mut self, model: Box<dyn UtilizationModel>) -> Self {
        self.cpu_model = model;
        self
    }

    pub fn with_ram_model(mut self, model: Box<dyn UtilizationModel>) -> Self {
        self.ram_model = model;
        self
    }

    pub fn with_bw_model(mut self, model: Box<dyn UtilizationModel>) -> Self {
        self.bw_model = model;
        self
    }

    /// Sets input and output file sizes. They are carried as metadata only.
    pub fn with_file_sizes(mut self, file_size: u64, output_size: u64) -> Self {
        self.file_size = file_size;
        self.output_size = output_size;
        self
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn pes(&self) -> u32 {
        self.pes
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn output_size(&self) -> u64 {
        self.output_size
    }

    pub fn status(&self) -> CloudletStatus {
        self.status
    }

    pub fn remaining_length(&self) -> f64 {
        self.remaining_length
    }

    pub fn finished_length(&self) -> f64 {
        self.length - self.remaining_length
    }

    pub fn vm_id(&self) -> Option<VmId> {
        self.vm_id
    }

    pub fn submission_time(&self) -> f64 {
        self.submission_time
    }

    pub fn start_time(&self) -> Option<f64> {
        self.start_time
    }

    pub fn finish_time(&self) -> Option<f64> {
        self.finish_time
    }

    /// Returns true if the cloudlet is finished or failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, CloudletStatus::Finished | CloudletStatus::Failed)
    }

    fn time_from_start(&self, time: f64) -> f64 {
        self.start_time.map_or(0., |start| (time - start).max(0.))
    }

    /// Returns CPU utilization in [0, 1] at the specified time.
    pub fn cpu_utilization(&self, time: f64) -> f64 {
        self.cpu_model.utilization(time, self.time_from_start(time)).clamp(0., 1.)
    }

    /// Returns RAM utilization in [0, 1] at the specified time.
    pub fn ram_utilization(&self, time: f64) -> f64 {
        self.ram_model.utilization(time, self.time_from_start(time)).clamp(0., 1.)
    }

    /// Returns bandwidth utilization in [0, 1] at the specified time.
    pub fn bw_utilization(&self, time: f64) -> f64 {
        self.bw_model.utilization(time, self.time_from_start(time)).clamp(0., 1.)
    }

    pub(crate) fn enqueue(&mut self, vm_id: VmId, time: f64) {
        self.vm_id = Some(vm_id);
        self.submission_time = time;
        self.status = CloudletStatus::Queued;
    }

    pub(crate) fn start(&mut self, time: f64) {
        self.start_time = Some(time);
        self.status = CloudletStatus::Executing;
    }

    pub(crate) fn advance(&mut self, length: f64) {
        self.remaining_length = (self.remaining_length - length).max(0.);
    }

    pub(crate) fn finish(&mut self, time: f64) {
        self.remaining_length = 0.;
        self.finish_time = Some(time);
        self.status = CloudletStatus::Finished;
    }

    pub(crate) fn fail(&mut self) {
        self.status = CloudletStatus::Failed;
    }
}
