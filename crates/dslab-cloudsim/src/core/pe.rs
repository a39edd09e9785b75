//! Processing element (a single CPU core of a host).

use serde::Serialize;

use crate::core::common::VmId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PeStatus {
    Working,
    Failed,
}

/// A processing element with fixed capacity in MIPS.
///
/// A PE is either free or reserved by exactly one VM.
#[derive(Clone, Debug, Serialize)]
pub struct ProcessingElement {
    id: u32,
    capacity_mips: f64,
    status: PeStatus,
    vm_id: Option<VmId>,
}

impl ProcessingElement {
    pub fn new(id: u32, capacity_mips: f64) -> Self {
        Self {
            id,
            capacity_mips,
            status: PeStatus::Working,
            vm_id: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn capacity_mips(&self) -> f64 {
        self.capacity_mips
    }

    pub fn status(&self) -> PeStatus {
        self.status
    }

    /// Returns the VM this PE is reserved by.
    pub fn vm_id(&self) -> Option<VmId> {
        self.vm_id
    }

    pub fn is_free(&self) -> bool {
        self.vm_id.is_none()
    }

    pub(crate) fn reserve(&mut self, vm_id: VmId) {
        self.vm_id = Some(vm_id);
    }

    pub(crate) fn release(&mut self) {
        self.vm_id = None;
    }

    pub(crate) fn fail(&mut self) {
        self.status = PeStatus::Failed;
    }
}
