//! Errors returned by the simulation.

use thiserror::Error;

use crate::core::common::{CloudletId, HostId, VmId};

#[derive(Debug, Error)]
pub enum CloudSimError {
    #[error("no suitable host for vm #{vm_id}")]
    NoSuitableHost { vm_id: VmId },
    #[error("no candidate vm for cloudlet #{cloudlet_id}")]
    NoCandidateVm { cloudlet_id: CloudletId },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unknown host #{0}")]
    UnknownHost(HostId),
    #[error("unknown vm #{0}")]
    UnknownVm(VmId),
    #[error("can't read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("can't parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("can't serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudSimError>;
