//! Host failure injection.

use serde::{Deserialize, Serialize};

use dslab_clock::{log_error, ActionId, SimulationClock};

use crate::core::common::HostId;
use crate::core::datacenter::Datacenter;

/// What happens to the cloudlets of a failed host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostFailurePolicy {
    /// Cloudlets keep their status and progress but make no further progress.
    #[default]
    Freeze,
    /// Unfinished cloudlets are marked as failed.
    Fail,
}

/// Host failure scheduled at the specified time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostFailure {
    pub time: f64,
    pub host: HostId,
}

/// Schedules a one-shot action which fails the host.
pub fn schedule_host_failure(clock: &mut SimulationClock<Datacenter>, failure: HostFailure) -> ActionId {
    clock.schedule_once(
        failure.time,
        format!("host-failure-{}", failure.host),
        move |datacenter: &mut Datacenter, _tick| {
            if let Err(e) = datacenter.fail_host(failure.host) {
                log_error!(datacenter.context(), "can't inject failure: {}", e);
            }
        },
    )
}
