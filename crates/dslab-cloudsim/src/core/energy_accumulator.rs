//! Datacenter energy accounting.

use serde::Serialize;

use dslab_clock::{log_info, SimulationContext, Tick, EPSILON};

use crate::core::host::HostPool;

/// Datacenter power sampled at a tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnergySample {
    pub time: f64,
    /// Total power of non-failed hosts in W.
    pub power: f64,
    pub active_hosts: usize,
}

/// Sums up the power of non-failed hosts at every tick and integrates it over time.
///
/// The power sampled at a tick is attributed to the whole tick interval, so the energy grows by
/// `power * duration / 3600` Wh per tick.
pub struct EnergyAccumulator {
    total_energy: f64,
    samples: Vec<EnergySample>,
    report_period: f64,
    next_report_time: f64,
    ctx: SimulationContext,
}

impl EnergyAccumulator {
    /// Creates accumulator, which logs the datacenter status every `report_period` seconds
    /// (zero disables the status log).
    pub fn new(report_period: f64, ctx: SimulationContext) -> Self {
        Self {
            total_energy: 0.,
            samples: Vec::new(),
            report_period,
            next_report_time: report_period,
            ctx,
        }
    }

    /// Invoked at every tick after the cloudlet processing is updated.
    pub fn on_tick(&mut self, tick: &Tick, hosts: &mut HostPool) -> EnergySample {
        let mut power = 0.;
        let mut active_hosts = 0;
        for host in hosts.values_mut().filter(|host| !host.is_failed()) {
            let host_power = host.power();
            host.update_energy(tick.time, host_power);
            power += host_power;
            active_hosts += 1;
        }
        self.total_energy += power * tick.duration() / 3600.;

        let sample = EnergySample {
            time: tick.time,
            power,
            active_hosts,
        };
        self.samples.push(sample);

        if self.report_period > 0. && tick.time + EPSILON >= self.next_report_time {
            log_info!(
                self.ctx,
                "Time: {:.1} sec | Power: {:.2} W | Active Hosts: {}/{} | Energy: {:.4} Wh",
                tick.time,
                power,
                active_hosts,
                hosts.len(),
                self.total_energy
            );
            while self.next_report_time <= tick.time + EPSILON {
                self.next_report_time += self.report_period;
            }
        }
        sample
    }

    /// Returns the total energy consumed in Wh.
    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    pub fn samples(&self) -> &[EnergySample] {
        &self.samples
    }

    /// Returns the average power in W over the sampled time.
    pub fn average_power(&self) -> f64 {
        match self.samples.last() {
            Some(sample) if sample.time > 0. => self.total_energy * 3600. / sample.time,
            _ => 0.,
        }
    }
}
