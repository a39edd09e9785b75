//! Simulation facade.

use std::rc::Rc;

use sugars::rc;

use dslab_clock::{
    log_error, log_info, log_warn, ActionId, ListenerId, RunOutcome, SimulationClock, SimulationContext, Tick,
};

use crate::core::broker::Broker;
use crate::core::cloudlet::Cloudlet;
use crate::core::cloudlet_scheduler::{cloudlet_scheduler_resolver, CloudletScheduler};
use crate::core::common::{CloudletId, HostId, VmId};
use crate::core::config::{CloudletConfig, SimulationConfig, DEFAULT_POWER_MODEL};
use crate::core::datacenter::Datacenter;
use crate::core::energy_accumulator::EnergyAccumulator;
use crate::core::error::{CloudSimError, Result};
use crate::core::failure_injector::{schedule_host_failure, HostFailure};
use crate::core::host::Host;
use crate::core::power_model::{power_model_resolver, PowerModel};
use crate::core::report::SimulationReport;
use crate::core::utilization_model::utilization_model_from_value;
use crate::core::vm::Vm;
use crate::core::vm_allocation_policy::allocation_policy_resolver;
use crate::core::vm_selection::vm_selection_resolver;
use crate::extensions::random_workload::generate_cloudlets;

/// Owns the clock and the datacenter model.
///
/// At every tick the clock first advances cloudlet processing, then accumulates the energy,
/// then invokes the listeners added with [`add_tick_listener`](Self::add_tick_listener),
/// and finally fires the one-shot actions (host failures, delayed cloudlet submissions) due at the tick.
pub struct CloudSimulation {
    clock: SimulationClock<Datacenter>,
    datacenter: Datacenter,
    scheduler_prototype: Box<dyn CloudletScheduler>,
    next_host_id: HostId,
    next_vm_id: VmId,
    outcome: Option<RunOutcome>,
    ctx: SimulationContext,
    sim_config: Rc<SimulationConfig>,
}

impl CloudSimulation {
    /// Creates simulation with an empty datacenter.
    pub fn new(sim_config: SimulationConfig) -> Result<Self> {
        sim_config.validate()?;
        let mut clock = SimulationClock::new(sim_config.seed, sim_config.scheduling_interval);
        let ctx = clock.create_context("simulation");

        let broker = Broker::new(vm_selection_resolver(&sim_config.vm_selection)?, clock.create_context("broker"));
        let energy = EnergyAccumulator::new(sim_config.report_period, clock.create_context("energy"));
        let datacenter = Datacenter::new(
            allocation_policy_resolver(&sim_config.allocation_policy)?,
            broker,
            energy,
            sim_config.on_host_failure,
            clock.create_context("datacenter"),
        );
        clock.add_listener("cloudlet-processing", |dc: &mut Datacenter, tick: &Tick| {
            dc.update_processing(tick)
        });
        clock.add_listener("energy", |dc: &mut Datacenter, tick: &Tick| {
            dc.sample_energy(tick);
        });

        Ok(Self {
            clock,
            datacenter,
            scheduler_prototype: cloudlet_scheduler_resolver(&sim_config.cloudlet_scheduler)?,
            next_host_id: 0,
            next_vm_id: 0,
            outcome: None,
            ctx,
            sim_config: rc!(sim_config),
        })
    }

    /// Creates simulation and builds the model (hosts, VMs, cloudlets and failures) described in the config.
    ///
    /// VMs which do not fit on any host stay unplaced, this is not an error.
    pub fn from_config(sim_config: SimulationConfig) -> Result<Self> {
        let mut sim = Self::new(sim_config)?;
        let config = sim.sim_config.clone();

        for host_config in &config.hosts {
            let count = host_config.count.unwrap_or(1);
            let power_model_str = host_config.power_model.as_deref().unwrap_or(DEFAULT_POWER_MODEL);
            let power_model = power_model_resolver(power_model_str)?;
            for i in 0..count {
                let name = match (&host_config.name, &host_config.name_prefix) {
                    (Some(name), _) if count == 1 => name.clone(),
                    (_, Some(prefix)) => format!("{}{}", prefix, i),
                    _ => format!("host-{}", sim.next_host_id),
                };
                sim.add_host(
                    &name,
                    &vec![host_config.pe_mips; host_config.pes as usize],
                    host_config.ram,
                    host_config.bw,
                    host_config.storage,
                    power_model.clone(),
                )?;
            }
        }

        for vm_config in &config.vms {
            for _ in 0..vm_config.count.unwrap_or(1) {
                let result = sim.submit_vm(
                    vm_config.mips,
                    vm_config.pes,
                    vm_config.ram,
                    vm_config.bw,
                    vm_config.storage,
                );
                match result {
                    Ok(_) | Err(CloudSimError::NoSuitableHost { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        let mut next_cloudlet_id: CloudletId = 0;
        for cloudlet_config in &config.cloudlets {
            for _ in 0..cloudlet_config.count.unwrap_or(1) {
                let cloudlet = build_cloudlet(next_cloudlet_id, cloudlet_config);
                next_cloudlet_id += 1;
                match cloudlet_config.submission_time {
                    Some(time) if time > 0. => {
                        sim.submit_cloudlet_at(time, cloudlet)?;
                    }
                    _ => {
                        sim.submit_cloudlet(cloudlet)?;
                    }
                }
            }
        }
        if let Some(random_config) = &config.random_cloudlets {
            let mut workload_ctx = sim.create_context("workload");
            for submission in generate_cloudlets(random_config, next_cloudlet_id, &mut workload_ctx) {
                if submission.time > 0. {
                    sim.submit_cloudlet_at(submission.time, submission.cloudlet)?;
                } else {
                    sim.submit_cloudlet(submission.cloudlet)?;
                }
            }
        }

        for failure in &config.failures {
            sim.schedule_host_failure(failure.time, failure.host)?;
        }
        Ok(sim)
    }

    /// Creates new simulation context, e.g. for a custom tick listener.
    pub fn create_context<S>(&mut self, name: S) -> SimulationContext
    where
        S: AsRef<str>,
    {
        self.clock.create_context(name)
    }

    /// Adds host with PEs of the specified capacities (in MIPS), returns the host id.
    ///
    /// Host ids are assigned sequentially starting from 0.
    pub fn add_host(
        &mut self,
        name: &str,
        pe_mips: &[f64],
        ram: u64,
        bw: u64,
        storage: u64,
        power_model: Box<dyn PowerModel>,
    ) -> Result<HostId> {
        if pe_mips.is_empty() || pe_mips.iter().any(|&mips| !mips.is_finite() || mips <= 0.) {
            return Err(CloudSimError::InvalidConfiguration(format!(
                "host {} must have PEs with positive capacity",
                name
            )));
        }
        if ram == 0 || bw == 0 || storage == 0 {
            return Err(CloudSimError::InvalidConfiguration(format!(
                "host {} must have positive ram, bw and storage, got {}, {} and {}",
                name, ram, bw, storage
            )));
        }
        let id = self.next_host_id;
        self.next_host_id += 1;
        let host = Host::new(id, pe_mips, ram, bw, storage, power_model, self.clock.create_context(name));
        Ok(self.datacenter.add_host(host))
    }

    /// Submits VM with the configured cloudlet scheduler and places it using the allocation policy.
    ///
    /// Returns `NoSuitableHost` error if the VM does not fit on any host. In this case the VM stays registered
    /// as unplaced and its cloudlets (if any are routed to it) never progress.
    pub fn submit_vm(&mut self, mips: f64, pes: u32, ram: u64, bw: u64, storage: u64) -> Result<VmId> {
        if pes == 0 || !mips.is_finite() || mips <= 0. {
            return Err(CloudSimError::InvalidConfiguration(format!(
                "vm must have positive pes and mips, got {} pes with {} mips",
                pes, mips
            )));
        }
        let id = self.next_vm_id;
        self.next_vm_id += 1;
        let vm = Vm::new(id, mips, pes, ram, bw, storage, self.scheduler_prototype.clone());
        self.datacenter.submit_vm(vm).map(|_| id)
    }

    /// Submits cloudlet immediately, returns the id of VM selected by the broker.
    pub fn submit_cloudlet(&mut self, cloudlet: Cloudlet) -> Result<VmId> {
        check_cloudlet(&cloudlet)?;
        self.datacenter.submit_cloudlet(cloudlet)
    }

    /// Submits cloudlet at the specified time.
    ///
    /// The broker selects a VM at the submission time, the cloudlet starts executing from the next tick.
    pub fn submit_cloudlet_at(&mut self, time: f64, cloudlet: Cloudlet) -> Result<ActionId> {
        check_cloudlet(&cloudlet)?;
        if !time.is_finite() || time < 0. {
            return Err(CloudSimError::InvalidConfiguration(format!(
                "submission time must be non-negative, got {}",
                time
            )));
        }
        self.datacenter.add_pending_cloudlet();
        let name = format!("submit-cloudlet-{}", cloudlet.id);
        Ok(self.clock.schedule_once(time, name, move |dc: &mut Datacenter, _tick| {
            if let Err(e) = dc.submit_pending_cloudlet(cloudlet) {
                log_error!(dc.context(), "can't submit cloudlet: {}", e);
            }
        }))
    }

    /// Schedules failure of the host at the specified time.
    pub fn schedule_host_failure(&mut self, time: f64, host_id: HostId) -> Result<ActionId> {
        if self.datacenter.host(host_id).is_none() {
            return Err(CloudSimError::UnknownHost(host_id));
        }
        if !time.is_finite() || time < 0. {
            return Err(CloudSimError::InvalidConfiguration(format!(
                "failure time must be non-negative, got {}",
                time
            )));
        }
        Ok(schedule_host_failure(&mut self.clock, HostFailure { time, host: host_id }))
    }

    /// Adds listener invoked at every tick after the processing and energy updates.
    pub fn add_tick_listener<S, F>(&mut self, name: S, listener: F) -> ListenerId
    where
        S: AsRef<str>,
        F: FnMut(&mut Datacenter, &Tick) + 'static,
    {
        self.clock.add_listener(name, listener)
    }

    /// Performs a single tick.
    pub fn step(&mut self) -> Tick {
        self.clock.advance(&mut self.datacenter)
    }

    /// Performs the specified number of ticks.
    pub fn steps(&mut self, step_count: u64) {
        self.clock.steps(&mut self.datacenter, step_count)
    }

    /// Runs the simulation for the specified duration.
    pub fn run_for_duration(&mut self, duration: f64) {
        self.clock.run_for_duration(&mut self.datacenter, duration)
    }

    /// Runs the simulation until all cloudlets are finished, failed or stalled, or until the time horizon.
    pub fn run(&mut self) -> RunOutcome {
        log_info!(
            self.ctx,
            "starting simulation: {} hosts, {} vms, {} cloudlets",
            self.datacenter.hosts().len(),
            self.datacenter.vms().len(),
            self.datacenter.cloudlet_count() + self.datacenter.pending_cloudlets()
        );
        let outcome = self
            .clock
            .run_until(&mut self.datacenter, |dc| dc.is_finished(), self.sim_config.max_time);
        if outcome == RunOutcome::HorizonReached {
            log_warn!(self.ctx, "time horizon reached before all cloudlets completed");
        }
        self.outcome = Some(outcome);
        self.report().log_summary(&self.ctx);
        outcome
    }

    /// Returns the result of the last [`run`](Self::run).
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    pub fn datacenter(&self) -> &Datacenter {
        &self.datacenter
    }

    /// Returns the report on the current simulation state.
    pub fn report(&self) -> SimulationReport {
        SimulationReport::new(&self.datacenter, self.current_time(), self.outcome)
    }

    /// Returns the current simulation time.
    pub fn current_time(&self) -> f64 {
        self.clock.time()
    }

    pub fn tick_count(&self) -> u64 {
        self.clock.tick_count()
    }

    pub fn sim_config(&self) -> Rc<SimulationConfig> {
        self.sim_config.clone()
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }
}

fn check_cloudlet(cloudlet: &Cloudlet) -> Result<()> {
    if cloudlet.pes() == 0 || !cloudlet.length().is_finite() || cloudlet.length() <= 0. {
        return Err(CloudSimError::InvalidConfiguration(format!(
            "cloudlet #{} must have positive pes and length",
            cloudlet.id
        )));
    }
    Ok(())
}

fn build_cloudlet(id: CloudletId, config: &CloudletConfig) -> Cloudlet {
    Cloudlet::new(id, config.length, config.pes)
        .with_cpu_model(utilization_model_from_value(config.cpu_utilization))
        .with_ram_model(utilization_model_from_value(config.ram_utilization))
        .with_bw_model(utilization_model_from_value(config.bw_utilization))
        .with_file_sizes(config.file_size.unwrap_or(0), config.output_size.unwrap_or(0))
}
