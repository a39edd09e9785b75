//! Policies for selecting a VM to run a cloudlet.

use std::collections::HashMap;

use sugars::boxed;

use crate::core::cloudlet::Cloudlet;
use crate::core::common::VmId;
use crate::core::config::{parse_config_value, parse_options};
use crate::core::error::{CloudSimError, Result};
use crate::core::vm::Vm;

/// Selects a VM for a cloudlet among the candidate VMs, which are given in submission order.
///
/// Returns `None` if there are no candidates.
pub trait VmSelectionPolicy {
    fn name(&self) -> &str;

    fn select_vm(&mut self, cloudlet: &Cloudlet, candidates: &[&Vm], time: f64) -> Option<VmId>;
}

/// Picks the VM with the minimal weighted score `cpu_weight * cpu_utilization + ram_weight * ram_utilization`.
///
/// Ties are broken in favor of the first candidate.
pub struct LeastLoaded {
    cpu_weight: f64,
    ram_weight: f64,
}

impl LeastLoaded {
    pub fn new(cpu_weight: f64, ram_weight: f64) -> Self {
        Self { cpu_weight, ram_weight }
    }

    fn from_options(options: &HashMap<String, String>, config_str: &str) -> Result<Self> {
        let mut weights = [0.7, 0.3];
        for (weight, name) in weights.iter_mut().zip(["cpu_weight", "ram_weight"]) {
            if let Some(value) = options.get(name) {
                *weight = value.trim().parse::<f64>().map_err(|_| {
                    CloudSimError::InvalidConfiguration(format!("option {} in {} is not a number", name, config_str))
                })?;
                if !weight.is_finite() || *weight < 0. {
                    return Err(CloudSimError::InvalidConfiguration(format!(
                        "option {} in {} must be non-negative",
                        name, config_str
                    )));
                }
            }
        }
        Ok(Self::new(weights[0], weights[1]))
    }

    pub fn score(&self, vm: &Vm, time: f64) -> f64 {
        self.cpu_weight * vm.cpu_percent_utilization(time) + self.ram_weight * vm.ram_percent_utilization(time)
    }
}

impl Default for LeastLoaded {
    fn default() -> Self {
        Self::new(0.7, 0.3)
    }
}

impl VmSelectionPolicy for LeastLoaded {
    fn name(&self) -> &str {
        "LeastLoaded"
    }

    fn select_vm(&mut self, _cloudlet: &Cloudlet, candidates: &[&Vm], time: f64) -> Option<VmId> {
        let mut result: Option<VmId> = None;
        let mut min_score = f64::INFINITY;
        for vm in candidates {
            let score = self.score(vm, time);
            if result.is_none() || score < min_score {
                min_score = score;
                result = Some(vm.id);
            }
        }
        result
    }
}

/// Cycles through the candidates ignoring their load.
#[derive(Default)]
pub struct RoundRobin {
    next: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VmSelectionPolicy for RoundRobin {
    fn name(&self) -> &str {
        "RoundRobin"
    }

    fn select_vm(&mut self, _cloudlet: &Cloudlet, candidates: &[&Vm], _time: f64) -> Option<VmId> {
        if candidates.is_empty() {
            return None;
        }
        let vm = candidates[self.next % candidates.len()];
        self.next += 1;
        Some(vm.id)
    }
}

/// Creates VM selection policy from config string, e.g. `LeastLoaded[cpu_weight=0.7,ram_weight=0.3]`
/// or `RoundRobin`.
pub fn vm_selection_resolver(config_str: &str) -> Result<Box<dyn VmSelectionPolicy>> {
    let (policy_name, options) = parse_config_value(config_str);
    let options = parse_options(&options.unwrap_or_default());
    match policy_name.as_str() {
        "LeastLoaded" => Ok(boxed!(LeastLoaded::from_options(&options, config_str)?)),
        "RoundRobin" => Ok(boxed!(RoundRobin::new())),
        _ => Err(CloudSimError::InvalidConfiguration(format!(
            "unknown vm selection policy: {}",
            config_str
        ))),
    }
}
