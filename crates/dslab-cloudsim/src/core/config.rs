//! Simulation configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::cloudlet_scheduler::cloudlet_scheduler_resolver;
use crate::core::error::{CloudSimError, Result};
use crate::core::failure_injector::{HostFailure, HostFailurePolicy};
use crate::core::power_model::power_model_resolver;
use crate::core::vm_allocation_policy::allocation_policy_resolver;
use crate::core::vm_selection::vm_selection_resolver;

/// Parses config value string, which consists of two parts - name and options.
/// Example: Linear[idle=75,max=300] parts are name Linear and options string "idle=75,max=300".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.split_once('[') {
        Some((l, r)) => (l.trim().to_string(), Some(r.replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

/// Holds raw simulation config parsed from YAML file.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
struct RawSimulationConfig {
    pub seed: Option<u64>,
    pub scheduling_interval: Option<f64>,
    pub max_time: Option<f64>,
    pub report_period: Option<f64>,
    pub allocation_policy: Option<String>,
    pub vm_selection: Option<String>,
    pub cloudlet_scheduler: Option<String>,
    pub on_host_failure: Option<HostFailurePolicy>,
    pub hosts: Option<Vec<HostConfig>>,
    pub vms: Option<Vec<VmConfig>>,
    pub cloudlets: Option<Vec<CloudletConfig>>,
    pub random_cloudlets: Option<RandomCloudletsConfig>,
    pub failures: Option<Vec<HostFailure>>,
}

/// Holds configuration of a single host or a set of identical hosts.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Host name.
    /// Should be set if count = 1.
    pub name: Option<String>,
    /// Host name prefix.
    /// Full name is produced by appending host instance number to the prefix.
    pub name_prefix: Option<String>,
    /// Number of PEs.
    pub pes: u32,
    /// Capacity of each PE in MIPS.
    pub pe_mips: f64,
    pub ram: u64,
    pub bw: u64,
    pub storage: u64,
    /// Power model config string, e.g. `Linear[idle=75,max=300]`.
    pub power_model: Option<String>,
    /// Number of such hosts.
    pub count: Option<u32>,
}

/// Holds configuration of a single VM or a set of identical VMs.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct VmConfig {
    /// Requested capacity of each PE in MIPS.
    pub mips: f64,
    pub pes: u32,
    pub ram: u64,
    pub bw: u64,
    pub storage: u64,
    pub count: Option<u32>,
}

/// Holds configuration of a single cloudlet or a set of identical cloudlets.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct CloudletConfig {
    /// Length in MI.
    pub length: f64,
    pub pes: u32,
    pub file_size: Option<u64>,
    pub output_size: Option<u64>,
    /// Constant CPU utilization, full utilization if not set.
    pub cpu_utilization: Option<f64>,
    pub ram_utilization: Option<f64>,
    pub bw_utilization: Option<f64>,
    /// Submission time, cloudlets without it are submitted before the simulation starts.
    pub submission_time: Option<f64>,
    pub count: Option<u32>,
}

/// Holds configuration of randomly generated cloudlets.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct RandomCloudletsConfig {
    pub count: u32,
    pub min_length: f64,
    pub max_length: f64,
    pub min_pes: u32,
    pub max_pes: u32,
    pub cpu_utilization: Option<f64>,
    pub ram_utilization: Option<f64>,
    pub bw_utilization: Option<f64>,
    /// Cloudlets get uniformly distributed submission times in [0, submission_window].
    pub submission_window: Option<f64>,
}

/// Represents simulation configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Seed of the simulation random number generator.
    pub seed: u64,
    /// Duration in seconds between regular clock ticks.
    pub scheduling_interval: f64,
    /// Time horizon in seconds.
    pub max_time: f64,
    /// Period in seconds of the datacenter status log, zero disables it.
    pub report_period: f64,
    /// VM allocation policy: `FirstFit`, `BestFit` or `WorstFit`.
    pub allocation_policy: String,
    /// VM selection policy: `LeastLoaded[cpu_weight=..,ram_weight=..]` or `RoundRobin`.
    pub vm_selection: String,
    /// Cloudlet scheduler: `TimeShared` or `SpaceShared`.
    pub cloudlet_scheduler: String,
    pub on_host_failure: HostFailurePolicy,
    pub hosts: Vec<HostConfig>,
    pub vms: Vec<VmConfig>,
    pub cloudlets: Vec<CloudletConfig>,
    pub random_cloudlets: Option<RandomCloudletsConfig>,
    pub failures: Vec<HostFailure>,
}

pub const DEFAULT_POWER_MODEL: &str = "Linear[idle=75,max=300]";

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::from_raw(RawSimulationConfig {
            seed: None,
            scheduling_interval: None,
            max_time: None,
            report_period: None,
            allocation_policy: None,
            vm_selection: None,
            cloudlet_scheduler: None,
            on_host_failure: None,
            hosts: None,
            vms: None,
            cloudlets: None,
            random_cloudlets: None,
            failures: None,
        })
    }
}

fn invalid<T>(message: String) -> Result<T> {
    Err(CloudSimError::InvalidConfiguration(message))
}

fn check_fraction(value: Option<f64>, name: &str) -> Result<()> {
    match value {
        Some(v) if !(0. ..=1.).contains(&v) => invalid(format!("{} must be in [0, 1], got {}", name, v)),
        _ => Ok(()),
    }
}

impl SimulationConfig {
    /// Creates config with default values and empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates simulation config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(file_name)?)
    }

    /// Creates simulation config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawSimulationConfig = serde_yaml::from_str(yaml)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSimulationConfig) -> Self {
        Self {
            seed: raw.seed.unwrap_or(123),
            scheduling_interval: raw.scheduling_interval.unwrap_or(1.),
            max_time: raw.max_time.unwrap_or(86400.),
            report_period: raw.report_period.unwrap_or(5.),
            allocation_policy: raw.allocation_policy.unwrap_or_else(|| "FirstFit".to_string()),
            vm_selection: raw
                .vm_selection
                .unwrap_or_else(|| "LeastLoaded[cpu_weight=0.7,ram_weight=0.3]".to_string()),
            cloudlet_scheduler: raw.cloudlet_scheduler.unwrap_or_else(|| "TimeShared".to_string()),
            on_host_failure: raw.on_host_failure.unwrap_or_default(),
            hosts: raw.hosts.unwrap_or_default(),
            vms: raw.vms.unwrap_or_default(),
            cloudlets: raw.cloudlets.unwrap_or_default(),
            random_cloudlets: raw.random_cloudlets,
            failures: raw.failures.unwrap_or_default(),
        }
    }

    /// Returns the total number of hosts including the repeated ones.
    pub fn number_of_hosts(&self) -> u32 {
        self.hosts.iter().map(|h| h.count.unwrap_or(1)).sum()
    }

    /// Checks the config values, returns `InvalidConfiguration` error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if !self.scheduling_interval.is_finite() || self.scheduling_interval <= 0. {
            return invalid(format!(
                "scheduling_interval must be positive, got {}",
                self.scheduling_interval
            ));
        }
        if self.max_time.is_nan() || self.max_time <= 0. {
            return invalid(format!("max_time must be positive, got {}", self.max_time));
        }
        if !self.report_period.is_finite() || self.report_period < 0. {
            return invalid(format!("report_period must be non-negative, got {}", self.report_period));
        }
        allocation_policy_resolver(&self.allocation_policy)?;
        vm_selection_resolver(&self.vm_selection)?;
        cloudlet_scheduler_resolver(&self.cloudlet_scheduler)?;

        for host in &self.hosts {
            if host.pes == 0 || !host.pe_mips.is_finite() || host.pe_mips <= 0. {
                return invalid(format!("host must have positive pes and pe_mips: {:?}", host));
            }
            if host.ram == 0 || host.bw == 0 || host.storage == 0 {
                return invalid(format!("host must have positive ram, bw and storage: {:?}", host));
            }
            power_model_resolver(host.power_model.as_deref().unwrap_or(DEFAULT_POWER_MODEL))?;
        }
        for vm in &self.vms {
            if vm.pes == 0 || !vm.mips.is_finite() || vm.mips <= 0. {
                return invalid(format!("vm must have positive pes and mips: {:?}", vm));
            }
        }
        for cloudlet in &self.cloudlets {
            if cloudlet.pes == 0 || !cloudlet.length.is_finite() || cloudlet.length <= 0. {
                return invalid(format!("cloudlet must have positive pes and length: {:?}", cloudlet));
            }
            check_fraction(cloudlet.cpu_utilization, "cpu_utilization")?;
            check_fraction(cloudlet.ram_utilization, "ram_utilization")?;
            check_fraction(cloudlet.bw_utilization, "bw_utilization")?;
            if let Some(time) = cloudlet.submission_time {
                if !time.is_finite() || time < 0. {
                    return invalid(format!("submission_time must be non-negative, got {}", time));
                }
            }
        }
        if let Some(random) = &self.random_cloudlets {
            if random.min_length <= 0. || random.min_length > random.max_length || !random.max_length.is_finite() {
                return invalid(format!("invalid random cloudlet length range: {:?}", random));
            }
            if random.min_pes == 0 || random.min_pes > random.max_pes {
                return invalid(format!("invalid random cloudlet pes range: {:?}", random));
            }
            check_fraction(random.cpu_utilization, "cpu_utilization")?;
            check_fraction(random.ram_utilization, "ram_utilization")?;
            check_fraction(random.bw_utilization, "bw_utilization")?;
            if let Some(window) = random.submission_window {
                if !window.is_finite() || window < 0. {
                    return invalid(format!("submission_window must be non-negative, got {}", window));
                }
            }
        }
        let host_count = self.number_of_hosts();
        for failure in &self.failures {
            if !failure.time.is_finite() || failure.time < 0. {
                return invalid(format!("failure time must be non-negative, got {}", failure.time));
            }
            if failure.host >= host_count {
                return Err(CloudSimError::UnknownHost(failure.host));
            }
        }
        Ok(())
    }
}
