//! Host power consumption models.

use std::collections::HashMap;

use dyn_clone::{clone_trait_object, DynClone};
use sugars::boxed;

use crate::core::config::{parse_config_value, parse_options};
use crate::core::error::{CloudSimError, Result};

/// Power model is a function, which computes the power consumption of a host in Watts
/// based on its current CPU utilization.
pub trait PowerModel: DynClone {
    /// Returns the power consumption of a host.
    ///
    /// Utilization outside of [0, 1] is clamped to this range.
    fn power(&self, utilization: f64) -> f64;

    /// Returns the power consumption of an idle host.
    fn idle_power(&self) -> f64 {
        self.power(0.)
    }

    /// Returns the power consumption of a fully loaded host.
    fn max_power(&self) -> f64 {
        self.power(1.)
    }
}

clone_trait_object!(PowerModel);

fn clamp_utilization(utilization: f64) -> f64 {
    if utilization.is_nan() {
        0.
    } else {
        utilization.clamp(0., 1.)
    }
}

/// Linear interpolation between the idle and maximum power: `idle + (max - idle) * u`.
#[derive(Clone)]
pub struct LinearPowerModel {
    idle_power: f64,
    factor: f64,
}

impl LinearPowerModel {
    /// Creates a linear power model.
    ///
    /// * `idle_power` - The power consumption in Watts at 0% utilization.
    /// * `max_power` - The power consumption in Watts at 100% utilization.
    pub fn new(idle_power: f64, max_power: f64) -> Self {
        Self {
            idle_power,
            factor: max_power - idle_power,
        }
    }
}

impl PowerModel for LinearPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        self.idle_power + self.factor * clamp_utilization(utilization)
    }
}

/// Square interpolation between the idle and maximum power: `idle + (max - idle) * u^2`.
#[derive(Clone)]
pub struct SquarePowerModel {
    idle_power: f64,
    factor: f64,
}

impl SquarePowerModel {
    pub fn new(idle_power: f64, max_power: f64) -> Self {
        Self {
            idle_power,
            factor: max_power - idle_power,
        }
    }
}

impl PowerModel for SquarePowerModel {
    fn power(&self, utilization: f64) -> f64 {
        self.idle_power + self.factor * clamp_utilization(utilization).powi(2)
    }
}

/// Cubic interpolation between the idle and maximum power: `idle + (max - idle) * u^3`.
#[derive(Clone)]
pub struct CubicPowerModel {
    idle_power: f64,
    factor: f64,
}

impl CubicPowerModel {
    pub fn new(idle_power: f64, max_power: f64) -> Self {
        Self {
            idle_power,
            factor: max_power - idle_power,
        }
    }
}

impl PowerModel for CubicPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        self.idle_power + self.factor * clamp_utilization(utilization).powi(3)
    }
}

/// Constant power consumption regardless of utilization.
#[derive(Clone)]
pub struct ConstantPowerModel {
    power: f64,
}

impl ConstantPowerModel {
    pub fn new(power: f64) -> Self {
        Self { power }
    }
}

impl PowerModel for ConstantPowerModel {
    fn power(&self, _utilization: f64) -> f64 {
        self.power
    }
}

fn parse_power_option(options: &HashMap<String, String>, name: &str, config_str: &str) -> Result<f64> {
    let value = options
        .get(name)
        .ok_or_else(|| CloudSimError::InvalidConfiguration(format!("missing option {} in {}", name, config_str)))?;
    let value = value.trim().parse::<f64>().map_err(|_| {
        CloudSimError::InvalidConfiguration(format!("option {} in {} is not a number", name, config_str))
    })?;
    if !value.is_finite() || value < 0. {
        return Err(CloudSimError::InvalidConfiguration(format!(
            "option {} in {} must be non-negative",
            name, config_str
        )));
    }
    Ok(value)
}

/// Creates power model from config string, e.g. `Linear[idle=75,max=300]` or `Constant[power=100]`.
pub fn power_model_resolver(config_str: &str) -> Result<Box<dyn PowerModel>> {
    let (model_name, options) = parse_config_value(config_str);
    let options = parse_options(&options.unwrap_or_default());
    match model_name.as_str() {
        "Constant" => Ok(boxed!(ConstantPowerModel::new(parse_power_option(
            &options, "power", config_str
        )?))),
        "Linear" | "Square" | "Cubic" => {
            let idle = parse_power_option(&options, "idle", config_str)?;
            let max = parse_power_option(&options, "max", config_str)?;
            if max < idle {
                return Err(CloudSimError::InvalidConfiguration(format!(
                    "max power is less than idle power in {}",
                    config_str
                )));
            }
            Ok(match model_name.as_str() {
                "Linear" => boxed!(LinearPowerModel::new(idle, max)),
                "Square" => boxed!(SquarePowerModel::new(idle, max)),
                _ => boxed!(CubicPowerModel::new(idle, max)),
            })
        }
        _ => Err(CloudSimError::InvalidConfiguration(format!(
            "unknown power model: {}",
            config_str
        ))),
    }
}
