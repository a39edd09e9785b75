//! Cloudlet resource utilization models.

use dyn_clone::{clone_trait_object, DynClone};

/// A utilization model is a function, which defines the fraction of a resource used by a cloudlet at the moment.
/// time - current simulation time, time_from_start - time since the cloudlet started executing.
///
/// Returned values are expected to be in [0, 1].
pub trait UtilizationModel: DynClone {
    fn utilization(&self, time: f64, time_from_start: f64) -> f64;
}

clone_trait_object!(UtilizationModel);

/// The cloudlet always uses the whole resource.
#[derive(Clone, Default)]
pub struct FullUtilization;

impl UtilizationModel for FullUtilization {
    fn utilization(&self, _time: f64, _time_from_start: f64) -> f64 {
        1.
    }
}

/// The constant utilization.
#[derive(Clone)]
pub struct ConstantUtilization {
    value: f64,
}

impl ConstantUtilization {
    pub fn new(value: f64) -> Self {
        Self {
            value: value.clamp(0., 1.),
        }
    }
}

impl UtilizationModel for ConstantUtilization {
    fn utilization(&self, _time: f64, _time_from_start: f64) -> f64 {
        self.value
    }
}

/// Returns constant utilization model with the specified value, or full utilization if the value is not set.
pub fn utilization_model_from_value(value: Option<f64>) -> Box<dyn UtilizationModel> {
    match value {
        Some(value) => Box::new(ConstantUtilization::new(value)),
        None => Box::new(FullUtilization),
    }
}
