//! Simulation model.

pub mod broker;
pub mod cloudlet;
pub mod cloudlet_scheduler;
pub mod cloudlet_schedulers;
pub mod common;
pub mod config;
pub mod datacenter;
pub mod energy_accumulator;
pub mod energy_meter;
pub mod error;
pub mod failure_injector;
pub mod host;
pub mod pe;
pub mod power_model;
pub mod report;
pub mod utilization_model;
pub mod vm;
pub mod vm_allocation_policies;
pub mod vm_allocation_policy;
pub mod vm_selection;
