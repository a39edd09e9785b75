//! Extensions for generating simulation workloads.

pub mod random_workload;
