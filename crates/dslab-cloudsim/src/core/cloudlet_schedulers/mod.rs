//! Cloudlet scheduler implementations.

pub mod space_shared;
pub mod time_shared;
