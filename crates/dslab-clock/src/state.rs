use std::collections::HashMap;

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::context::Id;

/// Epsilon to compare floating point values for equality.
pub const EPSILON: f64 = 1e-9;

/// Clock state shared between the clock and component contexts.
pub struct ClockState {
    clock: f64,
    prev_clock: f64,
    tick_count: u64,
    rand: Pcg64,

    component_name_to_id: HashMap<String, Id>,
    component_names: Vec<String>,
}

impl ClockState {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.0,
            prev_clock: 0.0,
            tick_count: 0,
            rand: Pcg64::seed_from_u64(seed),
            component_name_to_id: HashMap::new(),
            component_names: Vec::new(),
        }
    }

    pub fn register(&mut self, name: &str) -> Id {
        if let Some(&id) = self.component_name_to_id.get(name) {
            return id;
        }
        let id = self.component_names.len() as Id;
        self.component_name_to_id.insert(name.to_owned(), id);
        self.component_names.push(name.to_owned());
        id
    }

    pub fn lookup_name(&self, id: Id) -> Option<&str> {
        self.component_names.get(id as usize).map(|name| name.as_str())
    }

    pub fn time(&self) -> f64 {
        self.clock
    }

    pub fn prev_time(&self) -> f64 {
        self.prev_clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Moves the clock forward and returns the number of the new tick.
    ///
    /// Time never goes backwards: a target below the current time is a bug in the caller.
    pub fn move_to(&mut self, time: f64) -> u64 {
        assert!(
            time > self.clock,
            "Clock must move forward: current time {}, requested {}",
            self.clock,
            time
        );
        self.prev_clock = self.clock;
        self.clock = time;
        self.tick_count += 1;
        self.tick_count
    }

    pub fn rand(&mut self) -> f64 {
        self.rand.gen_range(0.0..1.0)
    }

    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rand.gen_range(range)
    }

    pub fn sample_from_distribution<T, Dist: Distribution<T>>(&mut self, dist: &Dist) -> T {
        dist.sample(&mut self.rand)
    }
}
