//! Accessing the clock from components.

use std::cell::RefCell;
use std::rc::Rc;

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::Distribution;

use crate::state::ClockState;

/// Identifier of a simulation component.
pub type Id = u32;

/// A facade for reading the clock state from simulation components.
///
/// Contexts are cheap handles to the state shared with [`SimulationClock`](crate::SimulationClock):
/// the time returned by [`time`](Self::time) always reflects the last processed tick.
#[derive(Clone)]
pub struct SimulationContext {
    id: Id,
    name: String,
    clock_state: Rc<RefCell<ClockState>>,
}

impl SimulationContext {
    pub(crate) fn new(id: Id, name: &str, clock_state: Rc<RefCell<ClockState>>) -> Self {
        Self {
            id,
            name: name.to_owned(),
            clock_state,
        }
    }

    /// Returns the identifier of component associated with this context.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the name of component associated with this context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.clock_state.borrow().time()
    }

    /// Returns the number of ticks processed so far.
    pub fn tick_count(&self) -> u64 {
        self.clock_state.borrow().tick_count()
    }

    /// Returns a random float in the range _[0, 1)_
    /// using the simulation-wide random number generator.
    pub fn rand(&mut self) -> f64 {
        self.clock_state.borrow_mut().rand()
    }

    /// Returns a random value in the specified range
    /// using the simulation-wide random number generator.
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.clock_state.borrow_mut().gen_range(range)
    }

    /// Returns a random value from the specified distribution
    /// using the simulation-wide random number generator.
    pub fn sample_from_distribution<T, Dist: Distribution<T>>(&mut self, dist: &Dist) -> T {
        self.clock_state.borrow_mut().sample_from_distribution(dist)
    }

    /// Lookup component name by its identifier.
    pub fn lookup_name(&self, id: Id) -> Option<String> {
        self.clock_state.borrow().lookup_name(id).map(|name| name.to_owned())
    }
}
