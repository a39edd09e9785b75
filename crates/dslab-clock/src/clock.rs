//! Clock configuration and execution.

use std::cell::RefCell;
use std::collections::{BinaryHeap, HashSet};
use std::rc::Rc;

use log::Level::Trace;
use log::{debug, log_enabled, trace};
use rand::distributions::uniform::{SampleRange, SampleUniform};
use serde::Serialize;
use serde_json::json;

use crate::context::SimulationContext;
use crate::event::{ActionId, ScheduledAction, Tick};
use crate::handler::{Listener, ListenerId};
use crate::log::get_colored;
use crate::state::{ClockState, EPSILON};

/// Reason why [`SimulationClock::run_until`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// The stop predicate holds.
    Stopped,
    /// The time horizon is reached before the stop predicate holds.
    HorizonReached,
}

/// Drives the simulated time of a model with state `C`.
///
/// The time advances by the scheduling interval, except when a one-shot action is due earlier:
/// then the clock advances exactly to the action time. Regular ticks are kept on the grid
/// `k * interval`, so fast-forwarding to an action does not shift the following ticks.
///
/// At every tick the clock first invokes all listeners in registration order, then fires the actions
/// due at the tick time in the order of their time and scheduling. Each tick is fully processed
/// before the next one begins.
pub struct SimulationClock<C> {
    clock_state: Rc<RefCell<ClockState>>,
    interval: f64,
    listeners: Vec<Listener<C>>,
    listener_count: ListenerId,
    actions: BinaryHeap<ScheduledAction<C>>,
    canceled_actions: HashSet<ActionId>,
    action_count: u64,
}

impl<C> SimulationClock<C> {
    /// Creates a new clock with specified random seed and scheduling interval.
    ///
    /// Panics if the interval is not a positive finite number.
    pub fn new(seed: u64, interval: f64) -> Self {
        assert!(
            interval.is_finite() && interval > 0.,
            "Scheduling interval must be positive, got {}",
            interval
        );
        Self {
            clock_state: Rc::new(RefCell::new(ClockState::new(seed))),
            interval,
            listeners: Vec::new(),
            listener_count: 0,
            actions: BinaryHeap::new(),
            canceled_actions: HashSet::new(),
            action_count: 0,
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> f64 {
        self.clock_state.borrow().time()
    }

    /// Returns the scheduling interval.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Returns the number of processed ticks.
    pub fn tick_count(&self) -> u64 {
        self.clock_state.borrow().tick_count()
    }

    /// Creates a new component context with specified name.
    ///
    /// Contexts created with the same name share the same identifier.
    pub fn create_context<S>(&mut self, name: S) -> SimulationContext
    where
        S: AsRef<str>,
    {
        let id = self.clock_state.borrow_mut().register(name.as_ref());
        let ctx = SimulationContext::new(id, name.as_ref(), self.clock_state.clone());
        debug!(
            target: "simulation",
            "[{:.3} {} simulation] Created context: {}",
            self.time(),
            get_colored("DEBUG", colored::Color::Blue),
            json!({"name": ctx.name(), "id": ctx.id()})
        );
        ctx
    }

    /// Registers a listener invoked at every subsequent tick, returns the listener id.
    ///
    /// Listeners are invoked in registration order.
    pub fn add_listener<S, F>(&mut self, name: S, listener: F) -> ListenerId
    where
        S: AsRef<str>,
        F: FnMut(&mut C, &Tick) + 'static,
    {
        let id = self.listener_count;
        self.listener_count += 1;
        self.listeners.push(Listener {
            id,
            name: name.as_ref().to_owned(),
            callback: Box::new(listener),
        });
        debug!(
            target: "simulation",
            "[{:.3} {} simulation] Added listener: {}",
            self.time(),
            get_colored("DEBUG", colored::Color::Blue),
            json!({"name": name.as_ref(), "id": id})
        );
        id
    }

    /// Removes the listener with specified id, returns `false` if there is no such listener.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let count = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        count != self.listeners.len()
    }

    /// Returns the names of registered listeners in invocation order.
    pub fn listener_names(&self) -> Vec<&str> {
        self.listeners.iter().map(|listener| listener.name.as_str()).collect()
    }

    /// Schedules a one-shot action to be fired at the first tick at or after the specified time.
    ///
    /// If the time is not in the future, the action fires at the next tick.
    pub fn schedule_once<S, F>(&mut self, time: f64, name: S, action: F) -> ActionId
    where
        S: AsRef<str>,
        F: FnOnce(&mut C, &Tick) + 'static,
    {
        assert!(!time.is_nan(), "Action time must be a number");
        let id = self.action_count;
        self.action_count += 1;
        self.actions.push(ScheduledAction {
            id,
            time,
            name: name.as_ref().to_owned(),
            action: Box::new(action),
        });
        debug!(
            target: "simulation",
            "[{:.3} {} simulation] Scheduled action: {}",
            self.time(),
            get_colored("DEBUG", colored::Color::Blue),
            json!({"name": name.as_ref(), "id": id, "time": time})
        );
        id
    }

    /// Cancels the scheduled action.
    pub fn cancel_action(&mut self, id: ActionId) {
        if self.actions.iter().any(|action| action.id == id) {
            self.canceled_actions.insert(id);
        }
    }

    /// Returns the number of scheduled actions which are not fired or canceled yet.
    pub fn pending_actions(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| !self.canceled_actions.contains(&action.id))
            .count()
    }

    /// Returns the time of the earliest pending action.
    pub fn next_action_time(&mut self) -> Option<f64> {
        loop {
            let canceled = match self.actions.peek() {
                Some(action) => self.canceled_actions.contains(&action.id),
                None => return None,
            };
            if !canceled {
                return self.actions.peek().map(|action| action.time);
            }
            if let Some(action) = self.actions.pop() {
                self.canceled_actions.remove(&action.id);
            }
        }
    }

    /// Returns the time of the next tick.
    pub fn next_tick_time(&mut self) -> f64 {
        let now = self.time();
        let regular = (((now + EPSILON) / self.interval).floor() + 1.) * self.interval;
        match self.next_action_time() {
            Some(time) if time > now + EPSILON && time < regular - EPSILON => time,
            _ => regular,
        }
    }

    /// Processes the next tick and returns it.
    pub fn advance(&mut self, state: &mut C) -> Tick {
        self.advance_until(state, f64::INFINITY)
    }

    /// Processes the specified number of ticks.
    pub fn steps(&mut self, state: &mut C, tick_count: u64) {
        for _ in 0..tick_count {
            self.advance(state);
        }
    }

    /// Processes ticks while the simulation time is below the current time plus `duration`.
    ///
    /// The last tick is shortened if needed so that the clock stops exactly at the end time.
    pub fn run_for_duration(&mut self, state: &mut C, duration: f64) {
        let end_time = self.time() + duration;
        while self.time() < end_time - EPSILON {
            self.advance_until(state, end_time);
        }
    }

    /// Processes ticks until `stop` returns true or the time horizon is reached.
    ///
    /// The predicate is checked before the first tick and after every tick.
    pub fn run_until<F>(&mut self, state: &mut C, stop: F, horizon: f64) -> RunOutcome
    where
        F: Fn(&C) -> bool,
    {
        loop {
            if stop(state) {
                return RunOutcome::Stopped;
            }
            if self.time() >= horizon - EPSILON {
                return RunOutcome::HorizonReached;
            }
            self.advance_until(state, horizon);
        }
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

    fn advance_until(&mut self, state: &mut C, limit: f64) -> Tick {
        let time = self.next_tick_time().min(limit);
        let prev_time = self.time();
        let index = self.clock_state.borrow_mut().move_to(time);
        let tick = Tick { index, time, prev_time };
        if log_enabled!(Trace) {
            trace!(
                target: "simulation",
                "[{:.3} {} simulation] {}",
                time,
                get_colored("TICK", colored::Color::BrightBlack),
                json!({"index": index, "duration": tick.duration(), "listeners": self.listeners.len()})
            );
        }
        for listener in self.listeners.iter_mut() {
            (listener.callback)(state, &tick);
        }
        self.fire_due_actions(state, &tick);
        tick
    }

    fn fire_due_actions(&mut self, state: &mut C, tick: &Tick) {
        loop {
            match self.actions.peek() {
                Some(action) if action.time <= tick.time + EPSILON => {}
                _ => break,
            }
            if let Some(scheduled) = self.actions.pop() {
                if self.canceled_actions.remove(&scheduled.id) {
                    continue;
                }
                debug!(
                    target: "simulation",
                    "[{:.3} {} simulation] Firing action: {}",
                    tick.time,
                    get_colored("DEBUG", colored::Color::Blue),
                    json!({"name": scheduled.name, "id": scheduled.id, "time": scheduled.time})
                );
                (scheduled.action)(state, tick);
            }
        }
    }
}
