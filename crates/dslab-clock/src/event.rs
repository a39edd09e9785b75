//! Ticks and scheduled one-shot actions.

use std::cmp::Ordering;

use serde::Serialize;

use crate::handler::ActionFn;

/// Identifier of a scheduled one-shot action.
pub type ActionId = u64;

/// A processed clock step.
///
/// Listeners and actions receive the tick they run at. The tick covers the simulated
/// interval `(prev_time, time]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Tick {
    /// Sequential number of the tick, starting from 1.
    pub index: u64,
    /// Time of the tick.
    pub time: f64,
    /// Time of the previous tick (or 0 for the first one).
    pub prev_time: f64,
}

impl Tick {
    /// Returns the length of the simulated interval covered by this tick.
    pub fn duration(&self) -> f64 {
        self.time - self.prev_time
    }
}

pub(crate) struct ScheduledAction<C> {
    pub id: ActionId,
    pub time: f64,
    pub name: String,
    pub action: ActionFn<C>,
}

impl<C> Eq for ScheduledAction<C> {}

impl<C> PartialEq for ScheduledAction<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

// Inverted so that BinaryHeap pops the earliest action, ties broken by scheduling order.
impl<C> Ord for ScheduledAction<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.total_cmp(&self.time).then_with(|| other.id.cmp(&self.id))
    }
}

impl<C> PartialOrd for ScheduledAction<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
