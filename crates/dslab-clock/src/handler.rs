//! Callbacks invoked by the clock.

use crate::event::Tick;

/// Identifier of a registered tick listener.
pub type ListenerId = u32;

/// Per-tick listener: invoked at every tick with the model state and the tick.
pub type ListenerFn<C> = Box<dyn FnMut(&mut C, &Tick)>;

/// One-shot action: invoked once at the first tick at or after its scheduled time.
pub type ActionFn<C> = Box<dyn FnOnce(&mut C, &Tick)>;

pub(crate) struct Listener<C> {
    pub id: ListenerId,
    pub name: String,
    pub callback: ListenerFn<C>,
}
