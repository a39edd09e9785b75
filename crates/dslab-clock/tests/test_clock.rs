use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;

use dslab_clock::{RunOutcome, SimulationClock, Tick};

#[derive(Default)]
struct Journal {
    records: Vec<(String, f64)>,
}

impl Journal {
    fn push(&mut self, name: &str, tick: &Tick) {
        self.records.push((name.to_string(), tick.time));
    }

    fn names_at(&self, time: f64) -> Vec<&str> {
        self.records
            .iter()
            .filter(|(_, t)| *t == time)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[test]
fn test_listeners_fire_in_registration_order() {
    let mut clock = SimulationClock::<Journal>::new(123, 1.);
    clock.add_listener("first", |j: &mut Journal, tick| j.push("first", tick));
    clock.add_listener("second", |j: &mut Journal, tick| j.push("second", tick));
    clock.add_listener("third", |j: &mut Journal, tick| j.push("third", tick));

    let mut journal = Journal::default();
    clock.steps(&mut journal, 2);

    assert_eq!(journal.names_at(1.), vec!["first", "second", "third"]);
    assert_eq!(journal.names_at(2.), vec!["first", "second", "third"]);
    assert_eq!(clock.listener_names(), vec!["first", "second", "third"]);
    assert_eq!(clock.tick_count(), 2);
}

#[test]
fn test_actions_fire_after_listeners() {
    let mut clock = SimulationClock::<Journal>::new(123, 1.);
    clock.schedule_once(2., "action", |j: &mut Journal, tick| j.push("action", tick));
    clock.add_listener("listener", |j: &mut Journal, tick| j.push("listener", tick));

    let mut journal = Journal::default();
    clock.steps(&mut journal, 3);

    assert_eq!(journal.names_at(1.), vec!["listener"]);
    assert_eq!(journal.names_at(2.), vec!["listener", "action"]);
    assert_eq!(journal.names_at(3.), vec!["listener"]);
    assert_eq!(clock.pending_actions(), 0);
}

#[test]
fn test_fast_forward_to_action_keeps_grid() {
    let mut clock = SimulationClock::<Journal>::new(123, 1.);
    clock.schedule_once(2.5, "action", |j: &mut Journal, tick| j.push("action", tick));
    clock.add_listener("listener", |j: &mut Journal, tick| j.push("listener", tick));

    let mut journal = Journal::default();
    let mut ticks = Vec::new();
    for _ in 0..4 {
        ticks.push(clock.advance(&mut journal));
    }

    let times: Vec<f64> = ticks.iter().map(|t| t.time).collect();
    assert_eq!(times, vec![1., 2., 2.5, 3.]);
    assert_abs_diff_eq!(ticks[2].duration(), 0.5);
    assert_abs_diff_eq!(ticks[3].duration(), 0.5);
    assert_eq!(journal.names_at(2.5), vec!["listener", "action"]);
}

#[test]
fn test_ticks_are_strictly_increasing() {
    let mut clock = SimulationClock::<()>::new(123, 0.1);
    clock.schedule_once(0.25, "a", |_, _| {});
    clock.schedule_once(0.25, "b", |_, _| {});
    clock.schedule_once(0.7, "c", |_, _| {});
    let mut prev = 0.;
    for expected_index in 1..=20 {
        let tick = clock.advance(&mut ());
        assert_eq!(tick.index, expected_index);
        assert!(tick.time > prev);
        assert_eq!(tick.prev_time, prev);
        prev = tick.time;
    }
    assert_abs_diff_eq!(clock.time(), 1.9, epsilon = 1e-9);
}

#[test]
fn test_simultaneous_actions_fire_in_scheduling_order() {
    let mut clock = SimulationClock::<Journal>::new(123, 1.);
    clock.schedule_once(1., "b", |j: &mut Journal, tick| j.push("b", tick));
    clock.schedule_once(1., "a", |j: &mut Journal, tick| j.push("a", tick));
    clock.schedule_once(0.5, "early", |j: &mut Journal, tick| j.push("early", tick));

    let mut journal = Journal::default();
    clock.steps(&mut journal, 2);

    assert_eq!(journal.names_at(0.5), vec!["early"]);
    assert_eq!(journal.names_at(1.), vec!["b", "a"]);
}

#[test]
fn test_past_action_fires_at_next_tick() {
    let mut clock = SimulationClock::<Journal>::new(123, 1.);
    let mut journal = Journal::default();
    clock.steps(&mut journal, 3);

    clock.schedule_once(1.5, "late", |j: &mut Journal, tick| j.push("late", tick));
    clock.advance(&mut journal);

    assert_eq!(journal.names_at(4.), vec!["late"]);
}

#[test]
fn test_canceled_action_is_not_fired() {
    let mut clock = SimulationClock::<Journal>::new(123, 1.);
    let id = clock.schedule_once(0.5, "canceled", |j: &mut Journal, tick| j.push("canceled", tick));
    clock.schedule_once(3., "kept", |j: &mut Journal, tick| j.push("kept", tick));
    clock.cancel_action(id);
    assert_eq!(clock.pending_actions(), 1);
    assert_eq!(clock.next_action_time(), Some(3.));

    let mut journal = Journal::default();
    clock.steps(&mut journal, 3);

    // no extra tick at 0.5 for the canceled action
    assert_eq!(clock.time(), 3.);
    assert_eq!(journal.records, vec![("kept".to_string(), 3.)]);
}

#[test]
fn test_run_until_stops_on_predicate() {
    let mut clock = SimulationClock::<u32>::new(123, 1.);
    clock.add_listener("counter", |count: &mut u32, _| *count += 1);

    let mut count = 0;
    let outcome = clock.run_until(&mut count, |count| *count >= 5, 100.);

    assert_eq!(outcome, RunOutcome::Stopped);
    assert_eq!(count, 5);
    assert_eq!(clock.time(), 5.);
}

#[test]
fn test_run_until_stops_at_horizon() {
    let mut clock = SimulationClock::<u32>::new(123, 1.);
    clock.add_listener("counter", |count: &mut u32, _| *count += 1);

    let mut count = 0;
    let outcome = clock.run_until(&mut count, |_| false, 3.5);

    assert_eq!(outcome, RunOutcome::HorizonReached);
    assert_eq!(count, 4);
    assert_eq!(clock.time(), 3.5);
}

#[test]
fn test_run_until_checks_predicate_before_first_tick() {
    let mut clock = SimulationClock::<u32>::new(123, 1.);
    clock.add_listener("counter", |count: &mut u32, _| *count += 1);

    let mut count = 0;
    assert_eq!(clock.run_until(&mut count, |_| true, 10.), RunOutcome::Stopped);
    assert_eq!(count, 0);
    assert_eq!(clock.tick_count(), 0);
}

#[test]
fn test_run_for_duration() {
    let mut clock = SimulationClock::<()>::new(123, 2.);
    clock.run_for_duration(&mut (), 5.);
    assert_eq!(clock.time(), 5.);
    assert_eq!(clock.tick_count(), 3);
    clock.run_for_duration(&mut (), 1.);
    assert_eq!(clock.time(), 6.);
}

#[test]
fn test_removed_listener_is_not_invoked() {
    let mut clock = SimulationClock::<u32>::new(123, 1.);
    let id = clock.add_listener("counter", |count: &mut u32, _| *count += 1);
    let mut count = 0;
    clock.advance(&mut count);
    assert!(clock.remove_listener(id));
    assert!(!clock.remove_listener(id));
    clock.advance(&mut count);
    assert_eq!(count, 1);
}

#[test]
fn test_context_follows_clock() {
    let mut clock = SimulationClock::<()>::new(123, 0.5);
    let ctx = clock.create_context("comp");
    let same = clock.create_context("comp");
    let other = clock.create_context("other");
    assert_eq!(ctx.id(), same.id());
    assert_ne!(ctx.id(), other.id());
    assert_eq!(other.lookup_name(ctx.id()), Some("comp".to_string()));

    let observed = Rc::new(RefCell::new(Vec::new()));
    let observed_clone = observed.clone();
    clock.add_listener("observer", move |_, _| observed_clone.borrow_mut().push(ctx.time()));
    clock.steps(&mut (), 3);

    assert_eq!(*observed.borrow(), vec![0.5, 1., 1.5]);
    assert_eq!(other.tick_count(), 3);
}

#[test]
fn test_seeded_random_is_reproducible() {
    let draw = |seed: u64| {
        let mut clock = SimulationClock::<()>::new(seed, 1.);
        let mut ctx = clock.create_context("comp");
        let mut values: Vec<f64> = (0..5).map(|_| ctx.rand()).collect();
        values.push(clock.gen_range(0.0..10.0));
        values
    };
    assert_eq!(draw(42), draw(42));
    assert_ne!(draw(42), draw(43));
}

#[test]
#[should_panic]
fn test_zero_interval_is_rejected() {
    SimulationClock::<()>::new(123, 0.);
}
