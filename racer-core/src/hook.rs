use std::collections::HashMap;

use crate::race_event::{RaceEvent, RaceEventKind};

type Listener = Box<dyn FnMut(&RaceEvent)>;

/// Listeners for race notifications, keyed by event kind. Audio, HUD and
/// logging hang off this instead of the race state reaching out to them.
#[derive(Default)]
pub struct EventHooks {
    stored_funcs: HashMap<RaceEventKind, Vec<Listener>>,
    catch_all: Vec<Listener>,
}

impl EventHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: RaceEventKind, f: impl FnMut(&RaceEvent) + 'static) {
        self.stored_funcs.entry(kind).or_default().push(Box::new(f));
    }

    pub fn add_catch_all(&mut self, f: impl FnMut(&RaceEvent) + 'static) {
        self.catch_all.push(Box::new(f));
    }

    pub fn call(&mut self, event: &RaceEvent) {
        if let Some(watchers) = self.stored_funcs.get_mut(&event.kind()) {
            for f in watchers.iter_mut() {
                f(event);
            }
        }
        for f in self.catch_all.iter_mut() {
            f(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn only_matching_listeners_fire() {
        let laps = Rc::new(RefCell::new(Vec::new()));
        let everything = Rc::new(RefCell::new(0));

        let mut hooks = EventHooks::new();
        let laps_seen = laps.clone();
        hooks.add(RaceEventKind::LapCompleted, move |event| {
            if let RaceEvent::LapCompleted { lap } = event {
                laps_seen.borrow_mut().push(*lap);
            }
        });
        let counter = everything.clone();
        hooks.add_catch_all(move |_| *counter.borrow_mut() += 1);

        hooks.call(&RaceEvent::Go);
        hooks.call(&RaceEvent::LapCompleted { lap: 1 });
        hooks.call(&RaceEvent::CountdownTick { remaining: 2 });

        assert_eq!(*laps.borrow(), vec![1]);
        assert_eq!(*everything.borrow(), 3);
    }
}
