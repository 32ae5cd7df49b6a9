// events.rs - typed event bus
//
// Events are dispatched by a string tag (the discriminant of whatever
// application-level enum `E` is) so a handler can subscribe to one tag or to
// every event via the "*" wildcard. `emit` only queues; nothing is delivered
// until `process` drains the queue, which keeps emission safe from anywhere
// (including inside a system that is itself mid-dispatch) without handlers
// observing partial state.
//
// `process` snapshots the queue length before dispatching so events emitted
// by a handler during this call are deferred to the *next* `process` rather
// than being delivered in the same pass - otherwise a handler that always
// emits another event of the same tag would spin forever. Calling `process`
// re-entrantly (a handler calling `process` on the same bus) is rejected by
// a guard flag rather than deadlocking or recursing.

use std::collections::{HashMap, VecDeque};

use tracing::error;

use crate::error::EcsError;

pub type EventHandlerId = u32;

const WILDCARD: &str = "*";

/// Implemented by an application's event enum. `tag()` should return the
/// variant name (or another stable discriminant) used for subscription
/// matching.
pub trait Event: Clone + Send + Sync + 'static {
    fn tag(&self) -> &'static str;
}

type Handler<E> = Box<dyn FnMut(&E) -> Result<(), EcsError> + Send>;

struct Subscription<E> {
    id: EventHandlerId,
    handler: Handler<E>,
}

pub struct EventBus<E: Event> {
    queue: VecDeque<E>,
    by_tag: HashMap<&'static str, Vec<Subscription<E>>>,
    next_id: EventHandlerId,
    processing: bool,
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            by_tag: HashMap::new(),
            next_id: 0,
            processing: false,
        }
    }
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for delivery on the next `process` call.
    pub fn emit(&mut self, event: E) {
        self.queue.push_back(event);
    }

    /// Subscribe to a specific tag. Use [`Self::subscribe_all`] for a
    /// wildcard subscription delivered every event regardless of tag.
    pub fn subscribe(
        &mut self,
        tag: &'static str,
        handler: impl FnMut(&E) -> Result<(), EcsError> + Send + 'static,
    ) -> EventHandlerId {
        let id = self.next_id;
        self.next_id += 1;
        self.by_tag
            .entry(tag)
            .or_default()
            .push(Subscription { id, handler: Box::new(handler) });
        id
    }

    pub fn subscribe_all(
        &mut self,
        handler: impl FnMut(&E) -> Result<(), EcsError> + Send + 'static,
    ) -> EventHandlerId {
        self.subscribe(WILDCARD, handler)
    }

    /// Remove a handler by id, searching every tag bucket.
    pub fn unsubscribe(&mut self, id: EventHandlerId) -> bool {
        for subs in self.by_tag.values_mut() {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Dispatch every event queued as of this call to its tag-specific and
    /// wildcard handlers, in subscription order. A handler returning `Err`
    /// is logged and does not stop delivery to the remaining handlers or
    /// events - one broken subscriber must not starve the rest.
    pub fn process(&mut self) {
        if self.processing {
            error!("EventBus::process called re-entrantly; ignoring nested call");
            return;
        }
        self.processing = true;

        let to_dispatch: Vec<E> = self.queue.drain(..).collect();
        for event in &to_dispatch {
            let tag = event.tag();
            if let Some(subs) = self.by_tag.get_mut(tag) {
                for sub in subs.iter_mut() {
                    if let Err(err) = (sub.handler)(event) {
                        error!(tag, error = %err, "event handler failed");
                    }
                }
            }
            if tag != WILDCARD {
                if let Some(subs) = self.by_tag.get_mut(WILDCARD) {
                    for sub in subs.iter_mut() {
                        if let Err(err) = (sub.handler)(event) {
                            error!(tag = WILDCARD, error = %err, "wildcard event handler failed");
                        }
                    }
                }
            }
        }

        self.processing = false;
    }

    /// Discard every queued event without dispatching - used when resetting
    /// the world mid-session.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    enum TestEvent {
        Ping,
        Pong,
    }

    impl Event for TestEvent {
        fn tag(&self) -> &'static str {
            match self {
                TestEvent::Ping => "ping",
                TestEvent::Pong => "pong",
            }
        }
    }

    #[test]
    fn tag_specific_handler_only_sees_its_tag() {
        let mut bus = EventBus::<TestEvent>::new();
        let seen = Arc::new(Mutex::new(0));
        let seen2 = seen.clone();
        bus.subscribe("ping", move |_| {
            *seen2.lock().unwrap() += 1;
            Ok(())
        });
        bus.emit(TestEvent::Ping);
        bus.emit(TestEvent::Pong);
        bus.process();
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn wildcard_handler_sees_every_event() {
        let mut bus = EventBus::<TestEvent>::new();
        let seen = Arc::new(Mutex::new(0));
        let seen2 = seen.clone();
        bus.subscribe_all(move |_| {
            *seen2.lock().unwrap() += 1;
            Ok(())
        });
        bus.emit(TestEvent::Ping);
        bus.emit(TestEvent::Pong);
        bus.process();
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[test]
    fn failing_handler_does_not_block_others() {
        let mut bus = EventBus::<TestEvent>::new();
        let seen = Arc::new(Mutex::new(0));
        bus.subscribe("ping", |_| Err(EcsError::MissingResource { name: "x".into() }));
        let seen2 = seen.clone();
        bus.subscribe("ping", move |_| {
            *seen2.lock().unwrap() += 1;
            Ok(())
        });
        bus.emit(TestEvent::Ping);
        bus.process();
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn events_emitted_during_process_are_deferred() {
        let mut bus = EventBus::<TestEvent>::new();
        let count = Arc::new(Mutex::new(0));
        let count2 = count.clone();
        bus.subscribe("ping", move |_| {
            *count2.lock().unwrap() += 1;
            Ok(())
        });
        bus.emit(TestEvent::Ping);
        bus.process();
        assert_eq!(bus.pending_count(), 0);
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
