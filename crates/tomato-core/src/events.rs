use serde::{Deserialize, Serialize};

use crate::timer::PhaseKind;

/// Events emitted by a single [`Countdown`](crate::timer::Countdown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountdownEvent {
    Start,
    Increment { elapsed: u64, remaining: u64 },
    Ended,
}

/// Events emitted by a [`CycleTimer`](crate::timer::CycleTimer).
///
/// `Start`, `Increment` and `Ended` are forwarded from whichever countdown
/// is active; `NextTransitionStarted` is synthesized at each phase boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CycleEvent {
    /// `remaining` differs from `duration` when a phase is resumed.
    Start {
        kind: PhaseKind,
        duration: u64,
        remaining: u64,
    },
    Increment { elapsed: u64, remaining: u64 },
    Ended { kind: PhaseKind },
    NextTransitionStarted { kind: PhaseKind, duration: u64 },
    /// The cycle went back to an idle first phase.
    Reset { kind: PhaseKind, duration: u64 },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Box<dyn FnMut(&E) + Send>;

/// Per-instance subscriber list. Delivery is synchronous, in subscription
/// order.
pub struct EventBus<E> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            handlers: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
