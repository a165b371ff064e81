//! Single-phase countdown.
//!
//! A countdown counts elapsed ticks against a fixed duration. It owns at most
//! one tick source at a time: `start` arms it, `stop`/`pause`/natural
//! completion cancel it.
//!
//! ## Lifecycle
//!
//! ```text
//! new -> start -> (tick)* -> ended
//!          |  ^
//!        pause unpause
//! ```
//!
//! The phase ends on the tick that brings `remaining` to zero: the last
//! `Increment` carries `elapsed == duration` and is followed by `Ended`.

use std::sync::Arc;

use super::tick::{TickScheduler, TickSource, TICK_PERIOD};
use crate::events::{CountdownEvent, EventBus, SubscriptionId};
use crate::format::format_clock;

pub struct Countdown {
    duration: u64,
    elapsed: u64,
    paused: bool,
    source: Option<TickSource>,
    scheduler: Arc<dyn TickScheduler>,
    events: EventBus<CountdownEvent>,
}

impl Countdown {
    pub fn new(duration: u64, scheduler: Arc<dyn TickScheduler>) -> Self {
        Self {
            duration,
            elapsed: 0,
            paused: false,
            source: None,
            scheduler,
            events: EventBus::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_started(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn remaining(&self) -> u64 {
        // elapsed never passes duration: the tick reaching it ends the phase.
        self.duration - self.elapsed
    }

    /// Remaining time as `m:ss`.
    pub fn time(&self) -> String {
        format_clock(i64::try_from(self.remaining()).unwrap_or(i64::MAX))
    }

    /// The armed tick source, if running.
    pub fn tick_source(&self) -> Option<TickSource> {
        self.source
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&CountdownEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting. No-op while already running.
    pub fn start(&mut self) {
        let mut emitted = Vec::new();
        self.start_into(&mut emitted);
        self.publish(&emitted);
    }

    /// Cancel the tick source. Safe to call in any state.
    pub fn stop(&mut self) {
        if let Some(source) = self.source.take() {
            self.scheduler.cancel(source);
        }
    }

    pub fn pause(&mut self) {
        self.stop();
        self.paused = true;
    }

    /// Resume counting from the current `elapsed`.
    pub fn unpause(&mut self) {
        let mut emitted = Vec::new();
        self.unpause_into(&mut emitted);
        self.publish(&emitted);
    }

    pub fn reset(&mut self) {
        self.elapsed = 0;
        self.paused = false;
        self.stop();
    }

    /// Deliver one tick from `source`.
    ///
    /// Returns whether the source should keep firing: `false` on the tick
    /// that ends the phase and for sources this countdown no longer owns.
    pub fn on_tick(&mut self, source: TickSource) -> bool {
        let mut emitted = Vec::new();
        let keep_going = self.tick_into(source, &mut emitted);
        self.publish(&emitted);
        keep_going
    }

    // ── Internal ─────────────────────────────────────────────────────

    pub(crate) fn start_into(&mut self, emitted: &mut Vec<CountdownEvent>) {
        if self.source.is_some() {
            return;
        }
        emitted.push(CountdownEvent::Start);
        self.paused = false;
        if self.remaining() == 0 {
            emitted.push(CountdownEvent::Ended);
            return;
        }
        self.source = Some(self.scheduler.schedule(TICK_PERIOD));
    }

    pub(crate) fn unpause_into(&mut self, emitted: &mut Vec<CountdownEvent>) {
        self.start_into(emitted);
        self.paused = false;
    }

    pub(crate) fn tick_into(
        &mut self,
        source: TickSource,
        emitted: &mut Vec<CountdownEvent>,
    ) -> bool {
        if self.source != Some(source) {
            tracing::warn!(source = source.id(), "ignoring tick from stale source");
            return false;
        }

        self.elapsed += 1;
        emitted.push(CountdownEvent::Increment {
            elapsed: self.elapsed,
            remaining: self.remaining(),
        });
        tracing::trace!(elapsed = self.elapsed, duration = self.duration, "tick");

        if self.remaining() == 0 {
            self.stop();
            emitted.push(CountdownEvent::Ended);
            return false;
        }
        true
    }

    fn publish(&mut self, emitted: &[CountdownEvent]) {
        for event in emitted {
            self.events.emit(event);
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("duration", &self.duration)
            .field("elapsed", &self.elapsed)
            .field("paused", &self.paused)
            .field("source", &self.source)
            .field("events", &self.events)
            .finish()
    }
}
