//! Injected tick scheduling.
//!
//! Timers never own a clock. A [`Countdown`](super::Countdown) asks a
//! [`TickScheduler`] to be notified periodically and gets back a
//! [`TickSource`] it can later cancel. The host delivers each tick by calling
//! `on_tick(source)` on the timer; the returned `bool` tells the host whether
//! the source should keep firing.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Period between two ticks of a running countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Opaque handle of one periodic registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickSource(u64);

impl TickSource {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Capability to be called back periodically.
pub trait TickScheduler: Send + Sync {
    /// Register a periodic callback firing every `period` until cancelled.
    fn schedule(&self, period: Duration) -> TickSource;

    /// Cancel a registration. Unknown or already-cancelled sources are ignored.
    fn cancel(&self, source: TickSource);
}

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    registrations: u64,
    active: BTreeMap<TickSource, Duration>,
}

/// Scheduler whose ticks are pumped by the host.
///
/// It only records which sources are armed; the host decides when a period
/// has passed (a tokio interval in the CLI, a plain loop in tests) and
/// delivers the tick to the timer.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    registry: Mutex<Registry>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The oldest armed source, if any.
    pub fn active(&self) -> Option<TickSource> {
        self.registry().active.keys().next().copied()
    }

    pub fn active_sources(&self) -> Vec<TickSource> {
        self.registry().active.keys().copied().collect()
    }

    pub fn period_of(&self, source: TickSource) -> Option<Duration> {
        self.registry().active.get(&source).copied()
    }

    pub fn is_armed(&self) -> bool {
        !self.registry().active.is_empty()
    }

    /// Total number of `schedule` calls since creation.
    pub fn registrations(&self) -> u64 {
        self.registry().registrations
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&self, period: Duration) -> TickSource {
        let mut registry = self.registry();
        registry.next_id += 1;
        registry.registrations += 1;
        let source = TickSource(registry.next_id);
        registry.active.insert(source, period);
        tracing::trace!(source = source.0, ?period, "tick source armed");
        source
    }

    fn cancel(&self, source: TickSource) {
        if self.registry().active.remove(&source).is_some() {
            tracing::trace!(source = source.0, "tick source cancelled");
        }
    }
}
