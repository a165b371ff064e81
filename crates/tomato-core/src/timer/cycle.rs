//! Self-perpetuating work/break cycle.
//!
//! The cycle owns a [`PhaseSequence`] and exactly one live [`Countdown`]
//! built from the sequence's current entry. When that countdown ends, the
//! cycle advances the sequence, announces the next phase, builds a fresh
//! countdown and starts it, all before the tick that ended the phase
//! returns.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           +-- ended -> next phase -> Running
//! any --reset--> Idle (first phase)
//! ```
//!
//! Subscribers register once on the cycle; events of whichever countdown is
//! active are forwarded through the cycle's own bus.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::countdown::Countdown;
use super::sequence::{Phase, PhaseSequence};
use super::tick::{TickScheduler, TickSource};
use crate::error::{EmptySequenceError, Result, ValidationError};
use crate::events::{CountdownEvent, CycleEvent, EventBus, SubscriptionId};
use crate::storage::CycleSettings;

/// State of the active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Point-in-time view of a cycle, for rendering or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleSnapshot {
    pub state: TimerState,
    pub phase: Phase,
    pub phase_index: usize,
    pub phase_count: usize,
    pub elapsed: u64,
    pub remaining: u64,
    pub time: String,
    pub completed_phases: u64,
    pub at: DateTime<Utc>,
}

pub struct CycleTimer {
    sequence: PhaseSequence,
    phase: Phase,
    countdown: Countdown,
    scheduler: Arc<dyn TickScheduler>,
    events: EventBus<CycleEvent>,
    completed_phases: u64,
}

impl CycleTimer {
    /// Build a cycle positioned on the sequence's current entry.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::EmptySequence` for an empty sequence and
    /// `ValidationError::ZeroLengthCycle` when every phase lasts zero
    /// seconds. Nothing is registered with the scheduler either way.
    pub fn new(sequence: PhaseSequence, scheduler: Arc<dyn TickScheduler>) -> Result<Self> {
        validate_sequence(&sequence)?;
        let phase = *sequence.current()?;
        let countdown = Countdown::new(phase.duration, Arc::clone(&scheduler));
        tracing::debug!(phases = sequence.len(), kind = ?phase.kind, "cycle created");
        Ok(Self {
            sequence,
            phase,
            countdown,
            scheduler,
            events: EventBus::new(),
            completed_phases: 0,
        })
    }

    pub fn from_settings(
        settings: &CycleSettings,
        scheduler: Arc<dyn TickScheduler>,
    ) -> Result<Self> {
        Self::new(settings.sequence(), scheduler)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        if self.countdown.is_started() {
            TimerState::Running
        } else if self.countdown.is_paused() {
            TimerState::Paused
        } else {
            TimerState::Idle
        }
    }

    pub fn is_started(&self) -> bool {
        self.countdown.is_started()
    }

    pub fn is_paused(&self) -> bool {
        self.countdown.is_paused()
    }

    pub fn duration(&self) -> u64 {
        self.countdown.duration()
    }

    pub fn elapsed(&self) -> u64 {
        self.countdown.elapsed()
    }

    pub fn remaining(&self) -> u64 {
        self.countdown.remaining()
    }

    pub fn time(&self) -> String {
        self.countdown.time()
    }

    pub fn current_phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_index(&self) -> usize {
        self.sequence.position()
    }

    pub fn sequence(&self) -> &PhaseSequence {
        &self.sequence
    }

    /// Phase boundaries crossed since construction or the last reset.
    pub fn completed_phases(&self) -> u64 {
        self.completed_phases
    }

    /// Tick source of the active countdown, if running.
    pub fn tick_source(&self) -> Option<TickSource> {
        self.countdown.tick_source()
    }

    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot {
            state: self.state(),
            phase: self.phase,
            phase_index: self.phase_index(),
            phase_count: self.sequence.len(),
            elapsed: self.elapsed(),
            remaining: self.remaining(),
            time: self.time(),
            completed_phases: self.completed_phases,
            at: Utc::now(),
        }
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&CycleEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) {
        tracing::debug!(kind = ?self.phase.kind, elapsed = self.elapsed(), "start");
        let mut emitted = Vec::new();
        self.countdown.start_into(&mut emitted);
        self.dispatch(emitted);
    }

    /// Stop the active phase, keeping the position in the sequence.
    pub fn stop(&mut self) {
        tracing::debug!(kind = ?self.phase.kind, "stop");
        self.countdown.stop();
    }

    pub fn pause(&mut self) {
        tracing::debug!(kind = ?self.phase.kind, elapsed = self.elapsed(), "pause");
        self.countdown.pause();
    }

    pub fn unpause(&mut self) {
        tracing::debug!(kind = ?self.phase.kind, elapsed = self.elapsed(), "unpause");
        let mut emitted = Vec::new();
        self.countdown.unpause_into(&mut emitted);
        self.dispatch(emitted);
    }

    /// Play/pause button: pause when running, resume when paused, start
    /// otherwise.
    pub fn toggle(&mut self) {
        match self.state() {
            TimerState::Running => self.pause(),
            TimerState::Paused => self.unpause(),
            TimerState::Idle => self.start(),
        }
    }

    /// Rewind to the first phase with a fresh, idle countdown.
    pub fn reset(&mut self) {
        tracing::debug!("reset");
        self.sequence.rewind();
        self.rebuild_idle();
    }

    /// Replace the phases. Validation happens first; on error the running
    /// cycle is left untouched.
    ///
    /// # Errors
    ///
    /// Same as [`CycleTimer::new`].
    pub fn reconfigure<I>(&mut self, phases: I) -> Result<()>
    where
        I: IntoIterator<Item = Phase>,
    {
        let replacement: PhaseSequence = phases.into_iter().collect();
        validate_sequence(&replacement)?;

        self.countdown.stop();
        self.sequence.flush();
        for phase in replacement.iter() {
            self.sequence.add(phase.kind, phase.duration);
        }
        tracing::debug!(phases = self.sequence.len(), "reconfigured");
        self.rebuild_idle();
        Ok(())
    }

    /// Deliver one tick from `source`. See [`Countdown::on_tick`].
    pub fn on_tick(&mut self, source: TickSource) -> bool {
        let mut emitted = Vec::new();
        let keep_going = self.countdown.tick_into(source, &mut emitted);
        self.dispatch(emitted);
        keep_going
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn rebuild_idle(&mut self) {
        self.completed_phases = 0;
        let phase = match self.sequence.current() {
            Ok(phase) => *phase,
            Err(err) => {
                // new/reconfigure reject empty sequences.
                tracing::error!(%err, "cycle has no phase to reset to");
                self.countdown.reset();
                return;
            }
        };
        self.install(phase);
        self.countdown.reset();
        self.events.emit(&CycleEvent::Reset {
            kind: self.phase.kind,
            duration: self.phase.duration,
        });
    }

    fn install(&mut self, phase: Phase) {
        self.phase = phase;
        // Replacing the countdown drops the old one, which cancels its source.
        self.countdown = Countdown::new(phase.duration, Arc::clone(&self.scheduler));
    }

    /// Forward countdown events, crossing phase boundaries as they come.
    fn dispatch(&mut self, emitted: Vec<CountdownEvent>) {
        let mut pending = VecDeque::from(emitted);
        while let Some(event) = pending.pop_front() {
            match event {
                CountdownEvent::Start => self.events.emit(&CycleEvent::Start {
                    kind: self.phase.kind,
                    duration: self.phase.duration,
                    remaining: self.countdown.remaining(),
                }),
                CountdownEvent::Increment { elapsed, remaining } => {
                    self.events.emit(&CycleEvent::Increment { elapsed, remaining })
                }
                CountdownEvent::Ended => {
                    self.events.emit(&CycleEvent::Ended {
                        kind: self.phase.kind,
                    });
                    let next = match self.sequence.advance() {
                        Ok(phase) => *phase,
                        Err(err) => {
                            tracing::error!(%err, "cannot advance cycle");
                            return;
                        }
                    };
                    self.completed_phases += 1;
                    tracing::debug!(
                        kind = ?next.kind,
                        duration = next.duration,
                        index = self.sequence.position(),
                        "next phase"
                    );
                    self.events.emit(&CycleEvent::NextTransitionStarted {
                        kind: next.kind,
                        duration: next.duration,
                    });
                    self.install(next);
                    let mut started = Vec::new();
                    self.countdown.start_into(&mut started);
                    pending.extend(started);
                }
            }
        }
    }
}

/// Check that `sequence` can drive a cycle: non-empty, with at least one
/// phase of non-zero length.
///
/// # Errors
///
/// Same as [`CycleTimer::new`].
pub fn validate_sequence(sequence: &PhaseSequence) -> Result<()> {
    if sequence.is_empty() {
        return Err(EmptySequenceError.into());
    }
    if sequence.total_duration() == 0 {
        return Err(ValidationError::ZeroLengthCycle.into());
    }
    Ok(())
}

impl std::fmt::Debug for CycleTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleTimer")
            .field("sequence", &self.sequence)
            .field("phase", &self.phase)
            .field("countdown", &self.countdown)
            .field("events", &self.events)
            .field("completed_phases", &self.completed_phases)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::timer::{ManualScheduler, PhaseKind};
    use std::sync::Mutex;

    fn cycle(phases: &[(PhaseKind, u64)]) -> (CycleTimer, Arc<ManualScheduler>) {
        let scheduler = Arc::new(ManualScheduler::new());
        let sequence = phases.iter().map(|&(k, d)| Phase::new(k, d)).collect();
        let timer = CycleTimer::new(sequence, scheduler.clone()).unwrap();
        (timer, scheduler)
    }

    fn tick(timer: &mut CycleTimer, scheduler: &ManualScheduler) -> bool {
        let source = scheduler.active().expect("no armed source");
        timer.on_tick(source)
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let scheduler = Arc::new(ManualScheduler::new());
        let err = CycleTimer::new(PhaseSequence::new(), scheduler.clone()).unwrap_err();
        assert!(matches!(err, CoreError::EmptySequence(_)));
        assert_eq!(scheduler.registrations(), 0);
    }

    #[test]
    fn all_zero_phases_are_rejected() {
        let scheduler = Arc::new(ManualScheduler::new());
        let mut sequence = PhaseSequence::new();
        sequence.add(PhaseKind::Focus, 0).add(PhaseKind::ShortBreak, 0);
        let err = CycleTimer::new(sequence, scheduler).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::ZeroLengthCycle)
        ));
    }

    #[test]
    fn toggle_walks_play_pause_states() {
        let (mut timer, _scheduler) = cycle(&[(PhaseKind::Focus, 10)]);
        assert_eq!(timer.state(), TimerState::Idle);
        timer.toggle();
        assert_eq!(timer.state(), TimerState::Running);
        timer.toggle();
        assert_eq!(timer.state(), TimerState::Paused);
        timer.toggle();
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn stop_keeps_phase_reset_rewinds() {
        let (mut timer, scheduler) =
            cycle(&[(PhaseKind::Focus, 1), (PhaseKind::ShortBreak, 5)]);
        timer.start();
        tick(&mut timer, &scheduler);
        tick(&mut timer, &scheduler);
        assert_eq!(timer.current_phase().kind, PhaseKind::ShortBreak);

        timer.stop();
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.current_phase().kind, PhaseKind::ShortBreak);
        assert_eq!(timer.elapsed(), 1);

        timer.start();
        assert_eq!(timer.elapsed(), 1);
        assert_eq!(timer.current_phase().kind, PhaseKind::ShortBreak);

        timer.reset();
        assert_eq!(timer.current_phase().kind, PhaseKind::Focus);
        assert_eq!(timer.phase_index(), 0);
        assert_eq!(timer.elapsed(), 0);
        assert_eq!(timer.completed_phases(), 0);
        assert!(!timer.is_started());
        assert!(!timer.is_paused());
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn zero_length_phase_is_skipped_through() {
        let (mut timer, scheduler) = cycle(&[
            (PhaseKind::Focus, 1),
            (PhaseKind::ShortBreak, 0),
            (PhaseKind::LongBreak, 2),
        ]);
        timer.start();
        assert!(!tick(&mut timer, &scheduler));
        assert_eq!(timer.current_phase().kind, PhaseKind::LongBreak);
        assert_eq!(timer.completed_phases(), 2);
        assert!(timer.is_started());
        assert_eq!(scheduler.active_sources().len(), 1);
    }

    #[test]
    fn subscribers_survive_phase_transitions() {
        let (mut timer, scheduler) =
            cycle(&[(PhaseKind::Focus, 1), (PhaseKind::ShortBreak, 1)]);
        let count = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&count);
        timer.subscribe(move |e| {
            if matches!(e, CycleEvent::NextTransitionStarted { .. }) {
                *counter.lock().unwrap() += 1;
            }
        });

        timer.start();
        for _ in 0..6 {
            tick(&mut timer, &scheduler);
        }

        assert_eq!(*count.lock().unwrap(), 6);
        assert_eq!(timer.subscriber_count(), 1);
        assert_eq!(scheduler.active_sources().len(), 1);
    }

    #[test]
    fn reconfigure_replaces_phases() {
        let (mut timer, scheduler) = cycle(&[(PhaseKind::Focus, 5)]);
        timer.start();
        tick(&mut timer, &scheduler);

        timer
            .reconfigure([
                Phase::new(PhaseKind::ShortBreak, 3),
                Phase::new(PhaseKind::LongBreak, 4),
            ])
            .unwrap();

        assert_eq!(timer.sequence().len(), 2);
        assert_eq!(timer.current_phase(), &Phase::new(PhaseKind::ShortBreak, 3));
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.elapsed(), 0);
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn failed_reconfigure_leaves_cycle_running() {
        let (mut timer, scheduler) = cycle(&[(PhaseKind::Focus, 5)]);
        timer.start();
        tick(&mut timer, &scheduler);

        assert!(timer.reconfigure(Vec::new()).is_err());
        assert!(timer.is_started());
        assert_eq!(timer.elapsed(), 1);
        assert_eq!(timer.sequence().len(), 1);
    }

    #[test]
    fn snapshot_reflects_state() {
        let (mut timer, scheduler) =
            cycle(&[(PhaseKind::Focus, 65), (PhaseKind::ShortBreak, 5)]);
        timer.start();
        tick(&mut timer, &scheduler);
        let snap = timer.snapshot();
        assert_eq!(snap.state, TimerState::Running);
        assert_eq!(snap.phase.kind, PhaseKind::Focus);
        assert_eq!(snap.phase_count, 2);
        assert_eq!(snap.elapsed, 1);
        assert_eq!(snap.remaining, 64);
        assert_eq!(snap.time, "1:04");
    }

    #[test]
    fn cycle_timer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CycleTimer>();
    }
}
