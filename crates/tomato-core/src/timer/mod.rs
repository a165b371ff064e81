mod countdown;
mod cycle;
mod sequence;
mod tick;

pub use countdown::Countdown;
pub use cycle::{validate_sequence, CycleSnapshot, CycleTimer, TimerState};
pub use sequence::{Phase, PhaseKind, PhaseSequence};
pub use tick::{ManualScheduler, TickScheduler, TickSource, TICK_PERIOD};
