//! # Tomato Core Library
//!
//! This library provides the timing logic of the Tomato pomodoro timer: a
//! repeating, multi-phase countdown that advances through a cyclic
//! work/break sequence on its own. Rendering, sound and desktop
//! notifications belong to the host (see the `tomato-cli` crate).
//!
//! ## Architecture
//!
//! - **Countdown**: single-phase timer counting ticks against a duration
//! - **PhaseSequence**: ordered, cyclic list of phases with a cursor
//! - **CycleTimer**: chains countdowns across phase boundaries forever
//! - **Tick scheduling**: the clock is injected through [`TickScheduler`];
//!   the host calls `on_tick` whenever a registered source fires
//! - **Storage**: TOML-based configuration producing [`CycleSettings`]
//!
//! ## Usage
//!
//! ```ignore
//! let scheduler = Arc::new(ManualScheduler::new());
//! let mut cycle = CycleTimer::new(sequence, scheduler.clone())?;
//! cycle.subscribe(|event| println!("{event:?}"));
//! cycle.start();
//! // Whenever a second has passed:
//! if let Some(source) = scheduler.active() {
//!     cycle.on_tick(source);
//! }
//! ```

pub mod error;
pub mod events;
pub mod format;
pub mod notify;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, EmptySequenceError, Result, ValidationError};
pub use events::{CountdownEvent, CycleEvent, EventBus, SubscriptionId};
pub use format::{format_clock, prettify_duration};
pub use notify::Notification;
pub use storage::{Config, CycleSettings};
pub use timer::{
    Countdown, CycleSnapshot, CycleTimer, ManualScheduler, Phase, PhaseKind, PhaseSequence,
    TickScheduler, TickSource, TimerState, TICK_PERIOD, validate_sequence,
};
