//! Notification content for phase boundaries.
//!
//! Only the text lives here; showing it (desktop notification, bell, sound
//! file) is up to the host.

use serde::{Deserialize, Serialize};

use crate::format::prettify_duration;
use crate::timer::{Phase, PhaseKind};

pub const TRANSITION_SUMMARY: &str = "Cycle is ended";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub summary: String,
    pub body: String,
}

impl Notification {
    /// Announce the phase that just started.
    pub fn for_transition(phase: &Phase) -> Self {
        let duration = prettify_duration(phase.duration);
        let body = match phase.kind {
            PhaseKind::Focus => format!("Enjoy the incoming {duration} focus time!"),
            PhaseKind::ShortBreak => format!("{duration} short break!"),
            PhaseKind::LongBreak => format!("{duration} long break!"),
        };
        Self {
            summary: TRANSITION_SUMMARY.to_string(),
            body,
        }
    }
}
