use serde::{Deserialize, Serialize};

use crate::error::EmptySequenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl PhaseKind {
    pub fn label(self) -> &'static str {
        match self {
            PhaseKind::Focus => "Focus",
            PhaseKind::ShortBreak => "Short Break",
            PhaseKind::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, PhaseKind::Focus)
    }
}

/// One timed segment of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    /// Duration in seconds.
    pub duration: u64,
}

impl Phase {
    pub fn new(kind: PhaseKind, duration: u64) -> Self {
        Self { kind, duration }
    }
}

/// Ordered, cyclic list of phases with a cursor.
///
/// Entries are traversed strictly in insertion order; advancing past the
/// last entry wraps to the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSequence {
    phases: Vec<Phase>,
    cursor: usize,
}

impl PhaseSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: PhaseKind, duration: u64) -> &mut Self {
        self.phases.push(Phase::new(kind, duration));
        self
    }

    /// Move to the next entry, wrapping around, and return it.
    pub fn advance(&mut self) -> Result<&Phase, EmptySequenceError> {
        if self.phases.is_empty() {
            return Err(EmptySequenceError);
        }
        self.cursor = (self.cursor + 1) % self.phases.len();
        Ok(&self.phases[self.cursor])
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Drop every entry. Only meant for a full reconfiguration.
    pub fn flush(&mut self) {
        self.rewind();
        self.phases.clear();
    }

    pub fn current(&self) -> Result<&Phase, EmptySequenceError> {
        self.phases.get(self.cursor).ok_or(EmptySequenceError)
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter()
    }

    /// Sum of all phase durations in seconds.
    pub fn total_duration(&self) -> u64 {
        self.phases
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.duration))
    }
}

impl FromIterator<Phase> for PhaseSequence {
    fn from_iter<I: IntoIterator<Item = Phase>>(iter: I) -> Self {
        Self {
            phases: iter.into_iter().collect(),
            cursor: 0,
        }
    }
}
