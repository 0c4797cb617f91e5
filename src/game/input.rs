//! Input Intents and Recording
//!
//! The only player input is a lane change. Intents are recorded with the
//! run-relative time they arrived so a run can be replayed exactly.

use serde::{Serialize, Deserialize};

// =============================================================================
// INTENTS
// =============================================================================

/// A lane-change request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// One lane to the left
    MoveLeft,
    /// One lane to the right
    MoveRight,
}

impl Intent {
    /// Lane delta this intent applies.
    #[inline]
    pub fn delta(self) -> i32 {
        match self {
            Intent::MoveLeft => -1,
            Intent::MoveRight => 1,
        }
    }
}

/// An intent stamped with run-relative time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedIntent {
    /// Milliseconds since the run started (excluding paused time)
    pub at_ms: u64,
    /// The intent
    pub intent: Intent,
}

impl TimedIntent {
    /// Create a timed intent.
    pub fn new(at_ms: u64, intent: Intent) -> Self {
        Self { at_ms, intent }
    }
}

// =============================================================================
// INTENT LOG
// =============================================================================

/// Ordered record of every intent applied during one run.
///
/// Together with the run seed this is everything needed to reproduce the run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntentLog {
    /// RNG seed the run started from
    pub rng_seed: u64,
    entries: Vec<TimedIntent>,
}

impl IntentLog {
    /// Create an empty log for a run.
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            entries: Vec::new(),
        }
    }

    /// Record an intent. Timestamps never go backwards.
    pub fn record(&mut self, at_ms: u64, intent: Intent) {
        let at_ms = self
            .entries
            .last()
            .map_or(at_ms, |last| at_ms.max(last.at_ms));
        self.entries.push(TimedIntent::new(at_ms, intent));
    }

    /// Recorded intents in arrival order.
    pub fn entries(&self) -> &[TimedIntent] {
        &self.entries
    }

    /// Number of recorded intents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
