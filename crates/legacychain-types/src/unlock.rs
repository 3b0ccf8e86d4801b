//! Unlock gate verdict types.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Time left until a will unlocks, split for display.
///
/// Each component is floored independently from the total, never rounded:
/// 25h59m59s is 1 day, 1 hour, 59 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub total_seconds: i64,
}

impl Remaining {
    /// Decompose a positive duration. Negative durations clamp to zero.
    pub fn from_duration(duration: Duration) -> Self {
        let total_seconds = duration.num_seconds().max(0);
        Self {
            days: total_seconds / 86_400,
            hours: (total_seconds / 3_600) % 24,
            minutes: (total_seconds / 60) % 60,
            total_seconds,
        }
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} days {} hours {} minutes",
            self.days, self.hours, self.minutes
        )
    }
}

/// Verdict of the unlock gate at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum UnlockState {
    Locked { remaining: Remaining },
    Unlockable,
}

impl UnlockState {
    pub fn is_unlockable(&self) -> bool {
        matches!(self, UnlockState::Unlockable)
    }

    /// Remaining time when locked.
    pub fn remaining(&self) -> Option<Remaining> {
        match self {
            UnlockState::Locked { remaining } => Some(*remaining),
            UnlockState::Unlockable => None,
        }
    }
}
