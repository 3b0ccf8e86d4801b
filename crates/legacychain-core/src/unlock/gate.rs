use chrono::{DateTime, Utc};

use legacychain_types::unlock::{Remaining, UnlockState};

/// Evaluate unlock eligibility. Pure: same inputs, same verdict.
///
/// The unlock instant itself is already unlockable.
pub fn evaluate(now: DateTime<Utc>, unlock_at: DateTime<Utc>) -> UnlockState {
    if now >= unlock_at {
        UnlockState::Unlockable
    } else {
        UnlockState::Locked {
            remaining: Remaining::from_duration(unlock_at - now),
        }
    }
}
