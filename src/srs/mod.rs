//! Spaced-repetition leveling.
//!
//! A card climbs a fixed ladder of review intervals when answered right and
//! slides down when answered wrong. [`advance`] is a pure function of the
//! previous state, the answer delta and the clock; persisting its result is
//! the caller's job (see `card::store::apply_review`).

pub mod status;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Review intervals in hours, one per level: 4h, 8h, 24h, 3d, 7d, 2w, 4w, 16w.
pub const LADDER_HOURS: [i64; 8] = [4, 8, 24, 3 * 24, 7 * 24, 14 * 24, 28 * 24, 112 * 24];

/// Highest reachable level.
pub const MAX_LEVEL: u32 = LADDER_HOURS.len() as u32 - 1;

/// Interval used when a card is pushed below level 0.
pub const FALLBACK_INTERVAL_HOURS: i64 = 1;

/// Review-state fields of a card. Applying a value replaces all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrsState {
    pub srs_level: u32,
    /// `None` means the card has never been scheduled.
    pub next_review: Option<DateTime<Utc>>,
    pub last_right: Option<DateTime<Utc>>,
    pub last_wrong: Option<DateTime<Utc>>,
    pub right_streak: u32,
    pub wrong_streak: u32,
    pub max_right: u32,
    pub max_wrong: u32,
}

/// Interval for a ladder rung. Levels past the top use the top rung.
pub fn interval_for(level: u32) -> Duration {
    let idx = level.min(MAX_LEVEL) as usize;
    Duration::hours(LADDER_HOURS[idx])
}

/// Compute the state after one answer.
///
/// `delta > 0` is a right answer, `delta < 0` a wrong one; `0` leaves
/// streaks and timestamps alone but still reschedules from the current level.
/// A right answer does not reset the wrong streak.
pub fn advance(state: &SrsState, delta: i32, now: DateTime<Utc>) -> SrsState {
    let mut next = state.clone();

    if delta > 0 {
        next.last_right = Some(now);
        next.right_streak += 1;
        next.max_right = next.max_right.max(next.right_streak);
    } else if delta < 0 {
        next.last_wrong = Some(now);
        next.wrong_streak += 1;
        next.max_wrong = next.max_wrong.max(next.wrong_streak);
    }

    let raw = i64::from(state.srs_level) + i64::from(delta);
    next.srs_level = raw.clamp(0, i64::from(MAX_LEVEL)) as u32;

    next.next_review = Some(if raw < 0 {
        now + Duration::hours(FALLBACK_INTERVAL_HOURS)
    } else {
        now + interval_for(next.srs_level)
    });

    next
}
