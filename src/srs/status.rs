//! Derived review status.
//!
//! Status is always computed from [`SrsState`] and the current time. There
//! is no stored copy to drift out of date.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SrsState;

/// Highest level still considered "learning".
pub const LEARNING_MAX_LEVEL: u32 = 3;

/// Wrong streak above which a card is a leech.
pub const LEECH_WRONG_STREAK: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    New,
    Due,
    Leech,
    Learning,
    Graduated,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Self::New,
        Self::Due,
        Self::Leech,
        Self::Learning,
        Self::Graduated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Due => "due",
            Self::Leech => "leech",
            Self::Learning => "learning",
            Self::Graduated => "graduated",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "due" => Ok(Self::Due),
            "leech" => Ok(Self::Leech),
            "learning" => Ok(Self::Learning),
            "graduated" => Ok(Self::Graduated),
            _ => Err(format!("unknown status: {s}")),
        }
    }
}

/// Whether a single status label applies.
pub fn has_status(state: &SrsState, status: Status, now: DateTime<Utc>) -> bool {
    match status {
        Status::New => state.next_review.is_none(),
        Status::Due => state.next_review.is_some_and(|at| at <= now),
        Status::Leech => state.wrong_streak > LEECH_WRONG_STREAK,
        Status::Graduated => state.srs_level > LEARNING_MAX_LEVEL,
        Status::Learning => {
            state.srs_level <= LEARNING_MAX_LEVEL && state.next_review.is_some()
        }
    }
}

pub fn derive_status(state: &SrsState, now: DateTime<Utc>) -> BTreeSet<Status> {
    Status::ALL
        .into_iter()
        .filter(|s| has_status(state, *s, now))
        .collect()
}
