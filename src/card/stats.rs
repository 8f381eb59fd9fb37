//! Aggregate review statistics over a set of cards.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::card::types::Card;
use crate::srs::status::{has_status, Status};

/// Status counts. A card may count toward several labels at once
/// (a due leech is both `due` and `leech`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub total: usize,
    pub new: usize,
    pub due: usize,
    pub leech: usize,
    pub learning: usize,
    pub graduated: usize,
    /// Earliest `next_review` still in the future.
    pub next_due: Option<DateTime<Utc>>,
}

pub fn review_stats<'a>(cards: impl IntoIterator<Item = &'a Card>, now: DateTime<Utc>) -> ReviewStats {
    let mut stats = ReviewStats::default();

    for card in cards {
        stats.total += 1;
        for status in Status::ALL {
            if !has_status(&card.srs, status, now) {
                continue;
            }
            match status {
                Status::New => stats.new += 1,
                Status::Due => stats.due += 1,
                Status::Leech => stats.leech += 1,
                Status::Learning => stats.learning += 1,
                Status::Graduated => stats.graduated += 1,
            }
        }
        if let Some(at) = card.srs.next_review.filter(|at| *at > now) {
            stats.next_due = Some(stats.next_due.map_or(at, |cur| cur.min(at)));
        }
    }

    stats
}
