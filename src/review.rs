//! Review sessions: pick a batch of cards and record answers.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::card::CardStore;
use crate::config::ReviewConfig;
use crate::query::parse;
use crate::srs::SrsState;

/// Tag that flags a card for extra attention during review.
pub const MARKED_TAG: &str = "marked";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCard {
    pub id: String,
    pub is_marked: bool,
}

/// An ordered batch of cards to review. Lives only in the calling process.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub cards: Vec<SessionCard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Right,
    Wrong,
    Skip,
}

impl Outcome {
    /// Level change handed to the scheduler.
    pub fn delta(&self) -> i32 {
        match self {
            Self::Right => 1,
            Self::Wrong => -1,
            Self::Skip => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Wrong => "wrong",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "right" => Ok(Self::Right),
            "wrong" => Ok(Self::Wrong),
            "skip" => Ok(Self::Skip),
            other => Err(format!("unknown outcome: {other} (expected right, wrong or skip)")),
        }
    }
}

/// Start a session over the cards matching `query`.
///
/// Fails with [`crate::query::ParseError`] when the query is overquoted.
pub fn start_session(
    store: &impl CardStore,
    query: &str,
    config: &ReviewConfig,
    now: DateTime<Utc>,
) -> Result<Session> {
    start_session_with_rng(store, query, config, now, &mut rand::thread_rng())
}

pub fn start_session_with_rng(
    store: &impl CardStore,
    query: &str,
    config: &ReviewConfig,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Result<Session> {
    let compiled = parse(query)?;
    let mut cards = store.find(&compiled, now)?;

    if config.shuffle {
        cards.shuffle(rng);
    }

    let cards: Vec<SessionCard> = cards
        .into_iter()
        .take(config.batch_size)
        .map(|card| SessionCard {
            is_marked: card.has_tag(MARKED_TAG),
            id: card.id,
        })
        .collect();

    let session = Session {
        id: uuid::Uuid::now_v7().to_string(),
        cards,
    };
    tracing::info!(session = %session.id, cards = session.cards.len(), query, "review session started");
    Ok(session)
}

/// Record one answer. Returns the card's new review state.
pub fn answer(
    store: &mut impl CardStore,
    card_id: &str,
    outcome: Outcome,
    now: DateTime<Utc>,
) -> Result<SrsState> {
    let state = store.apply(card_id, outcome.delta(), now)?;
    tracing::info!(
        card_id,
        %outcome,
        srs_level = state.srs_level,
        next_review = ?state.next_review,
        "answer recorded"
    );
    Ok(state)
}
