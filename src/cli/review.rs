//! CLI `review` and `answer` commands.

use anyhow::Result;
use chrono::Utc;

use reprise::config::RepriseConfig;
use reprise::review::{self, Outcome};

use super::open_store;

/// Start a review session and print its cards in order.
pub fn review(config: &RepriseConfig, query: &str) -> Result<()> {
    let store = open_store(config)?;
    let session = review::start_session(&store, query, &config.review, Utc::now())?;

    if session.cards.is_empty() {
        println!("Nothing to review.");
        return Ok(());
    }

    println!("Session {} ({} card(s))\n", session.id, session.cards.len());
    for (i, card) in session.cards.iter().enumerate() {
        let mark = if card.is_marked { " *" } else { "" };
        println!("  {}. {}{}", i + 1, card.id, mark);
    }

    Ok(())
}

pub fn answer(config: &RepriseConfig, card_id: &str, outcome: Outcome) -> Result<()> {
    let mut store = open_store(config)?;
    let state = review::answer(&mut store, card_id, outcome, Utc::now())?;

    println!("Recorded {outcome} for {card_id}");
    println!("  Level:          {}", state.srs_level);
    if let Some(next) = state.next_review {
        println!("  Next review:    {}", next.to_rfc3339());
    }
    println!("  Right streak:   {}", state.right_streak);
    println!("  Wrong streak:   {}", state.wrong_streak);

    Ok(())
}
