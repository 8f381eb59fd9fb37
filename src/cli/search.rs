//! CLI `search` command: list the cards matching a query.

use anyhow::Result;
use chrono::Utc;

use reprise::card::content::{stored_side, Side};
use reprise::card::search::{count_cards, find_cards, Page};
use reprise::config::RepriseConfig;

use super::{open_store, parse_query, preview};

/// List the cards matching `query`.
pub fn search(config: &RepriseConfig, query: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let conn = store.conn();
    let now = Utc::now();

    let compiled = parse_query(query)?;
    let page = Page::first(limit.unwrap_or(config.search.default_limit));
    let cards = find_cards(conn, &compiled, page, now)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    if cards.is_empty() {
        println!("No cards found.");
        return Ok(());
    }

    let total = count_cards(conn, &compiled, now)?;
    println!("Showing {} of {} card(s)\n", cards.len(), total);

    for (i, card) in cards.iter().enumerate() {
        let front = stored_side(conn, card, Side::Front)?;

        let status: Vec<&str> = card.status(now).iter().map(|s| s.as_str()).collect();
        let tags: Vec<&str> = card.tag.iter().map(String::as_str).collect();

        println!(
            "  {}. {} [{}] level {}",
            i + 1,
            card.id,
            status.join(", "),
            card.srs.srs_level,
        );
        if !front.is_empty() {
            println!("     {}", preview(&front, 80));
        }
        if !tags.is_empty() {
            println!("     tags: {}", tags.join(" "));
        }
        println!();
    }

    Ok(())
}
