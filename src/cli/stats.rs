//! CLI `stats` command.

use anyhow::Result;
use chrono::Utc;

use reprise::card::stats::review_stats;
use reprise::card::CardStore;
use reprise::config::RepriseConfig;

use super::{open_store, parse_query};

/// Display review statistics for the cards matching `query`.
pub fn stats(config: &RepriseConfig, query: &str) -> Result<()> {
    let store = open_store(config)?;
    let now = Utc::now();

    let cards = store.find(&parse_query(query)?, now)?;
    let stats = review_stats(&cards, now);

    println!("Review Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total cards:         {}", stats.total);
    println!("  New:                 {}", stats.new);
    println!("  Due:                 {}", stats.due);
    println!("  Learning:            {}", stats.learning);
    println!("  Graduated:           {}", stats.graduated);
    println!("  Leech:               {}", stats.leech);

    if let Some(next) = stats.next_due {
        println!();
        println!("Next review:           {}", next.to_rfc3339());
    }

    Ok(())
}
