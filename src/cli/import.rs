//! CLI `import` command.

use std::path::Path;

use anyhow::Result;

use reprise::card::import::{import_deck, read_deck_file, ImportCounts};
use reprise::config::RepriseConfig;

use super::open_store;

/// Load a JSON deck file. Records whose id already exists are skipped.
pub fn import(config: &RepriseConfig, file: &Path) -> Result<()> {
    let deck = read_deck_file(file)?;
    let store = open_store(config)?;

    println!(
        "Importing {} model(s), {} template(s), {} note(s) and {} card(s)...",
        deck.models.len(),
        deck.templates.len(),
        deck.notes.len(),
        deck.cards.len()
    );

    let summary = import_deck(store.conn(), &deck)?;

    println!("Import complete:");
    print_counts("Models", summary.models);
    print_counts("Templates", summary.templates);
    print_counts("Notes", summary.notes);
    print_counts("Cards", summary.cards);

    Ok(())
}

fn print_counts(label: &str, counts: ImportCounts) {
    println!("  {:<10} imported {}", format!("{label}:"), counts.imported);
    if counts.skipped > 0 {
        println!("  {:<10} skipped  {}", "", counts.skipped);
    }
}
