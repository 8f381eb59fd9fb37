//! CLI `show` command: print a card's resolved content.

use anyhow::Result;

use reprise::card::content::{stored_side, Side};
use reprise::card::store::require_card;
use reprise::config::RepriseConfig;

use super::open_store;

/// Print one side of a card, or every side plus the mnemonic when `side` is `None`.
pub fn show(config: &RepriseConfig, card_id: &str, side: Option<Side>) -> Result<()> {
    let store = open_store(config)?;
    let conn = store.conn();
    let card = require_card(conn, card_id)?;

    if let Some(side) = side {
        println!("{}", stored_side(conn, &card, side)?);
        return Ok(());
    }

    for side in [Side::Front, Side::Back, Side::Shared] {
        let text = stored_side(conn, &card, side)?;
        if !text.is_empty() {
            println!("[{side}]\n{text}\n");
        }
    }
    if !card.mnemonic.is_empty() {
        println!("[mnemonic]\n{}", card.mnemonic);
    }
    Ok(())
}
