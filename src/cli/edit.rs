//! CLI `tag` and `mnemonic` commands.

use anyhow::{ensure, Result};

use reprise::card::store::{add_tags, remove_tags, set_mnemonic};
use reprise::config::RepriseConfig;

use super::open_store;

pub fn tag(config: &RepriseConfig, card_id: &str, add: &[String], remove: &[String]) -> Result<()> {
    ensure!(
        !add.is_empty() || !remove.is_empty(),
        "nothing to do: pass --add or --remove"
    );

    let store = open_store(config)?;
    let conn = store.conn();

    let mut tags = None;
    if !add.is_empty() {
        let add: Vec<&str> = add.iter().map(String::as_str).collect();
        tags = Some(add_tags(conn, card_id, &add)?);
    }
    if !remove.is_empty() {
        let remove: Vec<&str> = remove.iter().map(String::as_str).collect();
        tags = Some(remove_tags(conn, card_id, &remove)?);
    }

    let tags: Vec<String> = tags.unwrap_or_default().into_iter().collect();
    println!("Tags for {card_id}: {}", tags.join(" "));
    Ok(())
}

pub fn mnemonic(config: &RepriseConfig, card_id: &str, text: &str) -> Result<()> {
    let store = open_store(config)?;
    set_mnemonic(store.conn(), card_id, text)?;
    println!("Mnemonic updated for {card_id}");
    Ok(())
}
