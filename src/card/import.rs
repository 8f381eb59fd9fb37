//! Bulk load of models, templates, notes and cards from a JSON deck file.
//!
//! Records keep the ids given in the file. Records whose id already exists
//! are skipped, so importing the same file twice is harmless. Everything is
//! written in one transaction.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::card::notes::write_attribute;
use crate::card::store::{
    insert_card_with_id, insert_model_with_id, insert_template_with_id, update_srs, NewCard,
    NewModel, NewTemplate,
};
use crate::srs::SrsState;

/// Import file format.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckFile {
    #[serde(default)]
    pub models: Vec<ModelRecord>,
    #[serde(default)]
    pub templates: Vec<TemplateRecord>,
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
    #[serde(default)]
    pub cards: Vec<CardRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
    #[serde(default)]
    pub shared: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
    #[serde(default)]
    pub shared: String,
}

/// A note and its attributes, keyed by attribute name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub note_id: Option<String>,
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
    #[serde(default)]
    pub shared: String,
    #[serde(default)]
    pub mnemonic: String,
    #[serde(default)]
    pub tag: Vec<String>,
    /// Review state to carry over. Absent means a new card.
    #[serde(default)]
    pub srs: Option<SrsState>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub imported: usize,
    /// Already present, or pointing at a template or model that does not exist.
    pub skipped: usize,
}

impl ImportCounts {
    fn record(&mut self, imported: bool) {
        if imported {
            self.imported += 1;
        } else {
            self.skipped += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub models: ImportCounts,
    pub templates: ImportCounts,
    pub notes: ImportCounts,
    pub cards: ImportCounts,
}

pub fn read_deck_file(path: &Path) -> Result<DeckFile> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read import file: {}", path.display()))?;
    serde_json::from_str(&json).context("failed to parse import JSON")
}

fn exists(conn: &Connection, table: &str, column: &str, id: &str) -> Result<bool> {
    let found: bool = conn.query_row(
        &format!("SELECT COUNT(*) > 0 FROM {table} WHERE {column} = ?1"),
        params![id],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Write `deck` in one transaction. Any database error rolls back the whole import.
pub fn import_deck(conn: &Connection, deck: &DeckFile) -> Result<ImportSummary> {
    let tx = conn.unchecked_transaction()?;
    let mut summary = ImportSummary::default();

    for model in &deck.models {
        let fresh = !exists(&tx, "model", "id", &model.id)?;
        if fresh {
            insert_model_with_id(
                &tx,
                &model.id,
                &NewModel {
                    name: model.name.clone(),
                    front: model.front.clone(),
                    back: model.back.clone(),
                    shared: model.shared.clone(),
                },
            )?;
        }
        summary.models.record(fresh);
    }

    for template in &deck.templates {
        let mut fresh = !exists(&tx, "template", "id", &template.id)?;
        if let (true, Some(model_id)) = (fresh, template.model_id.as_deref()) {
            if !exists(&tx, "model", "id", model_id)? {
                tracing::warn!(template_id = %template.id, model_id, "skipping template with unknown model");
                fresh = false;
            }
        }
        if fresh {
            insert_template_with_id(
                &tx,
                &template.id,
                &NewTemplate {
                    name: template.name.clone(),
                    model_id: template.model_id.clone(),
                    front: template.front.clone(),
                    back: template.back.clone(),
                    shared: template.shared.clone(),
                },
            )?;
        }
        summary.templates.record(fresh);
    }

    for note in &deck.notes {
        let fresh = !exists(&tx, "note", "note_id", &note.id)?;
        if fresh {
            for (key, data) in &note.data {
                write_attribute(&tx, &note.id, key, data)?;
            }
        }
        summary.notes.record(fresh);
    }

    for card in &deck.cards {
        let mut fresh = !exists(&tx, "card", "id", &card.id)?;
        if let (true, Some(template_id)) = (fresh, card.template_id.as_deref()) {
            if !exists(&tx, "template", "id", template_id)? {
                tracing::warn!(card_id = %card.id, template_id, "skipping card with unknown template");
                fresh = false;
            }
        }
        if fresh {
            insert_card_with_id(
                &tx,
                &card.id,
                &NewCard {
                    template_id: card.template_id.clone(),
                    note_id: card.note_id.clone(),
                    front: card.front.clone(),
                    back: card.back.clone(),
                    shared: card.shared.clone(),
                    mnemonic: card.mnemonic.clone(),
                    tags: card.tag.clone(),
                },
            )?;
            if let Some(state) = &card.srs {
                update_srs(&tx, &card.id, state)?;
            }
        }
        summary.cards.record(fresh);
    }

    tx.commit()?;
    tracing::info!(
        cards = summary.cards.imported,
        skipped = summary.cards.skipped,
        "deck imported"
    );
    Ok(summary)
}
