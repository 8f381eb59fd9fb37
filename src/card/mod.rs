//! Card storage.
//!
//! [`CardStore`] is the seam the review loop works against. [`SqliteCardStore`]
//! is the persistent implementation, [`MemoryCardStore`] evaluates predicates
//! in memory and is handy for tests and one-off imports.

pub mod content;
pub mod import;
pub mod notes;
pub mod search;
pub mod stats;
pub mod store;
pub mod types;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db;
use crate::query::{AttributeIndex, CompiledQuery, Subject};
use crate::srs::{self, SrsState};
pub use types::{Card, Model, Template};

pub trait CardStore {
    fn get(&self, card_id: &str) -> Result<Option<Card>>;

    /// Every card matching `query`, resolved against `now`.
    fn find(&self, query: &CompiledQuery, now: DateTime<Utc>) -> Result<Vec<Card>>;

    /// Replace a card's review state.
    fn update(&mut self, card_id: &str, state: &SrsState) -> Result<()>;

    /// Schedule one answer and persist the result.
    fn apply(&mut self, card_id: &str, delta: i32, now: DateTime<Utc>) -> Result<SrsState> {
        let Some(card) = self.get(card_id)? else {
            bail!("card not found: {card_id}");
        };
        let next = srs::advance(&card.srs, delta, now);
        self.update(card_id, &next)?;
        Ok(next)
    }
}

pub struct SqliteCardStore {
    conn: Connection,
}

impl SqliteCardStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(db::open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(db::open_memory_database()?))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl CardStore for SqliteCardStore {
    fn get(&self, card_id: &str) -> Result<Option<Card>> {
        store::get_card(&self.conn, card_id)
    }

    fn find(&self, query: &CompiledQuery, now: DateTime<Utc>) -> Result<Vec<Card>> {
        search::find_cards(&self.conn, query, search::Page::default(), now)
    }

    fn update(&mut self, card_id: &str, state: &SrsState) -> Result<()> {
        store::update_srs(&self.conn, card_id, state)
    }

    fn apply(&mut self, card_id: &str, delta: i32, now: DateTime<Utc>) -> Result<SrsState> {
        store::apply_review(&mut self.conn, card_id, delta, now)
    }
}

impl AttributeIndex for SqliteCardStore {
    fn matches(&self, note_id: &str, key: Option<&str>, text: &str) -> bool {
        notes::SqliteAttributeIndex::new(&self.conn).matches(note_id, key, text)
    }
}

/// Cards, templates and note attributes held in memory.
///
/// Queries run through [`crate::query::Predicate::eval`]; attribute text
/// matching is a case-insensitive substring test.
#[derive(Debug, Default)]
pub struct MemoryCardStore {
    cards: BTreeMap<String, Card>,
    templates: BTreeMap<String, Template>,
    models: BTreeMap<String, Model>,
    attributes: BTreeMap<(String, String), String>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_card(&mut self, card: Card) {
        self.cards.insert(card.id.clone(), card);
    }

    pub fn insert_template(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn insert_model(&mut self, model: Model) {
        self.models.insert(model.id.clone(), model);
    }

    pub fn put_attribute(&mut self, note_id: &str, key: &str, data: &str) {
        self.attributes
            .insert((note_id.to_string(), key.to_string()), data.to_string());
    }

    fn subject<'a>(&'a self, card: &'a Card) -> Subject<'a> {
        let template = card
            .template_id
            .as_deref()
            .and_then(|id| self.templates.get(id));
        let model = template
            .and_then(|t| t.model_id.as_deref())
            .and_then(|id| self.models.get(id));
        Subject {
            card,
            template,
            model,
        }
    }
}

impl CardStore for MemoryCardStore {
    fn get(&self, card_id: &str) -> Result<Option<Card>> {
        Ok(self.cards.get(card_id).cloned())
    }

    fn find(&self, query: &CompiledQuery, now: DateTime<Utc>) -> Result<Vec<Card>> {
        let mut cards: Vec<Card> = self
            .cards
            .values()
            .filter(|card| query.predicate.eval(&self.subject(card), self, now))
            .cloned()
            .collect();
        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(cards)
    }

    fn update(&mut self, card_id: &str, state: &SrsState) -> Result<()> {
        let Some(card) = self.cards.get_mut(card_id) else {
            bail!("card not found: {card_id}");
        };
        card.srs = state.clone();
        card.updated_at = Utc::now();
        Ok(())
    }
}

impl AttributeIndex for MemoryCardStore {
    fn matches(&self, note_id: &str, key: Option<&str>, text: &str) -> bool {
        let needle = text.to_lowercase();
        self.attributes.iter().any(|((id, k), data)| {
            id == note_id
                && key.map_or(true, |key| key == k)
                && data.to_lowercase().contains(&needle)
        })
    }
}
