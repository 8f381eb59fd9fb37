//! Note attributes: free-form key/value data shared by the cards of a note.
//!
//! Values are indexed in the `note_fts` FTS5 table. The table uses external
//! content, so every write to `note` syncs the index by hand.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::card::types::timestamp_to_sql;
use crate::query::sql::fts_phrase;
use crate::query::AttributeIndex;

/// Set `key` on `note_id`, replacing any previous value.
pub fn put_attribute(conn: &Connection, note_id: &str, key: &str, data: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    write_attribute(&tx, note_id, key, data)?;
    tx.commit()?;
    tracing::debug!(note_id, key, "note attribute stored");
    Ok(())
}

/// [`put_attribute`] without its own transaction, for callers that already hold one.
pub(crate) fn write_attribute(tx: &Connection, note_id: &str, key: &str, data: &str) -> Result<()> {
    let now = timestamp_to_sql(Utc::now());
    let existing: Option<(i64, String)> = tx
        .query_row(
            "SELECT id, data FROM note WHERE note_id = ?1 AND attr_key = ?2",
            params![note_id, key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let rowid = match existing {
        Some((rowid, old)) => {
            tx.execute(
                "INSERT INTO note_fts(note_fts, rowid, data, note_id, attr_key) \
                 VALUES('delete', ?1, ?2, ?3, ?4)",
                params![rowid, old, note_id, key],
            )?;
            tx.execute(
                "UPDATE note SET data = ?1, updated_at = ?2 WHERE id = ?3",
                params![data, now, rowid],
            )?;
            rowid
        }
        None => {
            tx.execute(
                "INSERT INTO note (note_id, attr_key, data, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![note_id, key, data, now],
            )?;
            tx.last_insert_rowid()
        }
    };

    tx.execute(
        "INSERT INTO note_fts(rowid, data, note_id, attr_key) VALUES (?1, ?2, ?3, ?4)",
        params![rowid, data, note_id, key],
    )?;
    Ok(())
}

/// Remove `key` from `note_id`. Returns whether anything was removed.
pub fn remove_attribute(conn: &Connection, note_id: &str, key: &str) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let existing: Option<(i64, String)> = tx
        .query_row(
            "SELECT id, data FROM note WHERE note_id = ?1 AND attr_key = ?2",
            params![note_id, key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((rowid, old)) = existing else {
        return Ok(false);
    };

    tx.execute(
        "INSERT INTO note_fts(note_fts, rowid, data, note_id, attr_key) \
         VALUES('delete', ?1, ?2, ?3, ?4)",
        params![rowid, old, note_id, key],
    )?;
    tx.execute("DELETE FROM note WHERE id = ?1", params![rowid])?;
    tx.commit()?;
    Ok(true)
}

/// All attributes of a note, ordered by key.
pub fn note_attributes(conn: &Connection, note_id: &str) -> Result<BTreeMap<String, String>> {
    let mut stmt = conn.prepare("SELECT attr_key, data FROM note WHERE note_id = ?1")?;
    let attrs = stmt
        .query_map(params![note_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<BTreeMap<String, String>>>()?;
    Ok(attrs)
}

/// [`AttributeIndex`] backed by `note_fts`.
///
/// Lookup errors are logged and treated as "no match".
pub struct SqliteAttributeIndex<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteAttributeIndex<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn lookup(&self, note_id: &str, key: Option<&str>, text: &str) -> rusqlite::Result<bool> {
        let expr = format!("data:{}", fts_phrase(text));
        let found = match key {
            Some(key) => self
                .conn
                .query_row(
                    "SELECT 1 FROM note_fts WHERE note_fts MATCH ?1 AND note_id = ?2 \
                     AND attr_key = ?3 LIMIT 1",
                    params![expr, note_id, key],
                    |_| Ok(()),
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    "SELECT 1 FROM note_fts WHERE note_fts MATCH ?1 AND note_id = ?2 LIMIT 1",
                    params![expr, note_id],
                    |_| Ok(()),
                )
                .optional()?,
        };
        Ok(found.is_some())
    }
}

impl AttributeIndex for SqliteAttributeIndex<'_> {
    fn matches(&self, note_id: &str, key: Option<&str>, text: &str) -> bool {
        match self.lookup(note_id, key, text) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(error = %err, note_id, "note attribute lookup failed");
                false
            }
        }
    }
}
