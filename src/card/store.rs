//! Write path and single-record reads for cards, templates and models.
//!
//! Review updates go through [`apply_review`], which reads, schedules and
//! writes back inside one `IMMEDIATE` transaction so two concurrent answers
//! for the same card cannot overwrite each other.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::card::types::{
    decode_labels, encode_labels, timestamp_from_sql, timestamp_to_sql, Card, Model, Template,
};
use crate::srs::{self, SrsState};

/// Column list matching [`card_from_row`]. Prefixed for use in joined queries.
pub(crate) const CARD_COLUMNS: &str = "card.id, card.template_id, card.note_id, card.front, \
     card.back, card.shared, card.mnemonic, card.srs_level, card.next_review, card.last_right, \
     card.last_wrong, card.max_right, card.max_wrong, card.right_streak, card.wrong_streak, \
     card.tag, card.created_at, card.updated_at";

#[derive(Debug, Clone, Default)]
pub struct NewModel {
    pub name: String,
    pub front: String,
    pub back: String,
    pub shared: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewTemplate {
    pub name: String,
    pub model_id: Option<String>,
    pub front: String,
    pub back: String,
    pub shared: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub template_id: Option<String>,
    pub note_id: Option<String>,
    pub front: String,
    pub back: String,
    pub shared: String,
    pub mnemonic: String,
    pub tags: Vec<String>,
}

fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Trim a tag label. Empty labels and labels with spaces are dropped, since
/// tags are stored space-delimited.
fn clean_tag(tag: &str) -> Option<&str> {
    let tag = tag.trim();
    (!tag.is_empty() && !tag.contains(char::is_whitespace)).then_some(tag)
}

pub fn insert_model(conn: &Connection, model: &NewModel) -> Result<String> {
    let id = new_id();
    insert_model_with_id(conn, &id, model)?;
    Ok(id)
}

/// Insert a model under a caller-chosen id.
pub fn insert_model_with_id(conn: &Connection, id: &str, model: &NewModel) -> Result<()> {
    let now = timestamp_to_sql(Utc::now());
    conn.execute(
        "INSERT INTO model (id, name, front, back, shared, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![id, model.name, model.front, model.back, model.shared, now],
    )?;
    Ok(())
}

pub fn insert_template(conn: &Connection, template: &NewTemplate) -> Result<String> {
    let id = new_id();
    insert_template_with_id(conn, &id, template)?;
    Ok(id)
}

pub fn insert_template_with_id(conn: &Connection, id: &str, template: &NewTemplate) -> Result<()> {
    let now = timestamp_to_sql(Utc::now());
    conn.execute(
        "INSERT INTO template (id, name, model_id, front, back, shared, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            id,
            template.name,
            template.model_id,
            template.front,
            template.back,
            template.shared,
            now,
        ],
    )?;
    Ok(())
}

/// Insert a new, never-reviewed card. Returns its id.
///
/// Tags containing whitespace are dropped, as in [`add_tags`].
pub fn insert_card(conn: &Connection, card: &NewCard) -> Result<String> {
    let id = new_id();
    insert_card_with_id(conn, &id, card)?;
    Ok(id)
}

pub fn insert_card_with_id(conn: &Connection, id: &str, card: &NewCard) -> Result<()> {
    let now = timestamp_to_sql(Utc::now());
    let tags: BTreeSet<String> = card
        .tags
        .iter()
        .filter_map(|t| clean_tag(t))
        .map(str::to_string)
        .collect();

    conn.execute(
        "INSERT INTO card (id, template_id, note_id, front, back, shared, mnemonic, tag, \
         created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
        params![
            id,
            card.template_id,
            card.note_id,
            card.front,
            card.back,
            card.shared,
            card.mnemonic,
            encode_labels(&tags),
            now,
        ],
    )?;

    write_card_log(conn, "create", id, None)?;
    Ok(())
}

pub fn get_card(conn: &Connection, card_id: &str) -> Result<Option<Card>> {
    let card = conn
        .query_row(
            &format!("SELECT {CARD_COLUMNS} FROM card WHERE card.id = ?1"),
            params![card_id],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

/// Like [`get_card`] but a missing card is an error.
pub fn require_card(conn: &Connection, card_id: &str) -> Result<Card> {
    match get_card(conn, card_id)? {
        Some(card) => Ok(card),
        None => bail!("card not found: {card_id}"),
    }
}

pub fn get_template(conn: &Connection, template_id: &str) -> Result<Option<Template>> {
    let template = conn
        .query_row(
            "SELECT id, name, model_id, front, back, shared FROM template WHERE id = ?1",
            params![template_id],
            |row| {
                Ok(Template {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    model_id: row.get(2)?,
                    front: row.get(3)?,
                    back: row.get(4)?,
                    shared: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(template)
}

pub fn get_model(conn: &Connection, model_id: &str) -> Result<Option<Model>> {
    let model = conn
        .query_row(
            "SELECT id, name, front, back, shared FROM model WHERE id = ?1",
            params![model_id],
            |row| {
                Ok(Model {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    front: row.get(2)?,
                    back: row.get(3)?,
                    shared: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(model)
}

/// Replace every review-state column of a card.
pub fn update_srs(conn: &Connection, card_id: &str, state: &SrsState) -> Result<()> {
    let rows = conn.execute(
        "UPDATE card SET srs_level = ?1, next_review = ?2, last_right = ?3, last_wrong = ?4, \
         max_right = ?5, max_wrong = ?6, right_streak = ?7, wrong_streak = ?8, updated_at = ?9 \
         WHERE id = ?10",
        params![
            state.srs_level,
            state.next_review.map(timestamp_to_sql),
            state.last_right.map(timestamp_to_sql),
            state.last_wrong.map(timestamp_to_sql),
            state.max_right,
            state.max_wrong,
            state.right_streak,
            state.wrong_streak,
            timestamp_to_sql(Utc::now()),
            card_id,
        ],
    )?;
    if rows == 0 {
        bail!("card not found: {card_id}");
    }
    Ok(())
}

/// Read, schedule and write back one answer atomically.
pub fn apply_review(
    conn: &mut Connection,
    card_id: &str,
    delta: i32,
    now: DateTime<Utc>,
) -> Result<SrsState> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let card = require_card(&tx, card_id)?;
    let next = srs::advance(&card.srs, delta, now);
    update_srs(&tx, card_id, &next)?;
    write_card_log(
        &tx,
        "review",
        card_id,
        Some(&serde_json::json!({
            "delta": delta,
            "from_level": card.srs.srs_level,
            "to_level": next.srs_level,
        })),
    )?;

    tx.commit()?;
    Ok(next)
}

/// Add labels to a card's tag set. Returns the resulting set.
pub fn add_tags(conn: &Connection, card_id: &str, tags: &[&str]) -> Result<BTreeSet<String>> {
    edit_tags(conn, card_id, |set| {
        set.extend(tags.iter().filter_map(|t| clean_tag(t)).map(str::to_string));
    })
}

pub fn remove_tags(conn: &Connection, card_id: &str, tags: &[&str]) -> Result<BTreeSet<String>> {
    edit_tags(conn, card_id, |set| {
        for tag in tags {
            set.remove(tag.trim());
        }
    })
}

fn edit_tags(
    conn: &Connection,
    card_id: &str,
    edit: impl FnOnce(&mut BTreeSet<String>),
) -> Result<BTreeSet<String>> {
    let mut tags = require_card(conn, card_id)?.tag;
    edit(&mut tags);

    conn.execute(
        "UPDATE card SET tag = ?1, updated_at = ?2 WHERE id = ?3",
        params![encode_labels(&tags), timestamp_to_sql(Utc::now()), card_id],
    )?;
    write_card_log(
        conn,
        "tag",
        card_id,
        Some(&serde_json::json!({ "tags": &tags })),
    )?;
    Ok(tags)
}

pub fn set_mnemonic(conn: &Connection, card_id: &str, mnemonic: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE card SET mnemonic = ?1, updated_at = ?2 WHERE id = ?3",
        params![mnemonic, timestamp_to_sql(Utc::now()), card_id],
    )?;
    if rows == 0 {
        bail!("card not found: {card_id}");
    }
    write_card_log(conn, "mnemonic", card_id, None)?;
    Ok(())
}

pub fn delete_card(conn: &Connection, card_id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM card WHERE id = ?1", params![card_id])?;
    if rows == 0 {
        bail!("card not found: {card_id}");
    }
    write_card_log(conn, "delete", card_id, None)?;
    Ok(())
}

/// Write an entry to the `card_log` audit table.
pub(crate) fn write_card_log(
    conn: &Connection,
    operation: &str,
    card_id: &str,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    let now = timestamp_to_sql(Utc::now());
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO card_log (operation, card_id, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![operation, card_id, details_json, now],
    )?;
    Ok(())
}

fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(raw) => timestamp_from_sql(&raw).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                format!("invalid timestamp: {raw}").into(),
            )
        }),
    }
}

fn required_ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    ts_column(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "timestamp".to_string(),
        rusqlite::types::Type::Null,
    ))
}

/// Map a row selected with [`CARD_COLUMNS`].
pub(crate) fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let tag: String = row.get(15)?;
    Ok(Card {
        id: row.get(0)?,
        template_id: row.get(1)?,
        note_id: row.get(2)?,
        front: row.get(3)?,
        back: row.get(4)?,
        shared: row.get(5)?,
        mnemonic: row.get(6)?,
        srs: SrsState {
            srs_level: row.get(7)?,
            next_review: ts_column(row, 8)?,
            last_right: ts_column(row, 9)?,
            last_wrong: ts_column(row, 10)?,
            max_right: row.get(11)?,
            max_wrong: row.get(12)?,
            right_streak: row.get(13)?,
            wrong_streak: row.get(14)?,
        },
        tag: decode_labels(&tag),
        created_at: required_ts_column(row, 16)?,
        updated_at: required_ts_column(row, 17)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    fn log_count(conn: &Connection, card_id: &str, operation: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM card_log WHERE card_id = ?1 AND operation = ?2",
            params![card_id, operation],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn insert_and_read_back() {
        let conn = test_db();
        let id = insert_card(
            &conn,
            &NewCard {
                front: "食べる".into(),
                tags: vec!["verb".into(), " jlpt-n5 ".into(), "".into()],
                ..NewCard::default()
            },
        )
        .unwrap();

        let card = get_card(&conn, &id).unwrap().unwrap();
        assert_eq!(card.front, "食べる");
        assert_eq!(card.srs, SrsState::default());
        assert!(card.has_tag("verb"));
        assert!(card.has_tag("jlpt-n5"));
        assert_eq!(card.tag.len(), 2);
        assert_eq!(log_count(&conn, &id, "create"), 1);
    }

    #[test]
    fn insert_drops_tags_with_spaces() {
        let conn = test_db();
        let id = insert_card(
            &conn,
            &NewCard {
                tags: vec!["noun".into(), "two words".into(), "tab\there".into()],
                ..NewCard::default()
            },
        )
        .unwrap();

        let raw: String = conn
            .query_row("SELECT tag FROM card WHERE id = ?1", [&id], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, " noun ");
        let card = get_card(&conn, &id).unwrap().unwrap();
        assert!(!card.has_tag("two"));
        assert!(!card.has_tag("words"));
    }

    #[test]
    fn insert_with_id_keeps_the_id() {
        let conn = test_db();
        insert_model_with_id(&conn, "m-fixed", &NewModel::default()).unwrap();
        insert_card_with_id(&conn, "c-fixed", &NewCard::default()).unwrap();
        assert!(get_model(&conn, "m-fixed").unwrap().is_some());
        assert!(get_card(&conn, "c-fixed").unwrap().is_some());
        assert!(insert_card_with_id(&conn, "c-fixed", &NewCard::default()).is_err());
    }

    #[test]
    fn missing_card_is_none_or_error() {
        let conn = test_db();
        assert!(get_card(&conn, "nope").unwrap().is_none());
        let err = require_card(&conn, "nope").unwrap_err();
        assert!(err.to_string().contains("card not found"));
        assert!(update_srs(&conn, "nope", &SrsState::default()).is_err());
    }

    #[test]
    fn apply_review_persists_scheduler_output() {
        let mut conn = test_db();
        let id = insert_card(&conn, &NewCard::default()).unwrap();
        let now = Utc::now();

        let state = apply_review(&mut conn, &id, 1, now).unwrap();
        assert_eq!(state.srs_level, 1);

        let card = get_card(&conn, &id).unwrap().unwrap();
        assert_eq!(card.srs.srs_level, 1);
        assert_eq!(card.srs.right_streak, 1);
        assert_eq!(
            card.srs.next_review.map(timestamp_to_sql),
            state.next_review.map(timestamp_to_sql)
        );
        assert_eq!(log_count(&conn, &id, "review"), 1);
    }

    #[test]
    fn tag_edits() {
        let conn = test_db();
        let id = insert_card(
            &conn,
            &NewCard {
                tags: vec!["a".into()],
                ..NewCard::default()
            },
        )
        .unwrap();

        let tags = add_tags(&conn, &id, &["b", "has space", "marked"]).unwrap();
        assert_eq!(tags.iter().cloned().collect::<Vec<_>>(), vec!["a", "b", "marked"]);

        let tags = remove_tags(&conn, &id, &["a", "missing"]).unwrap();
        assert_eq!(tags.iter().cloned().collect::<Vec<_>>(), vec!["b", "marked"]);

        let raw: String = conn
            .query_row("SELECT tag FROM card WHERE id = ?1", [&id], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, " b marked ");
        assert_eq!(log_count(&conn, &id, "tag"), 2);
    }

    #[test]
    fn mnemonic_and_delete() {
        let conn = test_db();
        let id = insert_card(&conn, &NewCard::default()).unwrap();
        set_mnemonic(&conn, &id, "tabe-ru: table").unwrap();
        assert_eq!(get_card(&conn, &id).unwrap().unwrap().mnemonic, "tabe-ru: table");

        delete_card(&conn, &id).unwrap();
        assert!(get_card(&conn, &id).unwrap().is_none());
        assert!(delete_card(&conn, &id).is_err());
    }

    #[test]
    fn template_and_model_lookup() {
        let conn = test_db();
        let model_id = insert_model(
            &conn,
            &NewModel {
                name: "Basic".into(),
                ..NewModel::default()
            },
        )
        .unwrap();
        let template_id = insert_template(
            &conn,
            &NewTemplate {
                name: "Forward".into(),
                model_id: Some(model_id.clone()),
                ..NewTemplate::default()
            },
        )
        .unwrap();

        let template = get_template(&conn, &template_id).unwrap().unwrap();
        assert_eq!(template.model_id.as_deref(), Some(model_id.as_str()));
        assert_eq!(get_model(&conn, &model_id).unwrap().unwrap().name, "Basic");
    }
}
