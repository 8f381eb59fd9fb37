//! Lower a [`Predicate`] to a SQLite `WHERE` fragment.
//!
//! The fragment expects the `card` table, plus `template` and `model` when
//! the query's [`Joins`](super::Joins) ask for them. Leaves never evaluate
//! to SQL `NULL`, so `NOT` behaves the same as in [`Predicate::eval`].

use chrono::{DateTime, Datelike, Utc};
use rusqlite::types::Value;

use super::predicate::{LabelSet, Nullable, Predicate};
use crate::card::types::timestamp_to_sql;
use crate::srs::status::{Status, LEARNING_MAX_LEVEL, LEECH_WRONG_STREAK};

/// A `WHERE` fragment with positional (`?`) parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Quote text as an FTS5 phrase, doubling embedded `"`.
pub fn fts_phrase(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

pub fn lower(predicate: &Predicate, now: DateTime<Utc>) -> SqlFilter {
    let mut params = Vec::new();
    let sql = lower_into(predicate, now, &mut params);
    SqlFilter { sql, params }
}

fn lower_into(predicate: &Predicate, now: DateTime<Utc>, params: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::True => "1".to_string(),
        Predicate::False => "0".to_string(),
        Predicate::And(parts) => join(parts, " AND ", now, params),
        Predicate::Or(parts) => join(parts, " OR ", now, params),
        Predicate::Not(inner) => format!("NOT ({})", lower_into(inner, now, params)),
        Predicate::IsNull(Nullable::Numeric(field)) => format!("{} IS NULL", field.column()),
        Predicate::IsNull(Nullable::Date(field)) => format!("{} IS NULL", field.column()),
        Predicate::CompareNumber { field, op, value } => {
            params.push(Value::Integer(*value));
            format!("{} {} ?", field.column(), op.as_str())
        }
        Predicate::CompareDate { field, op, offset } => match now.checked_add_signed(*offset) {
            Some(bound) => {
                params.push(Value::Text(date_bound(bound)));
                format!("IFNULL({} {} ?, 0)", field.column(), op.as_str())
            }
            None => "0".to_string(),
        },
        Predicate::Equals { field, value } => {
            params.push(Value::Text(value.clone()));
            format!("IFNULL({} = ?, 0)", field.column())
        }
        Predicate::NameMatch { field, value, exact } => {
            params.push(Value::Text(value.clone()));
            if *exact {
                format!("IFNULL({} = ?, 0)", field.column())
            } else {
                format!("IFNULL(instr({}, ?) > 0, 0)", field.column())
            }
        }
        Predicate::SetMembership {
            set: LabelSet::Tag,
            label,
        } => {
            // stored tags never contain whitespace, and " a b " would span two of them
            if label.contains(char::is_whitespace) {
                return "0".to_string();
            }
            params.push(Value::Text(format!(" {label} ")));
            // lower() folds ASCII only, matching eq_ignore_ascii_case
            "instr(lower(card.tag), lower(?)) > 0".to_string()
        }
        Predicate::SetMembership {
            set: LabelSet::Status,
            label,
        } => match label.parse::<Status>() {
            Ok(status) => lower_status(status, now, params),
            Err(_) => "0".to_string(),
        },
        Predicate::TextMatch { key, text } => {
            let expr = format!("data:{}", fts_phrase(text));
            match key {
                Some(key) => {
                    params.push(Value::Text(key.clone()));
                    params.push(Value::Text(expr));
                    "IFNULL(card.note_id IN (SELECT note_id FROM note_fts \
                     WHERE attr_key = ? AND note_fts MATCH ?), 0)"
                        .to_string()
                }
                None => {
                    params.push(Value::Text(expr));
                    "IFNULL(card.note_id IN (SELECT note_id FROM note_fts WHERE note_fts MATCH ?), 0)"
                        .to_string()
                }
            }
        }
    }
}

/// Timestamps compare as text, which only orders correctly for four-digit
/// years. Bounds outside that range are pinned to its ends.
fn date_bound(at: DateTime<Utc>) -> String {
    match at.year() {
        y if y > 9999 => "9999-12-31T23:59:59.999Z".to_string(),
        y if y < 0 => "0000-01-01T00:00:00.000Z".to_string(),
        _ => timestamp_to_sql(at),
    }
}

fn join(parts: &[Predicate], sep: &str, now: DateTime<Utc>, params: &mut Vec<Value>) -> String {
    let lowered: Vec<String> = parts.iter().map(|p| lower_into(p, now, params)).collect();
    format!("({})", lowered.join(sep))
}

/// Status is derived, so each label becomes the expression that defines it.
fn lower_status(status: Status, now: DateTime<Utc>, params: &mut Vec<Value>) -> String {
    match status {
        Status::New => "card.next_review IS NULL".to_string(),
        Status::Due => {
            params.push(Value::Text(timestamp_to_sql(now)));
            "IFNULL(card.next_review <= ?, 0)".to_string()
        }
        Status::Leech => format!("card.wrong_streak > {LEECH_WRONG_STREAK}"),
        Status::Graduated => format!("card.srs_level > {LEARNING_MAX_LEVEL}"),
        Status::Learning => format!(
            "(card.srs_level <= {LEARNING_MAX_LEVEL} AND card.next_review IS NOT NULL)"
        ),
    }
}
