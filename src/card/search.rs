//! Card search over SQLite.
//!
//! A [`CompiledQuery`] is lowered with [`crate::query::sql::lower`] and run
//! against `card`, joined to `template` and `model` only when the query
//! needs them.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params_from_iter, Connection};

use crate::card::store::{card_from_row, CARD_COLUMNS};
use crate::card::types::Card;
use crate::query::sql::{lower, SqlFilter};
use crate::query::{CompiledQuery, Joins};

/// Result window. A `limit` of `None` returns every match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: 0,
        }
    }
}

fn from_clause(joins: Joins) -> String {
    let mut sql = String::from("FROM card");
    // model is reached through template
    if joins.template || joins.model {
        sql.push_str(" LEFT JOIN template ON template.id = card.template_id");
    }
    if joins.model {
        sql.push_str(" LEFT JOIN model ON model.id = template.model_id");
    }
    sql
}

/// Cards matching `query`, oldest first.
pub fn find_cards(
    conn: &Connection,
    query: &CompiledQuery,
    page: Page,
    now: DateTime<Utc>,
) -> Result<Vec<Card>> {
    let SqlFilter { sql: filter, mut params } = lower(&query.predicate, now);

    let mut sql = format!(
        "SELECT {CARD_COLUMNS} {} WHERE {filter} ORDER BY card.created_at, card.id",
        from_clause(query.joins)
    );
    // SQLite needs a LIMIT before OFFSET; -1 means unbounded
    if page.limit.is_some() || page.offset > 0 {
        sql.push_str(" LIMIT ? OFFSET ?");
        let limit = page.limit.map_or(-1, |l| l as i64);
        params.push(limit.into());
        params.push((page.offset as i64).into());
    }

    tracing::debug!(predicate = %query.predicate, %sql, "searching cards");

    let mut stmt = conn.prepare(&sql)?;
    let cards = stmt
        .query_map(params_from_iter(params), card_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

pub fn count_cards(conn: &Connection, query: &CompiledQuery, now: DateTime<Utc>) -> Result<u64> {
    let SqlFilter { sql: filter, params } = lower(&query.predicate, now);
    let sql = format!(
        "SELECT COUNT(*) {} WHERE {filter}",
        from_clause(query.joins)
    );
    let count: i64 = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
    Ok(count as u64)
}
