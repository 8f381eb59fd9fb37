//! SQL DDL for all tables.
//!
//! Defines `model`, `template`, `card`, `note`, `note_fts` (FTS5) and
//! `schema_meta`. All DDL uses `IF NOT EXISTS` for idempotent initialization.
//! Review status is derived from the card columns and has no column of its own.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS model (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    front TEXT NOT NULL DEFAULT '',
    back TEXT NOT NULL DEFAULT '',
    shared TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_model_name ON model(name);

CREATE TABLE IF NOT EXISTS template (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    model_id TEXT REFERENCES model(id) ON DELETE CASCADE,
    front TEXT NOT NULL DEFAULT '',
    back TEXT NOT NULL DEFAULT '',
    shared TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_template_name ON template(name);
CREATE INDEX IF NOT EXISTS idx_template_model ON template(model_id);

CREATE TABLE IF NOT EXISTS card (
    id TEXT PRIMARY KEY,
    template_id TEXT REFERENCES template(id) ON DELETE CASCADE,
    note_id TEXT,
    front TEXT NOT NULL DEFAULT '',
    back TEXT NOT NULL DEFAULT '',
    shared TEXT NOT NULL DEFAULT '',
    mnemonic TEXT NOT NULL DEFAULT '',
    srs_level INTEGER NOT NULL DEFAULT 0 CHECK(srs_level >= 0),
    next_review TEXT,
    last_right TEXT,
    last_wrong TEXT,
    max_right INTEGER NOT NULL DEFAULT 0 CHECK(max_right >= 0),
    max_wrong INTEGER NOT NULL DEFAULT 0 CHECK(max_wrong >= 0),
    right_streak INTEGER NOT NULL DEFAULT 0 CHECK(right_streak >= 0),
    wrong_streak INTEGER NOT NULL DEFAULT 0 CHECK(wrong_streak >= 0),
    tag TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_card_template ON card(template_id);
CREATE INDEX IF NOT EXISTS idx_card_note ON card(note_id);
CREATE INDEX IF NOT EXISTS idx_card_srs_level ON card(srs_level);
CREATE INDEX IF NOT EXISTS idx_card_next_review ON card(next_review);
CREATE INDEX IF NOT EXISTS idx_card_wrong_streak ON card(wrong_streak);

-- Note attributes: one row per (note, key)
CREATE TABLE IF NOT EXISTS note (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id TEXT NOT NULL,
    attr_key TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(note_id, attr_key)
);

-- Full-text index over attribute values
CREATE VIRTUAL TABLE IF NOT EXISTS note_fts USING fts5(
    data,
    note_id UNINDEXED,
    attr_key UNINDEXED,
    content='note',
    content_rowid='id'
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
