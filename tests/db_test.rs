mod helpers;

use helpers::{fixed_now, seed_deck};
use reprise::card::{CardStore, SqliteCardStore};
use reprise::db::{self, migrations};
use reprise::query::search;
use reprise::review::{answer, Outcome};

#[test]
fn open_database_creates_parent_dirs_and_migrates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("cards.db");

    let conn = db::open_database(&path).unwrap();
    assert!(path.exists());
    assert_eq!(
        migrations::get_schema_version(&conn).unwrap(),
        migrations::CURRENT_SCHEMA_VERSION
    );

    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.db");
    let now = fixed_now();

    let deck = {
        let mut store = SqliteCardStore::open(&path).unwrap();
        let deck = seed_deck(store.conn(), now);
        answer(&mut store, &deck.fresh, Outcome::Right, now).unwrap();
        deck
    };

    let store = SqliteCardStore::open(&path).unwrap();
    let card = store.get(&deck.fresh).unwrap().unwrap();
    assert_eq!(card.srs.srs_level, 1);
    assert!(card.has_tag("verb"));

    // FTS index persisted with the notes
    let found = store.find(&search("meaning:drink"), now).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, deck.due);
}

#[test]
fn answers_from_two_connections_both_land() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.db");
    let now = fixed_now();

    let mut first = SqliteCardStore::open(&path).unwrap();
    let deck = seed_deck(first.conn(), now);
    let mut second = SqliteCardStore::open(&path).unwrap();

    answer(&mut first, &deck.fresh, Outcome::Right, now).unwrap();
    answer(&mut second, &deck.fresh, Outcome::Right, now).unwrap();

    let card = first.get(&deck.fresh).unwrap().unwrap();
    assert_eq!(card.srs.srs_level, 2);
    assert_eq!(card.srs.right_streak, 2);
}

#[test]
fn card_log_records_reviews() {
    let mut store = SqliteCardStore::open_in_memory().unwrap();
    let now = fixed_now();
    let deck = seed_deck(store.conn(), now);

    answer(&mut store, &deck.due, Outcome::Wrong, now).unwrap();

    let details: String = store
        .conn()
        .query_row(
            "SELECT details FROM card_log WHERE card_id = ?1 AND operation = 'review'",
            [&deck.due],
            |row| row.get(0),
        )
        .unwrap();
    let details: serde_json::Value = serde_json::from_str(&details).unwrap();
    assert_eq!(details["delta"], -1);
    assert_eq!(details["from_level"], 1);
    assert_eq!(details["to_level"], 0);
}
