mod helpers;

use chrono::Duration;
use helpers::{fixed_now, seed_deck};
use reprise::card::stats::review_stats;
use reprise::card::{CardStore, SqliteCardStore};
use reprise::config::ReviewConfig;
use reprise::query::search;
use reprise::review::{answer, start_session, Outcome};
use reprise::srs::status::Status;

fn no_shuffle(batch_size: usize) -> ReviewConfig {
    ReviewConfig {
        batch_size,
        shuffle: false,
    }
}

#[test]
fn session_over_due_cards() {
    let store = SqliteCardStore::open_in_memory().unwrap();
    let now = fixed_now();
    let deck = seed_deck(store.conn(), now);

    let session = start_session(&store, "status:due", &no_shuffle(10), now).unwrap();
    let ids: Vec<&str> = session.cards.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![deck.due.as_str(), deck.leech.as_str()]);
    assert!(session.cards.iter().all(|c| !c.is_marked));

    let session = start_session(&store, "tag:marked", &no_shuffle(10), now).unwrap();
    assert_eq!(session.cards.len(), 1);
    assert_eq!(session.cards[0].id, deck.fresh);
    assert!(session.cards[0].is_marked);
}

#[test]
fn batch_size_caps_session() {
    let store = SqliteCardStore::open_in_memory().unwrap();
    let now = fixed_now();
    seed_deck(store.conn(), now);

    let config = ReviewConfig {
        batch_size: 2,
        shuffle: true,
    };
    let session = start_session(&store, "", &config, now).unwrap();
    assert_eq!(session.cards.len(), 2);
}

#[test]
fn answers_move_cards_between_statuses() {
    let mut store = SqliteCardStore::open_in_memory().unwrap();
    let now = fixed_now();
    let deck = seed_deck(store.conn(), now);

    // the new card gets scheduled and stops being new
    let state = answer(&mut store, &deck.fresh, Outcome::Right, now).unwrap();
    assert_eq!(state.srs_level, 1);
    assert_eq!(state.next_review, Some(now + Duration::hours(8)));
    let card = store.get(&deck.fresh).unwrap().unwrap();
    assert!(!card.status(now).contains(&Status::New));

    // the due card answered wrong twice becomes a leech
    answer(&mut store, &deck.due, Outcome::Wrong, now).unwrap();
    answer(&mut store, &deck.due, Outcome::Wrong, now).unwrap();
    let leeches = store.find(&search("status:leech"), now).unwrap();
    let ids: Vec<&str> = leeches.iter().map(|c| c.id.as_str()).collect();
    assert!(ids.contains(&deck.due.as_str()));

    // skip leaves the level alone
    let before = store.get(&deck.graduated).unwrap().unwrap().srs.srs_level;
    let state = answer(&mut store, &deck.graduated, Outcome::Skip, now).unwrap();
    assert_eq!(state.srs_level, before);
}

#[test]
fn answer_unknown_card_fails() {
    let mut store = SqliteCardStore::open_in_memory().unwrap();
    let err = answer(&mut store, "missing", Outcome::Right, fixed_now()).unwrap_err();
    assert!(err.to_string().contains("card not found"));
}

#[test]
fn stats_over_deck() {
    let store = SqliteCardStore::open_in_memory().unwrap();
    let now = fixed_now();
    seed_deck(store.conn(), now);

    let cards = store.find(&search(""), now).unwrap();
    let stats = review_stats(&cards, now);
    assert_eq!(stats.total, 5);
    assert_eq!(stats.new, 1);
    assert_eq!(stats.due, 2);
    assert_eq!(stats.leech, 1);
    assert_eq!(stats.learning, 3);
    assert_eq!(stats.graduated, 1);
    assert_eq!(stats.next_due, Some(now + Duration::hours(20)));
}
