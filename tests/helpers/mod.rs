#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use reprise::card::notes::put_attribute;
use reprise::card::store::{
    insert_card, insert_model, insert_template, update_srs, NewCard, NewModel, NewTemplate,
};
use reprise::db;
use reprise::srs::SrsState;
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Fixed clock, whole seconds so stored millisecond timestamps round-trip exactly.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Insert a card with the given content, tags and review state. Returns its id.
pub fn insert_card_with(
    conn: &Connection,
    card: NewCard,
    state: Option<SrsState>,
) -> String {
    let id = insert_card(conn, &card).unwrap();
    if let Some(state) = state {
        update_srs(conn, &id, &state).unwrap();
    }
    id
}

pub fn scheduled(level: u32, next: Duration, now: DateTime<Utc>) -> SrsState {
    SrsState {
        srs_level: level,
        next_review: Some(now + next),
        ..SrsState::default()
    }
}

/// Ids of a small mixed deck, see [`seed_deck`].
pub struct Deck {
    pub model_id: String,
    pub recognition_id: String,
    pub production_id: String,
    /// Never reviewed, tagged `verb marked`, Recognition template, note n1.
    pub fresh: String,
    /// Level 1, due an hour ago, Production template (no model), note n2.
    pub due: String,
    /// Level 0, due, wrong streak 3, no template, note n3.
    pub leech: String,
    /// Level 5, due in three days, Recognition template, note n1.
    pub graduated: String,
    /// Level 2, due in 20 hours, tagged `noun`, no note.
    pub learning: String,
}

impl Deck {
    pub fn all(&self) -> Vec<&str> {
        vec![
            &self.fresh,
            &self.due,
            &self.leech,
            &self.graduated,
            &self.learning,
        ]
    }
}

pub fn seed_deck(conn: &Connection, now: DateTime<Utc>) -> Deck {
    let model_id = insert_model(
        conn,
        &NewModel {
            name: "Japanese".into(),
            front: "{{word}}".into(),
            back: "{{meaning}}".into(),
            shared: String::new(),
        },
    )
    .unwrap();
    let recognition_id = insert_template(
        conn,
        &NewTemplate {
            name: "Recognition".into(),
            model_id: Some(model_id.clone()),
            ..NewTemplate::default()
        },
    )
    .unwrap();
    let production_id = insert_template(
        conn,
        &NewTemplate {
            name: "Production".into(),
            ..NewTemplate::default()
        },
    )
    .unwrap();

    put_attribute(conn, "n1", "meaning", "to eat").unwrap();
    put_attribute(conn, "n1", "reading", "taberu").unwrap();
    put_attribute(conn, "n2", "meaning", "to drink").unwrap();
    put_attribute(conn, "n3", "meaning", "raw fish \"sashimi\"").unwrap();

    let fresh = insert_card_with(
        conn,
        NewCard {
            template_id: Some(recognition_id.clone()),
            note_id: Some("n1".into()),
            tags: vec!["verb".into(), "marked".into()],
            ..NewCard::default()
        },
        None,
    );
    let due = insert_card_with(
        conn,
        NewCard {
            template_id: Some(production_id.clone()),
            note_id: Some("n2".into()),
            front: "飲む".into(),
            ..NewCard::default()
        },
        Some(SrsState {
            right_streak: 1,
            max_right: 1,
            last_right: Some(now - Duration::hours(9)),
            ..scheduled(1, Duration::hours(-1), now)
        }),
    );
    let leech = insert_card_with(
        conn,
        NewCard {
            note_id: Some("n3".into()),
            ..NewCard::default()
        },
        Some(SrsState {
            wrong_streak: 3,
            max_wrong: 3,
            last_wrong: Some(now - Duration::hours(3)),
            ..scheduled(0, Duration::hours(-2), now)
        }),
    );
    let graduated = insert_card_with(
        conn,
        NewCard {
            template_id: Some(recognition_id.clone()),
            note_id: Some("n1".into()),
            ..NewCard::default()
        },
        Some(scheduled(5, Duration::days(3), now)),
    );
    let learning = insert_card_with(
        conn,
        NewCard {
            tags: vec!["noun".into()],
            ..NewCard::default()
        },
        Some(scheduled(2, Duration::hours(20), now)),
    );

    Deck {
        model_id,
        recognition_id,
        production_id,
        fresh,
        due,
        leech,
        graduated,
        learning,
    }
}
