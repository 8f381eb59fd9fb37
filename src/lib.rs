//! Spaced-repetition flashcards with a small query language.
//!
//! Reprise stores cards in SQLite and schedules them on a fixed interval
//! ladder. Cards are selected with queries such as
//! `tag:verb -status:leech nextReview<+1d`.
//!
//! | Level | Interval | | Level | Interval |
//! |-------|----------|-|-------|----------|
//! | 0 | 4 h  | | 4 | 1 w  |
//! | 1 | 8 h  | | 5 | 2 w  |
//! | 2 | 1 d  | | 6 | 4 w  |
//! | 3 | 3 d  | | 7 | 16 w |
//!
//! # Modules
//!
//! - [`query`]: Tokenizer, predicate compiler and SQL lowering for card queries
//! - [`srs`]: Review-state scheduler and derived status labels
//! - [`card`]: Card records, the SQLite card store and note attribute index
//! - [`review`]: Review sessions and answer recording
//! - [`db`]: SQLite initialization, schema and migrations
//! - [`config`]: Configuration loading from TOML files and environment variables

pub mod card;
pub mod config;
pub mod db;
pub mod query;
pub mod review;
pub mod srs;
