//! Card filter query language.
//!
//! ```text
//! tag:verb ?status:due -"leech" srsLevel>3 nextReview<+1d
//! ```
//!
//! A query is a space-separated list of clauses `sign? key (op value)?`.
//! [`tokenize`] scans the string into [`Clause`]s, [`compile`] turns them
//! into a [`Predicate`] plus the [`Joins`] it needs, and [`sql::lower`]
//! translates the predicate for the SQLite card store.
//!
//! Reserved keys: `srsLevel maxRight maxWrong rightStreak wrongStreak`
//! (integers), `nextReview lastRight lastWrong createdAt updatedAt`
//! (relative dates such as `1d`, `+2w`, `30min`), `tag status`, `id noteId
//! templateId`, and the join fields `modelId template model`. Any other key
//! searches note attributes of that name.

pub mod compile;
pub mod predicate;
pub mod sql;
pub mod tokenize;

pub use compile::{compile, parse, search, CompiledQuery, Joins};
pub use predicate::{AttributeIndex, Predicate, Subject};
pub use tokenize::{tokenize, Clause, Operator, ParseError, Sign};
