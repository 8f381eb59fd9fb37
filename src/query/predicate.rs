//! Immutable predicate algebra over cards.
//!
//! A [`Predicate`] is storage-agnostic. It is evaluated in memory with
//! [`Predicate::eval`] or lowered to SQL by [`crate::query::sql`]. Relative
//! dates are kept as offsets and resolved against the clock passed in at
//! evaluation time.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::card::types::{Card, Model, Template};
use crate::srs::status::{has_status, Status};

/// Full-text lookup over note key/value data.
pub trait AttributeIndex {
    /// Does any attribute of `note_id` (restricted to `key` when given) contain `text`?
    fn matches(&self, note_id: &str, key: Option<&str>, text: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    pub fn test<T: PartialOrd>(&self, lhs: T, rhs: T) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Lt => lhs < rhs,
            Self::Gt => lhs > rhs,
            Self::Le => lhs <= rhs,
            Self::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    SrsLevel,
    MaxRight,
    MaxWrong,
    RightStreak,
    WrongStreak,
}

impl NumericField {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "srsLevel" => Some(Self::SrsLevel),
            "maxRight" => Some(Self::MaxRight),
            "maxWrong" => Some(Self::MaxWrong),
            "rightStreak" => Some(Self::RightStreak),
            "wrongStreak" => Some(Self::WrongStreak),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::SrsLevel => "srsLevel",
            Self::MaxRight => "maxRight",
            Self::MaxWrong => "maxWrong",
            Self::RightStreak => "rightStreak",
            Self::WrongStreak => "wrongStreak",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::SrsLevel => "card.srs_level",
            Self::MaxRight => "card.max_right",
            Self::MaxWrong => "card.max_wrong",
            Self::RightStreak => "card.right_streak",
            Self::WrongStreak => "card.wrong_streak",
        }
    }

    fn read(&self, card: &Card) -> i64 {
        let srs = &card.srs;
        i64::from(match self {
            Self::SrsLevel => srs.srs_level,
            Self::MaxRight => srs.max_right,
            Self::MaxWrong => srs.max_wrong,
            Self::RightStreak => srs.right_streak,
            Self::WrongStreak => srs.wrong_streak,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    NextReview,
    LastRight,
    LastWrong,
    CreatedAt,
    UpdatedAt,
}

impl DateField {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "nextReview" => Some(Self::NextReview),
            "lastRight" => Some(Self::LastRight),
            "lastWrong" => Some(Self::LastWrong),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::NextReview => "nextReview",
            Self::LastRight => "lastRight",
            Self::LastWrong => "lastWrong",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::NextReview => "card.next_review",
            Self::LastRight => "card.last_right",
            Self::LastWrong => "card.last_wrong",
            Self::CreatedAt => "card.created_at",
            Self::UpdatedAt => "card.updated_at",
        }
    }

    fn read(&self, card: &Card) -> Option<DateTime<Utc>> {
        match self {
            Self::NextReview => card.srs.next_review,
            Self::LastRight => card.srs.last_right,
            Self::LastWrong => card.srs.last_wrong,
            Self::CreatedAt => Some(card.created_at),
            Self::UpdatedAt => Some(card.updated_at),
        }
    }
}

/// A field that can be tested for absence (`key:NULL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullable {
    Numeric(NumericField),
    Date(DateField),
}

/// Identifier fields compared by exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdField {
    Id,
    NoteId,
    TemplateId,
    /// Lives on the template; needs the template join.
    ModelId,
}

impl IdField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::NoteId => "noteId",
            Self::TemplateId => "templateId",
            Self::ModelId => "modelId",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "card.id",
            Self::NoteId => "card.note_id",
            Self::TemplateId => "card.template_id",
            Self::ModelId => "template.model_id",
        }
    }
}

/// Name fields reached through joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    Template,
    Model,
}

impl NameField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Model => "model",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Template => "template.name",
            Self::Model => "model.name",
        }
    }
}

/// Space-delimited label sets on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSet {
    Tag,
    /// Derived from review state, see [`crate::srs::status`].
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    True,
    False,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
    IsNull(Nullable),
    CompareNumber {
        field: NumericField,
        op: CompareOp,
        value: i64,
    },
    /// Compare a timestamp against `now + offset`.
    CompareDate {
        field: DateField,
        op: CompareOp,
        offset: Duration,
    },
    Equals {
        field: IdField,
        value: String,
    },
    /// Exact or substring match on a template or model name.
    NameMatch {
        field: NameField,
        value: String,
        exact: bool,
    },
    SetMembership {
        set: LabelSet,
        label: String,
    },
    /// Full-text containment in the card's note attributes.
    TextMatch {
        key: Option<String>,
        text: String,
    },
}

/// What a predicate is evaluated against: a card plus whatever the store
/// joined to it.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    pub card: &'a Card,
    pub template: Option<&'a Template>,
    pub model: Option<&'a Model>,
}

impl<'a> Subject<'a> {
    pub fn card(card: &'a Card) -> Self {
        Self {
            card,
            template: None,
            model: None,
        }
    }
}

impl Predicate {
    /// Conjunction, collapsing the single-element case.
    pub fn all(mut parts: Vec<Predicate>) -> Self {
        match parts.len() {
            0 => Self::True,
            1 => parts.remove(0),
            _ => Self::And(parts),
        }
    }

    /// Disjunction, collapsing the single-element case.
    pub fn any(mut parts: Vec<Predicate>) -> Self {
        match parts.len() {
            0 => Self::False,
            1 => parts.remove(0),
            _ => Self::Or(parts),
        }
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate in memory. Never touches storage beyond `index` lookups.
    pub fn eval(&self, subject: &Subject<'_>, index: &dyn AttributeIndex, now: DateTime<Utc>) -> bool {
        let card = subject.card;
        match self {
            Self::True => true,
            Self::False => false,
            Self::And(parts) => parts.iter().all(|p| p.eval(subject, index, now)),
            Self::Or(parts) => parts.iter().any(|p| p.eval(subject, index, now)),
            Self::Not(inner) => !inner.eval(subject, index, now),
            Self::IsNull(Nullable::Numeric(_)) => false,
            Self::IsNull(Nullable::Date(field)) => field.read(card).is_none(),
            Self::CompareNumber { field, op, value } => op.test(field.read(card), *value),
            Self::CompareDate { field, op, offset } => match now.checked_add_signed(*offset) {
                Some(bound) => field.read(card).is_some_and(|at| op.test(at, bound)),
                None => false,
            },
            Self::Equals { field, value } => {
                let actual = match field {
                    IdField::Id => Some(card.id.as_str()),
                    IdField::NoteId => card.note_id.as_deref(),
                    IdField::TemplateId => card.template_id.as_deref(),
                    IdField::ModelId => subject.template.and_then(|t| t.model_id.as_deref()),
                };
                actual == Some(value.as_str())
            }
            Self::NameMatch { field, value, exact } => {
                let name = match field {
                    NameField::Template => subject.template.map(|t| t.name.as_str()),
                    NameField::Model => subject.model.map(|m| m.name.as_str()),
                };
                name.is_some_and(|n| if *exact { n == value } else { n.contains(value.as_str()) })
            }
            Self::SetMembership { set: LabelSet::Tag, label } => {
                card.tag.iter().any(|t| t.eq_ignore_ascii_case(label))
            }
            Self::SetMembership { set: LabelSet::Status, label } => label
                .parse::<Status>()
                .is_ok_and(|s| has_status(&card.srs, s, now)),
            Self::TextMatch { key, text } => card
                .note_id
                .as_deref()
                .is_some_and(|note_id| index.matches(note_id, key.as_deref(), text)),
        }
    }
}

fn fmt_offset(offset: &Duration) -> String {
    let secs = offset.num_seconds();
    if secs == 0 {
        "now".to_string()
    } else {
        format!("now{secs:+}s")
    }
}

fn fmt_joined(f: &mut fmt::Formatter<'_>, parts: &[Predicate], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, p) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{p}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("TRUE"),
            Self::False => f.write_str("FALSE"),
            Self::And(parts) => fmt_joined(f, parts, " AND "),
            Self::Or(parts) => fmt_joined(f, parts, " OR "),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::IsNull(Nullable::Numeric(field)) => write!(f, "{} IS NULL", field.key()),
            Self::IsNull(Nullable::Date(field)) => write!(f, "{} IS NULL", field.key()),
            Self::CompareNumber { field, op, value } => {
                write!(f, "{} {} {value}", field.key(), op.as_str())
            }
            Self::CompareDate { field, op, offset } => {
                write!(f, "{} {} {}", field.key(), op.as_str(), fmt_offset(offset))
            }
            Self::Equals { field, value } => write!(f, "{} = {value:?}", field.key()),
            Self::NameMatch { field, value, exact } => {
                let op = if *exact { "=" } else { "~" };
                write!(f, "{} {op} {value:?}", field.key())
            }
            Self::SetMembership { set, label } => {
                let set = match set {
                    LabelSet::Tag => "tag",
                    LabelSet::Status => "status",
                };
                write!(f, "{set} HAS {label:?}")
            }
            Self::TextMatch { key: Some(key), text } => write!(f, "{key:?} MATCH {text:?}"),
            Self::TextMatch { key: None, text } => write!(f, "MATCH {text:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// note_id -> [(key, data)]
    #[derive(Default)]
    struct MapIndex(HashMap<String, Vec<(String, String)>>);

    impl AttributeIndex for MapIndex {
        fn matches(&self, note_id: &str, key: Option<&str>, text: &str) -> bool {
            self.0.get(note_id).is_some_and(|attrs| {
                attrs
                    .iter()
                    .any(|(k, v)| key.map_or(true, |want| want == k) && v.contains(text))
            })
        }
    }

    fn card_at_level(level: u32) -> Card {
        let mut card = Card::new("c1", Utc::now());
        card.srs.srs_level = level;
        card
    }

    #[test]
    fn boolean_connectives() {
        let card = card_at_level(0);
        let idx = MapIndex::default();
        let now = Utc::now();
        let subject = Subject::card(&card);
        assert!(Predicate::True.eval(&subject, &idx, now));
        assert!(!Predicate::False.eval(&subject, &idx, now));
        assert!(Predicate::And(vec![Predicate::True, Predicate::True]).eval(&subject, &idx, now));
        assert!(Predicate::Or(vec![Predicate::False, Predicate::True]).eval(&subject, &idx, now));
        assert!(Predicate::False.negate().eval(&subject, &idx, now));
    }

    #[test]
    fn absent_date_fails_every_comparison() {
        let card = card_at_level(0);
        let idx = MapIndex::default();
        let now = Utc::now();
        for op in [CompareOp::Eq, CompareOp::Lt, CompareOp::Gt, CompareOp::Le, CompareOp::Ge] {
            let p = Predicate::CompareDate {
                field: DateField::NextReview,
                op,
                offset: Duration::zero(),
            };
            assert!(!p.eval(&Subject::card(&card), &idx, now));
        }
        let null = Predicate::IsNull(Nullable::Date(DateField::NextReview));
        assert!(null.eval(&Subject::card(&card), &idx, now));
    }

    #[test]
    fn date_bound_past_the_calendar_is_false() {
        let mut card = card_at_level(1);
        let now = Utc::now();
        card.srs.next_review = Some(now);
        let idx = MapIndex::default();
        for op in [CompareOp::Lt, CompareOp::Gt] {
            for offset in [Duration::weeks(99_999_999), Duration::weeks(-99_999_999)] {
                let p = Predicate::CompareDate {
                    field: DateField::NextReview,
                    op,
                    offset,
                };
                assert!(!p.eval(&Subject::card(&card), &idx, now));
            }
        }
    }

    #[test]
    fn join_fields_need_joined_rows() {
        let card = card_at_level(0);
        let template = Template {
            id: "t1".into(),
            name: "Japanese vocab".into(),
            model_id: Some("m1".into()),
            front: String::new(),
            back: String::new(),
            shared: String::new(),
        };
        let idx = MapIndex::default();
        let now = Utc::now();
        let p = Predicate::NameMatch {
            field: NameField::Template,
            value: "vocab".into(),
            exact: false,
        };
        assert!(!p.eval(&Subject::card(&card), &idx, now));
        let joined = Subject {
            card: &card,
            template: Some(&template),
            model: None,
        };
        assert!(p.eval(&joined, &idx, now));
        let model_id = Predicate::Equals {
            field: IdField::ModelId,
            value: "m1".into(),
        };
        assert!(model_id.eval(&joined, &idx, now));
    }

    #[test]
    fn text_match_goes_through_index() {
        let mut card = card_at_level(0);
        card.note_id = Some("n1".into());
        let mut idx = MapIndex::default();
        idx.0.insert(
            "n1".into(),
            vec![("reading".into(), "たべる".into()), ("english".into(), "to eat".into())],
        );
        let now = Utc::now();
        let subject = Subject::card(&card);
        let any_key = Predicate::TextMatch {
            key: None,
            text: "eat".into(),
        };
        let wrong_key = Predicate::TextMatch {
            key: Some("reading".into()),
            text: "eat".into(),
        };
        assert!(any_key.eval(&subject, &idx, now));
        assert!(!wrong_key.eval(&subject, &idx, now));
    }

    #[test]
    fn tag_membership_ignores_ascii_case() {
        let mut card = card_at_level(0);
        card.tag.insert("JLPT-n5".into());
        let idx = MapIndex::default();
        let now = Utc::now();
        let tag = |label: &str| Predicate::SetMembership {
            set: LabelSet::Tag,
            label: label.into(),
        };
        assert!(tag("jlpt-N5").eval(&Subject::card(&card), &idx, now));
        assert!(!tag("jlpt").eval(&Subject::card(&card), &idx, now));
    }

    #[test]
    fn display_shows_grouping() {
        let p = Predicate::Or(vec![
            Predicate::SetMembership {
                set: LabelSet::Tag,
                label: "b".into(),
            },
            Predicate::And(vec![
                Predicate::CompareNumber {
                    field: NumericField::SrsLevel,
                    op: CompareOp::Gt,
                    value: 3,
                },
                Predicate::True.negate(),
            ]),
        ]);
        assert_eq!(p.to_string(), r#"(tag HAS "b" OR (srsLevel > 3 AND NOT TRUE))"#);
    }
}
