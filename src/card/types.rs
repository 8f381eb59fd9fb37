//! Card, template and model records.
//!
//! A [`Card`] carries its review state as an embedded [`SrsState`]; applying
//! a scheduler result replaces that struct wholesale. Status is never stored,
//! see [`Card::status`].

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::srs::status::{derive_status, Status};
use crate::srs::SrsState;

/// A review unit, matching the `card` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// UUID v7 primary key.
    pub id: String,
    pub template_id: Option<String>,
    pub note_id: Option<String>,
    /// Content overrides. Empty means "inherit from template, then model".
    pub front: String,
    pub back: String,
    pub shared: String,
    /// Never inherited.
    pub mnemonic: String,
    #[serde(flatten)]
    pub srs: SrsState,
    pub tag: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// A fresh, never-reviewed card with no content.
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            template_id: None,
            note_id: None,
            front: String::new(),
            back: String::new(),
            shared: String::new(),
            mnemonic: String::new(),
            srs: SrsState::default(),
            tag: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Derived status labels as of `now`.
    pub fn status(&self, now: DateTime<Utc>) -> BTreeSet<Status> {
        derive_status(&self.srs, now)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.contains(tag)
    }
}

/// A template renders notes into cards; belongs to at most one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub model_id: Option<String>,
    pub front: String,
    pub back: String,
    pub shared: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: String,
    pub name: String,
    pub front: String,
    pub back: String,
    pub shared: String,
}

/// Encode a label set as stored: `" a b "`, or `""` when empty.
///
/// The padding makes `instr(tag, ' ' || label || ' ')` an exact membership test.
pub fn encode_labels(labels: &BTreeSet<String>) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let mut out = String::from(" ");
    for label in labels {
        out.push_str(label);
        out.push(' ');
    }
    out
}

/// Inverse of [`encode_labels`]. Tolerates missing padding.
pub fn decode_labels(raw: &str) -> BTreeSet<String> {
    raw.split(' ')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Canonical timestamp text. Fixed width with a `Z` suffix, so SQL string
/// comparison orders the same as time.
pub fn timestamp_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn timestamp_from_sql(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}
