//! Clause interpretation and boolean combination.
//!
//! [`compile`] is total. A clause whose value makes no sense for its field
//! becomes [`Predicate::False`] instead of an error, so one bad term narrows
//! the result to nothing without aborting the search.

use chrono::Duration;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::predicate::{
    CompareOp, DateField, IdField, LabelSet, NameField, Nullable, NumericField, Predicate,
};
use super::tokenize::{tokenize, Clause, Operator, ParseError, Sign};

static RELATIVE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?)(\d+)(min|h|d|w)$").expect("static regex"));

/// Joins the store must perform before evaluating a predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Joins {
    pub template: bool,
    pub model: bool,
}

/// A predicate plus the joins it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub predicate: Predicate,
    pub joins: Joins,
}

impl CompiledQuery {
    /// Matches every card.
    pub fn all() -> Self {
        Self {
            predicate: Predicate::True,
            joins: Joins::default(),
        }
    }

    /// Matches no card.
    pub fn none() -> Self {
        Self {
            predicate: Predicate::False,
            joins: Joins::default(),
        }
    }
}

/// Tokenize and compile, reporting an overquoted query to the caller.
pub fn parse(query: &str) -> Result<CompiledQuery, ParseError> {
    Ok(compile(&tokenize(query)?))
}

/// Tokenize and compile in one step.
///
/// A query that fails to tokenize compiles to [`CompiledQuery::none`]. Use
/// [`parse`] to report the error instead.
pub fn search(query: &str) -> CompiledQuery {
    match parse(query) {
        Ok(compiled) => compiled,
        Err(err) => {
            tracing::warn!(error = %err, "query failed to tokenize, matching nothing");
            CompiledQuery::none()
        }
    }
}

/// Combine clauses as `OR-group OR (AND-group AND NOT(NOT-group))`.
///
/// Unsigned clauses are AND-ed (true when there are none). `?` clauses are
/// OR-ed and, when present, OR-ed with the AND branch. `-` clauses are AND-ed
/// together and the conjunction as a whole is negated into the AND branch.
pub fn compile(clauses: &[Clause]) -> CompiledQuery {
    let mut joins = Joins::default();
    let mut and_parts = Vec::new();
    let mut or_parts = Vec::new();
    let mut not_parts = Vec::new();

    for clause in clauses {
        let predicate = make_clause(clause, &mut joins);
        match clause.sign {
            Sign::None => and_parts.push(predicate),
            Sign::Or => or_parts.push(predicate),
            Sign::Not => not_parts.push(predicate),
        }
    }

    if !not_parts.is_empty() {
        and_parts.push(Predicate::all(not_parts).negate());
    }
    let and_cond = Predicate::all(and_parts);

    let predicate = if or_parts.is_empty() {
        and_cond
    } else {
        or_parts.push(and_cond);
        Predicate::any(or_parts)
    };

    tracing::debug!(%predicate, ?joins, "compiled query");
    CompiledQuery { predicate, joins }
}

/// Interpret one clause. A clause with no value is a bare term on its key.
pub fn make_clause(clause: &Clause, joins: &mut Joins) -> Predicate {
    let (key, value) = if clause.value.is_empty() {
        ("", clause.key.as_str())
    } else {
        (clause.key.as_str(), clause.value.as_str())
    };

    if let Some(field) = NumericField::from_key(key) {
        return make_number(field, clause.op, value);
    }
    if let Some(field) = DateField::from_key(key) {
        return make_date(field, clause.op, value);
    }

    let value = dequote(value);

    match key {
        "tag" => Predicate::SetMembership {
            set: LabelSet::Tag,
            label: value.to_string(),
        },
        "status" => Predicate::SetMembership {
            set: LabelSet::Status,
            label: value.to_string(),
        },
        "id" => equals(IdField::Id, value),
        "noteId" => equals(IdField::NoteId, value),
        "templateId" => equals(IdField::TemplateId, value),
        "modelId" => {
            joins.template = true;
            equals(IdField::ModelId, value)
        }
        "template" => {
            joins.template = true;
            name_match(NameField::Template, clause.op, value)
        }
        "model" => {
            joins.template = true;
            joins.model = true;
            name_match(NameField::Model, clause.op, value)
        }
        _ => {
            if value.is_empty() {
                return Predicate::False;
            }
            let key = dequote(key);
            Predicate::TextMatch {
                key: (!key.is_empty()).then(|| key.to_string()),
                text: value.to_string(),
            }
        }
    }
}

fn equals(field: IdField, value: &str) -> Predicate {
    Predicate::Equals {
        field,
        value: value.to_string(),
    }
}

fn name_match(field: NameField, op: Operator, value: &str) -> Predicate {
    Predicate::NameMatch {
        field,
        value: value.to_string(),
        exact: op == Operator::Eq,
    }
}

fn compare_op(op: Operator) -> Option<CompareOp> {
    match op {
        Operator::Colon | Operator::Eq => Some(CompareOp::Eq),
        Operator::Lt => Some(CompareOp::Lt),
        Operator::Gt => Some(CompareOp::Gt),
        Operator::Le => Some(CompareOp::Le),
        Operator::Ge => Some(CompareOp::Ge),
        Operator::None => None,
    }
}

fn make_number(field: NumericField, op: Operator, value: &str) -> Predicate {
    if value == "NULL" {
        return Predicate::IsNull(Nullable::Numeric(field));
    }
    match (compare_op(op), value.parse::<i64>()) {
        (Some(op), Ok(value)) => Predicate::CompareNumber { field, op, value },
        _ => Predicate::False,
    }
}

fn make_date(field: DateField, op: Operator, value: &str) -> Predicate {
    if value == "NULL" {
        return Predicate::IsNull(Nullable::Date(field));
    }
    let Some(RelativeDate { offset, unit }) = parse_relative_date(value) else {
        return Predicate::False;
    };

    match op {
        Operator::Colon | Operator::Eq => {
            let half = unit / 2;
            match (offset.checked_sub(&half), offset.checked_add(&half)) {
                (Some(start), Some(end)) => Predicate::And(vec![
                    Predicate::CompareDate {
                        field,
                        op: CompareOp::Gt,
                        offset: start,
                    },
                    Predicate::CompareDate {
                        field,
                        op: CompareOp::Lt,
                        offset: end,
                    },
                ]),
                _ => Predicate::False,
            }
        }
        other => match compare_op(other) {
            Some(op) => Predicate::CompareDate { field, op, offset },
            None => Predicate::False,
        },
    }
}

/// A parsed `[+-]N(min|h|d|w)` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeDate {
    /// Signed offset from now. Unsigned values point into the past.
    pub offset: Duration,
    /// Length of one unit, used for the width of `:` windows.
    pub unit: Duration,
}

pub fn parse_relative_date(value: &str) -> Option<RelativeDate> {
    let caps = RELATIVE_DATE.captures(value)?;
    let sign: i64 = if &caps[1] == "+" { 1 } else { -1 };
    let amount: i64 = caps[2].parse().ok()?;
    let unit_minutes: i64 = match &caps[3] {
        "min" => 1,
        "h" => 60,
        "d" => 24 * 60,
        "w" => 7 * 24 * 60,
        _ => return None,
    };

    let minutes = amount.checked_mul(unit_minutes)?.checked_mul(sign)?;
    Some(RelativeDate {
        offset: Duration::try_minutes(minutes)?,
        unit: Duration::try_minutes(unit_minutes)?,
    })
}

/// Strip one leading and one trailing `"` when both are present.
pub fn dequote(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
