//! Query string scanner.
//!
//! [`tokenize`] walks the query once, left to right, with an explicit
//! [`State`] and a quoting sub-state. Quoted keys and values keep their
//! surrounding quotes; the compiler strips them.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Leading modifier of a clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    /// No prefix: the clause is AND-ed with the other unsigned clauses.
    #[default]
    None,
    /// `?` prefix: the clause joins the OR group.
    Or,
    /// `-` prefix: the clause joins the negated group.
    Not,
}

impl Sign {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Or => "?",
            Self::Not => "-",
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '?' => Some(Self::Or),
            '-' => Some(Self::Not),
            _ => None,
        }
    }
}

/// Operator between a key and its value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    #[default]
    None,
    Colon,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Colon => ":",
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            ':' => Some(Self::Colon),
            '=' => Some(Self::Eq),
            '<' => Some(Self::Lt),
            '>' => Some(Self::Gt),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{sign, key, op, value}` unit of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub sign: Sign,
    pub key: String,
    pub op: Operator,
    pub value: String,
}

impl Clause {
    pub fn new(sign: Sign, key: impl Into<String>, op: Operator, value: impl Into<String>) -> Self {
        Self {
            sign,
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    /// A clause with only a key, as produced for a bare search term.
    pub fn bare(key: impl Into<String>) -> Self {
        Self::new(Sign::None, key, Operator::None, "")
    }
}

/// Serializes back to query syntax; tokenizing the output yields the same clause.
impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", self.sign.as_str(), self.key, self.op, self.value)
    }
}

/// Joins clauses with single spaces.
pub fn to_query_string(clauses: &[Clause]) -> String {
    clauses
        .iter()
        .map(Clause::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A quoted span contained an unescaped `"` before its closing quote.
    #[error("overquoted: {prefix}")]
    Overquoted { prefix: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Sign,
    Key,
    Op,
    Value,
}

/// Scan a query into clauses.
///
/// A blank query yields an empty list. Clauses whose key ends up empty are
/// dropped. The only failure is [`ParseError::Overquoted`].
pub fn tokenize(query: &str) -> Result<Vec<Clause>, ParseError> {
    let mut out = Vec::new();
    if query.trim().is_empty() {
        return Ok(out);
    }

    let mut state = State::Sign;
    let mut current = Clause::default();
    let mut quoted: Option<String> = None;
    let mut escaped = false;

    let mut chars = query.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let is_quote = c == '"' && !escaped;
        escaped = c == '\\' && !escaped;

        if let Some(buf) = quoted.as_mut() {
            let next = chars.peek().map(|&(_, n)| n);
            if !(is_quote && ends_quoted_span(next)) {
                buf.push(c);
                continue;
            }

            if contains_unescaped_quote(&buf[1..]) {
                return Err(ParseError::Overquoted {
                    prefix: query[..i + c.len_utf8()].to_string(),
                });
            }
            buf.push(c);
            let span = std::mem::take(buf);
            quoted = None;

            match state {
                State::Sign | State::Key => {
                    current.key = span;
                    state = State::Key;
                }
                State::Op | State::Value => {
                    current.value = span;
                    out.push(std::mem::take(&mut current));
                    state = State::Sign;
                }
            }
            continue;
        }

        if is_quote {
            quoted = Some(String::from('"'));
            continue;
        }

        if c == ' ' {
            if !current.key.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            current = Clause::default();
            state = State::Sign;
            continue;
        }

        if state == State::Sign {
            state = State::Key;
            if let Some(sign) = Sign::from_char(c) {
                current.sign = sign;
                continue;
            }
        }

        match state {
            State::Key => match Operator::from_char(c) {
                Some(op) => {
                    current.op = op;
                    state = State::Op;
                }
                None => current.key.push(c),
            },
            State::Op => {
                state = State::Value;
                match (current.op, c) {
                    (Operator::Lt, '=') => current.op = Operator::Le,
                    (Operator::Gt, '=') => current.op = Operator::Ge,
                    _ => current.value.push(c),
                }
            }
            State::Value => current.value.push(c),
            State::Sign => unreachable!("sign state is left before dispatch"),
        }
    }

    // Unterminated quote: keep the text literally.
    if let Some(buf) = quoted {
        match state {
            State::Sign | State::Key => current.key.push_str(&buf),
            State::Op | State::Value => current.value.push_str(&buf),
        }
    }

    if !current.key.is_empty() {
        out.push(current);
    }

    Ok(out)
}

/// A quote closes a span only when followed by a clause or key boundary.
fn ends_quoted_span(next: Option<char>) -> bool {
    matches!(next, None | Some(' ' | ':' | '=' | '<' | '>'))
}

fn contains_unescaped_quote(s: &str) -> bool {
    let mut escaped = false;
    for c in s.chars() {
        if c == '"' && !escaped {
            return true;
        }
        escaped = c == '\\' && !escaped;
    }
    false
}
