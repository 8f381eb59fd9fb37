//! Card content inheritance. An empty side on a card falls back to its
//! template, then to the template's model.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use rusqlite::Connection;

use crate::card::store::{get_model, get_template};
use crate::card::types::{Card, Model, Template};

/// A content slot that can be inherited from the template or model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Shared,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(Self::Front),
            "back" => Ok(Self::Back),
            "shared" => Ok(Self::Shared),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

fn pick<'a>(front: &'a str, back: &'a str, shared: &'a str, side: Side) -> &'a str {
    match side {
        Side::Front => front,
        Side::Back => back,
        Side::Shared => shared,
    }
}

/// First non-empty value of `side` on the card, then its template, then the model.
///
/// Returns `""` when nothing along the chain sets it.
pub fn resolve_side<'a>(
    card: &'a Card,
    template: Option<&'a Template>,
    model: Option<&'a Model>,
    side: Side,
) -> &'a str {
    let chain = [
        Some(pick(&card.front, &card.back, &card.shared, side)),
        template.map(|t| pick(&t.front, &t.back, &t.shared, side)),
        model.map(|m| pick(&m.front, &m.back, &m.shared, side)),
    ];
    chain
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

/// [`resolve_side`] for a stored card, loading its template and model.
pub fn stored_side(conn: &Connection, card: &Card, side: Side) -> Result<String> {
    let template = match card.template_id.as_deref() {
        Some(id) => get_template(conn, id)?,
        None => None,
    };
    let model = match template.as_ref().and_then(|t| t.model_id.as_deref()) {
        Some(id) => get_model(conn, id)?,
        None => None,
    };
    Ok(resolve_side(card, template.as_ref(), model.as_ref(), side).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn template(front: &str) -> Template {
        Template {
            id: "t1".into(),
            name: "Forward".into(),
            model_id: Some("m1".into()),
            front: front.into(),
            back: String::new(),
            shared: String::new(),
        }
    }

    fn model() -> Model {
        Model {
            id: "m1".into(),
            name: "Basic".into(),
            front: "{{word}}".into(),
            back: "{{meaning}}".into(),
            shared: "<style/>".into(),
        }
    }

    #[test]
    fn card_overrides_win() {
        let mut card = Card::new("c1", Utc::now());
        card.front = "custom".into();
        let t = template("{{reading}}");
        let m = model();
        assert_eq!(resolve_side(&card, Some(&t), Some(&m), Side::Front), "custom");
    }

    #[test]
    fn falls_through_to_template_then_model() {
        let card = Card::new("c1", Utc::now());
        let t = template("{{reading}}");
        let m = model();
        assert_eq!(resolve_side(&card, Some(&t), Some(&m), Side::Front), "{{reading}}");
        assert_eq!(resolve_side(&card, Some(&t), Some(&m), Side::Back), "{{meaning}}");
        assert_eq!(resolve_side(&card, None, Some(&m), Side::Shared), "<style/>");
        assert_eq!(resolve_side(&card, None, None, Side::Back), "");
    }

    #[test]
    fn side_parses_and_prints() {
        assert_eq!("back".parse::<Side>(), Ok(Side::Back));
        assert!("mnemonic".parse::<Side>().is_err());
        for side in [Side::Front, Side::Back, Side::Shared] {
            assert_eq!(side.to_string().parse::<Side>(), Ok(side));
        }
    }

    #[test]
    fn stored_side_follows_template_and_model() {
        use crate::card::store::{
            get_card, insert_card, insert_model, insert_template, NewCard, NewModel, NewTemplate,
        };

        let conn = crate::db::open_memory_database().unwrap();
        let model_id = insert_model(
            &conn,
            &NewModel {
                name: "Basic".into(),
                back: "{{meaning}}".into(),
                ..NewModel::default()
            },
        )
        .unwrap();
        let template_id = insert_template(
            &conn,
            &NewTemplate {
                name: "Forward".into(),
                model_id: Some(model_id),
                front: "{{word}}".into(),
                ..NewTemplate::default()
            },
        )
        .unwrap();
        let id = insert_card(
            &conn,
            &NewCard {
                template_id: Some(template_id),
                ..NewCard::default()
            },
        )
        .unwrap();
        let card = get_card(&conn, &id).unwrap().unwrap();

        assert_eq!(stored_side(&conn, &card, Side::Front).unwrap(), "{{word}}");
        assert_eq!(stored_side(&conn, &card, Side::Back).unwrap(), "{{meaning}}");
        assert_eq!(stored_side(&conn, &card, Side::Shared).unwrap(), "");
    }
}
