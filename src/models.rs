//! Core data models for the currency exchange bot

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ExchangeBotError;

//
// ================= Identifiers =================
//

/// Stable identifier of one conversation (one chat).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for ConversationId {
    fn from(chat_id: i64) -> Self {
        Self(chat_id.to_string())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-letter ISO-style currency code, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(code: &str) -> crate::Result<Self> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_uppercase()))
        } else {
            Err(ExchangeBotError::Config(format!(
                "Invalid currency code: {:?}",
                code
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ExchangeBotError;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set of foreign currencies offered to the user, in menu order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySet {
    codes: Vec<CurrencyCode>,
}

impl CurrencySet {
    pub fn new(codes: Vec<CurrencyCode>) -> crate::Result<Self> {
        if codes.is_empty() {
            return Err(ExchangeBotError::Config(
                "Currency set must not be empty".to_string(),
            ));
        }

        for (i, code) in codes.iter().enumerate() {
            if codes[..i].contains(code) {
                return Err(ExchangeBotError::Config(format!(
                    "Duplicate currency in set: {}",
                    code
                )));
            }
        }

        Ok(Self { codes })
    }

    /// Look up a member by its exact button payload.
    pub fn find(&self, code: &str) -> Option<&CurrencyCode> {
        self.codes.iter().find(|c| c.as_str() == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.codes.iter()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

//
// ================= Dialogue =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    SelectAction,
    SelectCurrency,
    EnterAmount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HomeToForeign,
    ForeignToHome,
}

/// Button payload that clears the dialogue from any phase.
pub const RESET_TOKEN: &str = "CLEAR_DIALOG";

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::HomeToForeign, Direction::ForeignToHome];

    /// Button payload for this direction
    pub fn token(self) -> &'static str {
        match self {
            Direction::HomeToForeign => "HOME_TO_FOREIGN",
            Direction::ForeignToHome => "FOREIGN_TO_HOME",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.token() == token)
    }
}

/// Transient per-conversation state. `Default` is the cleared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub phase: Phase,
    pub direction: Option<Direction>,
    pub currency: Option<CurrencyCode>,
    pub amount: Option<Decimal>,
}

impl ConversationState {
    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }
}

//
// ================= Transport Boundary =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Command,
    #[serde(alias = "button_press")]
    Button,
    #[serde(alias = "text_message")]
    Text,
}

/// A transport event decoded into the dialogue's terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    pub conversation_id: ConversationId,
    pub kind: EventKind,
    /// Command name without slash, button payload, or message text
    pub payload: String,
}

impl InboundEvent {
    pub fn command(conversation_id: ConversationId, name: &str) -> Self {
        Self {
            conversation_id,
            kind: EventKind::Command,
            payload: name.to_string(),
        }
    }

    pub fn button(conversation_id: ConversationId, payload: &str) -> Self {
        Self {
            conversation_id,
            kind: EventKind::Button,
            payload: payload.to_string(),
        }
    }

    pub fn text(conversation_id: ConversationId, text: &str) -> Self {
        Self {
            conversation_id,
            kind: EventKind::Text,
            payload: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub value: String,
}

impl MenuOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// How the transport should show a reply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Replace the message whose button was pressed
    EditPrevious,
    NewMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<MenuOption>>,
    pub delivery: Delivery,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::HomeToForeign => "home-to-foreign",
            Direction::ForeignToHome => "foreign-to-home",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_parse() {
        assert_eq!(CurrencyCode::parse(" usd ").unwrap().as_str(), "USD");
        assert!(CurrencyCode::parse("US").is_err());
        assert!(CurrencyCode::parse("U5D").is_err());
        assert!(CurrencyCode::parse("").is_err());
    }

    #[test]
    fn test_currency_set_rejects_duplicates_and_empty() {
        assert!(CurrencySet::new(vec![]).is_err());

        let usd = CurrencyCode::parse("USD").unwrap();
        assert!(CurrencySet::new(vec![usd.clone(), usd]).is_err());
    }

    #[test]
    fn test_currency_set_find_is_exact() {
        let set = CurrencySet::new(vec![
            CurrencyCode::parse("USD").unwrap(),
            CurrencyCode::parse("EUR").unwrap(),
        ])
        .unwrap();

        assert_eq!(set.find("EUR").map(|c| c.as_str()), Some("EUR"));
        assert!(set.find("eur").is_none());
        assert!(set.find("JPY").is_none());
    }

    #[test]
    fn test_direction_tokens() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_token(direction.token()), Some(direction));
        }
        assert_eq!(Direction::from_token(RESET_TOKEN), None);
    }

    #[test]
    fn test_default_state_is_cleared() {
        let state = ConversationState {
            phase: Phase::EnterAmount,
            direction: Some(Direction::ForeignToHome),
            currency: Some(CurrencyCode::parse("EUR").unwrap()),
            amount: None,
        };
        assert!(!state.is_cleared());
        assert!(ConversationState::default().is_cleared());
        assert_eq!(ConversationState::default().phase, Phase::SelectAction);
    }

    #[test]
    fn test_event_kind_deserialization() {
        let event: InboundEvent = serde_json::from_str(
            r#"{"conversation_id":"42","kind":"button","payload":"USD"}"#,
        )
        .unwrap();
        assert_eq!(event.kind, EventKind::Button);
        assert_eq!(event.conversation_id.as_str(), "42");
    }
}
