//! Dialogue state machine
//!
//! SELECT ACTION → SELECT CURRENCY → ENTER AMOUNT → back to SELECT ACTION
//!
//! Every problem, whatever its cause, returns the conversation to the
//! main menu with its state cleared. Out-of-phase input is ignored.

use crate::conversion::{self, ConversionError};
use crate::error::ExchangeBotError;
use crate::models::{
    ConversationId, ConversationState, CurrencyCode, CurrencySet, Delivery, Direction, EventKind,
    InboundEvent, MenuOption, OutboundMessage, Phase, RESET_TOKEN,
};
use crate::rates::RateSource;
use crate::state::ConversationStore;
use crate::Result;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod prompts;

pub const START_COMMAND: &str = "start";
pub const CANCEL_COMMAND: &str = "cancel";

/// A reply before the delivery mode is decided
#[derive(Debug)]
struct Reply {
    text: String,
    options: Option<Vec<MenuOption>>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: None,
        }
    }

    fn with_options(text: impl Into<String>, options: Vec<MenuOption>) -> Self {
        Self {
            text: text.into(),
            options: Some(options),
        }
    }

    fn deliver(self, delivery: Delivery) -> OutboundMessage {
        OutboundMessage {
            text: self.text,
            options: self.options,
            delivery,
        }
    }
}

/// Owns every conversation's state and advances it one event at a time
pub struct DialogStateMachine {
    rates: Arc<dyn RateSource>,
    home_currency: CurrencyCode,
    currencies: CurrencySet,
    conversations: ConversationStore,
}

impl DialogStateMachine {
    pub fn new(
        rates: Arc<dyn RateSource>,
        home_currency: CurrencyCode,
        currencies: CurrencySet,
    ) -> Self {
        Self {
            rates,
            home_currency,
            currencies,
            conversations: ConversationStore::new(),
        }
    }

    /// State of a conversation part way through the dialogue; `None` once cleared.
    pub fn state(&self, id: &ConversationId) -> Option<&ConversationState> {
        self.conversations.get(id)
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }

    /// Process one inbound event to completion.
    ///
    /// Never fails: an error inside a transition is logged and the
    /// conversation is steered back to the main menu.
    pub async fn handle(&mut self, event: &InboundEvent) -> Vec<OutboundMessage> {
        let delivery = match event.kind {
            EventKind::Button => Delivery::EditPrevious,
            EventKind::Command | EventKind::Text => Delivery::NewMessage,
        };

        let replies = match self.transition(event).await {
            Ok(replies) => replies,
            Err(e) => {
                error!(
                    conversation_id = %event.conversation_id,
                    error = %e,
                    "Transition failed - returning to main menu"
                );
                self.conversations.reset(&event.conversation_id);
                vec![self.main_menu()]
            }
        };

        replies
            .into_iter()
            .map(|reply| reply.deliver(delivery))
            .collect()
    }

    async fn transition(&mut self, event: &InboundEvent) -> Result<Vec<Reply>> {
        let id = &event.conversation_id;

        // Fallbacks available in any phase
        match (event.kind, event.payload.as_str()) {
            (EventKind::Command, START_COMMAND) => return Ok(self.restart(id, None)),
            (EventKind::Command, CANCEL_COMMAND) => {
                return Ok(self.restart(id, Some(prompts::OPERATION_CANCELLED.to_string())))
            }
            (EventKind::Button, RESET_TOKEN) => {
                return Ok(self.restart(id, Some(prompts::DIALOG_CLEARED.to_string())))
            }
            _ => {}
        }

        // Unknown conversations sit in the initial phase without being stored
        let phase = self
            .conversations
            .get(id)
            .map(|state| state.phase)
            .unwrap_or_default();

        debug!(
            conversation_id = %id,
            ?phase,
            kind = ?event.kind,
            "Processing event"
        );

        match (phase, event.kind) {
            (Phase::SelectAction, EventKind::Button) => Ok(self.select_action(event)),
            (Phase::SelectCurrency, EventKind::Button) => self.select_currency(event),
            (Phase::EnterAmount, EventKind::Text) => self.enter_amount(event).await,
            _ => Ok(ignore(event, phase)),
        }
    }

    fn select_action(&mut self, event: &InboundEvent) -> Vec<Reply> {
        let Some(direction) = Direction::from_token(&event.payload) else {
            return ignore(event, Phase::SelectAction);
        };

        let state = self.conversations.get_or_create(&event.conversation_id);
        state.direction = Some(direction);
        state.phase = Phase::SelectCurrency;

        vec![Reply::with_options(
            prompts::choose_currency(direction),
            prompts::currency_options(&self.currencies),
        )]
    }

    fn select_currency(&mut self, event: &InboundEvent) -> Result<Vec<Reply>> {
        let Some(currency) = self.currencies.find(&event.payload).cloned() else {
            return Ok(ignore(event, Phase::SelectCurrency));
        };

        let state = self.conversations.get_or_create(&event.conversation_id);
        let direction = state.direction.ok_or_else(|| {
            ExchangeBotError::InvalidState("currency selected before direction".to_string())
        })?;

        let prompt = prompts::enter_amount(direction, &self.home_currency, &currency);
        state.currency = Some(currency);
        state.phase = Phase::EnterAmount;

        Ok(vec![Reply::text(prompt)])
    }

    async fn enter_amount(&mut self, event: &InboundEvent) -> Result<Vec<Reply>> {
        let id = &event.conversation_id;

        let amount = match parse_amount(&event.payload) {
            Ok(amount) => amount,
            Err(e) => {
                debug!(conversation_id = %id, reason = %e, "Rejected amount input");
                let notice = match e {
                    AmountError::Invalid => prompts::INVALID_AMOUNT,
                    AmountError::TooLarge => prompts::AMOUNT_TOO_LARGE,
                    AmountError::TooSmall => prompts::AMOUNT_TOO_SMALL,
                };
                return Ok(self.restart(id, Some(notice.to_string())));
            }
        };

        let state = self.conversations.get_or_create(id);
        state.amount = Some(amount);

        let direction = state.direction.ok_or_else(|| {
            ExchangeBotError::InvalidState("amount entered before direction".to_string())
        })?;
        let currency = state.currency.clone().ok_or_else(|| {
            ExchangeBotError::InvalidState("amount entered before currency".to_string())
        })?;

        let table = match self.rates.fetch().await {
            Ok(table) => table,
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Rate fetch failed");
                return Ok(self.restart(id, Some(prompts::RATES_UNAVAILABLE.to_string())));
            }
        };

        let Some(rate) = table.get(&currency) else {
            warn!(conversation_id = %id, currency = %currency, "Rate missing from response");
            return Ok(self.restart(id, Some(prompts::rate_unavailable(&currency))));
        };

        let home = &self.home_currency;
        let outcome = match direction {
            Direction::HomeToForeign => conversion::to_foreign(amount, rate)
                .map(|result| prompts::conversion_result(amount, home, result, &currency)),
            Direction::ForeignToHome => conversion::to_home(amount, rate)
                .map(|result| prompts::conversion_result(amount, &currency, result, home)),
        };

        let text = match outcome {
            Ok(text) => {
                info!(
                    conversation_id = %id,
                    %direction,
                    currency = %currency,
                    %rate,
                    "Conversion completed"
                );
                text
            }
            Err(ConversionError::ZeroRate) => {
                warn!(conversation_id = %id, currency = %currency, "Rate is zero");
                prompts::rate_is_zero(&currency)
            }
            Err(ConversionError::Overflow) => prompts::AMOUNT_TOO_LARGE.to_string(),
        };

        Ok(self.restart(id, Some(text)))
    }

    /// Clear the conversation and show the main menu, optionally after a notice.
    fn restart(&mut self, id: &ConversationId, notice: Option<String>) -> Vec<Reply> {
        self.conversations.reset(id);

        notice
            .map(Reply::text)
            .into_iter()
            .chain(std::iter::once(self.main_menu()))
            .collect()
    }

    fn main_menu(&self) -> Reply {
        Reply::with_options(
            prompts::CHOOSE_ACTION,
            prompts::direction_options(&self.home_currency),
        )
    }
}

fn ignore(event: &InboundEvent, phase: Phase) -> Vec<Reply> {
    warn!(
        conversation_id = %event.conversation_id,
        ?phase,
        kind = ?event.kind,
        payload = %event.payload,
        "Ignoring out-of-phase input"
    );
    Vec::new()
}

/// Why an amount input was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("not a positive number")]
    Invalid,
    #[error("positive number above the decimal range")]
    TooLarge,
    #[error("positive number below the decimal precision")]
    TooSmall,
}

/// Parse a strictly positive decimal amount.
///
/// Well-formed positive numbers that a `Decimal` cannot represent are told
/// apart from malformed input so the user can be told which it was.
pub fn parse_amount(input: &str) -> std::result::Result<Decimal, AmountError> {
    let input = input.trim();

    let parsed = Decimal::from_str(input)
        .or_else(|_| Decimal::from_scientific(input))
        .ok();
    if let Some(amount) = parsed.filter(|amount| *amount > Decimal::ZERO) {
        return Ok(amount);
    }

    match order_of_magnitude(input) {
        Some(order) if order >= 0 => Err(AmountError::TooLarge),
        Some(_) => Err(AmountError::TooSmall),
        None => Err(AmountError::Invalid),
    }
}

/// Power of ten of the leading significant digit of a plain or scientific
/// positive literal. `None` for anything else, zero included.
fn order_of_magnitude(input: &str) -> Option<i64> {
    let unsigned = input.strip_prefix('+').unwrap_or(input);
    let (mantissa, exponent) = match unsigned.split_once(|c: char| c == 'e' || c == 'E') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return None;
    }

    let order = match int_part.trim_start_matches('0') {
        "" => {
            let leading_zeros = frac_part.find(|c: char| c != '0')?;
            -(leading_zeros as i64) - 1
        }
        significant => significant.len() as i64 - 1,
    };
    exponent.checked_add(order)
}
