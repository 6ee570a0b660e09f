//! User-facing texts and menus

use crate::models::{CurrencyCode, CurrencySet, Direction, MenuOption, RESET_TOKEN};
use rust_decimal::{Decimal, RoundingStrategy};

pub const CHOOSE_ACTION: &str = "Choose an action:";
pub const DIALOG_CLEARED: &str = "Dialog cleared.";
pub const OPERATION_CANCELLED: &str = "Operation cancelled.";
pub const INVALID_AMOUNT: &str = "Please enter a positive numeric value.";
pub const AMOUNT_TOO_LARGE: &str = "The amount is too large to convert.";
pub const AMOUNT_TOO_SMALL: &str = "The amount is too small to convert.";
pub const RATES_UNAVAILABLE: &str = "Could not fetch exchange rates. Please try again later.";
pub const CLEAR_DIALOG_LABEL: &str = "Clear dialog";

/// Step-1 options: the two conversion directions.
pub fn direction_options(home: &CurrencyCode) -> Vec<MenuOption> {
    Direction::ALL
        .into_iter()
        .map(|direction| MenuOption::new(direction_label(direction, home), direction.token()))
        .collect()
}

fn direction_label(direction: Direction, home: &CurrencyCode) -> String {
    match direction {
        Direction::HomeToForeign => format!("From {} to currency", home),
        Direction::ForeignToHome => format!("From currency to {}", home),
    }
}

pub fn choose_currency(direction: Direction) -> &'static str {
    match direction {
        Direction::HomeToForeign => "Choose the currency to convert to:",
        Direction::ForeignToHome => "Choose the currency to convert from:",
    }
}

/// One option per currency, plus a way back to the menu.
pub fn currency_options(currencies: &CurrencySet) -> Vec<MenuOption> {
    currencies
        .iter()
        .map(|code| MenuOption::new(code.as_str(), code.as_str()))
        .chain(std::iter::once(MenuOption::new(CLEAR_DIALOG_LABEL, RESET_TOKEN)))
        .collect()
}

pub fn enter_amount(direction: Direction, home: &CurrencyCode, currency: &CurrencyCode) -> String {
    match direction {
        Direction::HomeToForeign => format!("Enter the amount in {}:", home),
        Direction::ForeignToHome => format!("Enter the amount in {}:", currency),
    }
}

pub fn rate_unavailable(currency: &CurrencyCode) -> String {
    format!("The rate for {} is unavailable.", currency)
}

pub fn rate_is_zero(currency: &CurrencyCode) -> String {
    format!("The rate for {} is zero.", currency)
}

pub fn conversion_result(
    amount: Decimal,
    from: &CurrencyCode,
    result: Decimal,
    to: &CurrencyCode,
) -> String {
    format!("{} {} = {} {}", two_dp(amount), from, two_dp(result), to)
}

/// Fixed two-decimal rendering, rounding half away from zero.
pub fn two_dp(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}
