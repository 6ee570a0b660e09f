//! Currency Exchange Bot
//!
//! A conversational agent that converts amounts between a home currency and
//! a fixed set of foreign currencies using live rates:
//! - Drives a three-step dialogue per chat (action → currency → amount)
//! - Fetches fresh rates from a quote API on every conversion
//! - Recovers from every problem by returning the chat to the main menu
//! - Talks to users over Telegram long polling or a small HTTP API
//!
//! EVENT LOOP:
//! TRANSPORT → DISPATCH → DIALOG → (RATES → CONVERT) → REPLY

pub mod api;
pub mod config;
pub mod conversion;
pub mod dialog;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod rates;
pub mod state;
pub mod telegram;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use dialog::DialogStateMachine;
pub use dispatch::DispatchHandle;
