//! Telegram adapter for the reelpost workflow.
//!
//! Receives updates by long polling with teloxide, turns each message into a
//! workflow input, and sends the machine's reactions back through the Bot
//! API.

pub mod bot;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod state;
pub mod workers;

pub use {
    bot::{connect, start_polling},
    error::{Error, Result},
    outbound::TelegramOutbound,
    state::BotState,
};
