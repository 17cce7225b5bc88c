//! Telegram integration module.
//!
//! Provides the chat platform abstraction the engines send through, the
//! Bot API client implementing it, and the inbound update loop.

mod client;
mod notifier;
mod platform;
mod updates;

#[cfg(test)]
pub(crate) mod mock;

pub use client::TelegramBot;
pub use notifier::Notifier;
pub use platform::{ChatPlatform, LinkButton, Notice, PlatformError, escape_html};
pub use updates::{BotApp, run_updates};
