//! Command handling module.
//!
//! Parses slash commands from private and group messages and runs them
//! against the shared state, enforcing the access tier of the sender.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{
    BotCommand, CommandResult, DurationUnit, GrantArgs, IncomingMessage, ReplyTarget, Role,
    Sender, Setting,
};
