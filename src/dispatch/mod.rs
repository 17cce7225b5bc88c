//! Content dispatch module.
//!
//! Defines the payloads the bot can forward and the engine that fans a
//! payload out to groups or users.

mod content;
mod engine;

pub use content::{ContentPayload, Framing};
pub use engine::{DEFAULT_PACING, DispatchEngine, DispatchReport, dedup_targets};
