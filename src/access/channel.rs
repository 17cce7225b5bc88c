//! Channel-membership requirement for user-facing commands.

use std::sync::Arc;

use tracing::warn;

use crate::config::telegram_link;
use crate::state::UserId;
use crate::telegram::{ChatPlatform, LinkButton, Notice, escape_html};

/// Admits only users present in a required channel.
pub struct ChannelGate {
    platform: Arc<dyn ChatPlatform>,
    channel: String,
}

impl ChannelGate {
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>, channel: impl Into<String>) -> Self {
        Self {
            platform,
            channel: channel.into(),
        }
    }

    /// Whether `user` has joined the channel. A failed lookup counts as not joined.
    pub async fn admits(&self, user: UserId) -> bool {
        match self.platform.is_channel_member(&self.channel, user).await {
            Ok(present) => present,
            Err(e) => {
                warn!("Membership lookup of {} in {} failed: {}", user, self.channel, e);
                false
            }
        }
    }

    /// Notice asking `first_name` to join, with a join link and a deep link
    /// that re-runs `/start` through `bot_username`.
    #[must_use]
    pub fn join_notice(&self, first_name: &str, bot_username: &str) -> Notice {
        let html = format!(
            "<b>🚫 Access denied</b>\n\
             Hi <b>{}</b>, you have not joined our official channel yet!\n\n\
             Join through the button below to use every feature of the bot.",
            escape_html(first_name)
        );
        Notice::new(html)
            .with_button(LinkButton::new("📢 Join the channel", telegram_link(&self.channel)))
            .with_button(LinkButton::new(
                "🔁 I joined, check again",
                format!("https://t.me/{bot_username}?start=joined"),
            ))
    }
}

impl std::fmt::Debug for ChannelGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelGate")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
