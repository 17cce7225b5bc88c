//! Bot API client backing the chat platform.

use std::path::Path;

use async_trait::async_trait;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, Recipient,
    UserId as TelegramUserId,
};
use tracing::{debug, info};
use url::Url;

use super::{ChatPlatform, LinkButton, Notice, PlatformError};
use crate::state::{ChatId as RawChatId, UserId as RawUserId};

impl From<teloxide::RequestError> for PlatformError {
    fn from(err: teloxide::RequestError) -> Self {
        Self::Request(err.to_string())
    }
}

/// High-level wrapper around the Bot API client.
#[derive(Clone)]
pub struct TelegramBot {
    bot: Bot,
}

impl TelegramBot {
    /// Wraps an already constructed client.
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying client, used by the update dispatcher.
    #[must_use]
    pub fn inner(&self) -> Bot {
        self.bot.clone()
    }

    /// Resolves the bot's own username.
    ///
    /// # Errors
    ///
    /// Returns an error if the `getMe` call fails.
    pub async fn username(&self) -> Result<String, PlatformError> {
        let me = self.bot.get_me().await?;
        let username = me.username().to_owned();
        info!("Authorized as @{}", username);
        Ok(username)
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot").finish_non_exhaustive()
    }
}

fn keyboard(buttons: &[LinkButton]) -> Result<InlineKeyboardMarkup, PlatformError> {
    let rows = buttons
        .iter()
        .map(|button| {
            let url = Url::parse(&button.url).map_err(|_| PlatformError::InvalidLink {
                label: button.label.clone(),
                url: button.url.clone(),
            })?;
            Ok(vec![InlineKeyboardButton::url(button.label.clone(), url)])
        })
        .collect::<Result<Vec<_>, PlatformError>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

const fn chat_id(chat: RawChatId) -> ChatId {
    ChatId(chat)
}

#[async_trait]
impl ChatPlatform for TelegramBot {
    async fn send_text(&self, chat: RawChatId, text: &str) -> Result<(), PlatformError> {
        self.bot.send_message(chat_id(chat), text).await?;
        Ok(())
    }

    async fn send_notice(&self, chat: RawChatId, notice: &Notice) -> Result<(), PlatformError> {
        let request = self
            .bot
            .send_message(chat_id(chat), notice.html.clone())
            .parse_mode(ParseMode::Html);

        if notice.buttons.is_empty() {
            request.await?;
        } else {
            request.reply_markup(keyboard(&notice.buttons)?).await?;
        }
        Ok(())
    }

    async fn send_photo(
        &self,
        chat: RawChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError> {
        let request = self
            .bot
            .send_photo(chat_id(chat), InputFile::file_id(file_id));
        match caption {
            Some(caption) => request.caption(caption).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn send_video(
        &self,
        chat: RawChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError> {
        let request = self
            .bot
            .send_video(chat_id(chat), InputFile::file_id(file_id));
        match caption {
            Some(caption) => request.caption(caption).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn send_document(
        &self,
        chat: RawChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError> {
        let request = self
            .bot
            .send_document(chat_id(chat), InputFile::file_id(file_id));
        match caption {
            Some(caption) => request.caption(caption).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn send_sticker(&self, chat: RawChatId, file_id: &str) -> Result<(), PlatformError> {
        self.bot
            .send_sticker(chat_id(chat), InputFile::file_id(file_id))
            .await?;
        Ok(())
    }

    async fn send_file(
        &self,
        chat: RawChatId,
        path: &Path,
        caption: &str,
    ) -> Result<(), PlatformError> {
        debug!("Uploading {} to {}", path.display(), chat);
        self.bot
            .send_document(chat_id(chat), InputFile::file(path.to_path_buf()))
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn member_count(&self, chat: RawChatId) -> Result<u32, PlatformError> {
        Ok(self.bot.get_chat_member_count(chat_id(chat)).await?)
    }

    async fn is_channel_member(
        &self,
        channel: &str,
        user: RawUserId,
    ) -> Result<bool, PlatformError> {
        let Ok(user) = u64::try_from(user) else {
            return Ok(false);
        };

        let member = self
            .bot
            .get_chat_member(
                Recipient::ChannelUsername(channel.to_owned()),
                TelegramUserId(user),
            )
            .await?;
        let kind = &member.kind;
        Ok(kind.is_owner() || kind.is_administrator() || kind.is_member())
    }
}
