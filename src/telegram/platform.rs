//! Chat platform abstraction used by the core engines.
//!
//! Every call is independently fallible. The engines never assume that one
//! failed send says anything about the next.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::{ChatId, UserId};

/// Errors returned by the chat platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid link for button '{label}': {url}")]
    InvalidLink { label: String, url: String },
}

/// URL button attached below a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

impl LinkButton {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// HTML-formatted notification with optional link buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub html: String,
    pub buttons: Vec<LinkButton>,
}

impl Notice {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            buttons: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_button(mut self, button: LinkButton) -> Self {
        self.buttons.push(button);
        self
    }
}

/// Outbound operations the bot needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Sends plain text.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), PlatformError>;

    /// Sends an HTML notice with its link buttons.
    async fn send_notice(&self, chat: ChatId, notice: &Notice) -> Result<(), PlatformError>;

    async fn send_photo(
        &self,
        chat: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError>;

    async fn send_video(
        &self,
        chat: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError>;

    async fn send_document(
        &self,
        chat: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError>;

    async fn send_sticker(&self, chat: ChatId, file_id: &str) -> Result<(), PlatformError>;

    /// Uploads a local file as a document.
    async fn send_file(&self, chat: ChatId, path: &Path, caption: &str) -> Result<(), PlatformError>;

    /// Returns the live member count of a group.
    async fn member_count(&self, chat: ChatId) -> Result<u32, PlatformError>;

    /// Whether `user` is the creator, an administrator or a member of `channel`.
    async fn is_channel_member(&self, channel: &str, user: UserId) -> Result<bool, PlatformError>;
}

/// Escapes user-supplied text for HTML notices.
#[must_use]
pub fn escape_html(text: &str) -> String {
    teloxide::utils::html::escape(text)
}
