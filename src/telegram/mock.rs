//! Recording chat platform for tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use super::{ChatPlatform, Notice, PlatformError};
use crate::state::{ChatId, UserId};

/// Kind of a recorded outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentKind {
    Text,
    Notice,
    Photo,
    Video,
    Document,
    Sticker,
    File,
}

/// A delivered outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat: ChatId,
    pub kind: SentKind,
    /// Text, caption or notice body; file id for stickers, path for files.
    pub body: String,
}

/// Platform that records deliveries and fails for configured chats.
#[derive(Debug, Default)]
pub struct MockPlatform {
    sent: Mutex<Vec<Sent>>,
    attempts: Mutex<Vec<ChatId>>,
    failing: HashSet<ChatId>,
    member_counts: HashMap<ChatId, u32>,
    channel_members: HashSet<UserId>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call targeting `chat` fails.
    #[must_use]
    pub fn fail_for(mut self, chat: ChatId) -> Self {
        self.failing.insert(chat);
        self
    }

    #[must_use]
    pub fn with_member_count(mut self, chat: ChatId, count: u32) -> Self {
        self.member_counts.insert(chat, count);
        self
    }

    /// `user` counts as a member of every channel.
    #[must_use]
    pub fn with_channel_member(mut self, user: UserId) -> Self {
        self.channel_members.insert(user);
        self
    }

    /// Successful deliveries in order.
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn sent_to(&self, chat: ChatId) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| s.chat == chat).collect()
    }

    /// Targets of every send attempt, failed ones included.
    pub fn attempts(&self) -> Vec<ChatId> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, chat: ChatId, kind: SentKind, body: &str) -> Result<(), PlatformError> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(chat);

        if self.failing.contains(&chat) {
            return Err(PlatformError::Request(format!("chat {chat} unreachable")));
        }

        self.sent.lock().unwrap_or_else(PoisonError::into_inner).push(Sent {
            chat,
            kind,
            body: body.to_owned(),
        });
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), PlatformError> {
        self.record(chat, SentKind::Text, text)
    }

    async fn send_notice(&self, chat: ChatId, notice: &Notice) -> Result<(), PlatformError> {
        self.record(chat, SentKind::Notice, &notice.html)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        _file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError> {
        self.record(chat, SentKind::Photo, caption.unwrap_or_default())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        _file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError> {
        self.record(chat, SentKind::Video, caption.unwrap_or_default())
    }

    async fn send_document(
        &self,
        chat: ChatId,
        _file_id: &str,
        caption: Option<&str>,
    ) -> Result<(), PlatformError> {
        self.record(chat, SentKind::Document, caption.unwrap_or_default())
    }

    async fn send_sticker(&self, chat: ChatId, file_id: &str) -> Result<(), PlatformError> {
        self.record(chat, SentKind::Sticker, file_id)
    }

    async fn send_file(&self, chat: ChatId, path: &Path, _caption: &str) -> Result<(), PlatformError> {
        self.record(chat, SentKind::File, &path.display().to_string())
    }

    async fn member_count(&self, chat: ChatId) -> Result<u32, PlatformError> {
        self.member_counts
            .get(&chat)
            .copied()
            .ok_or_else(|| PlatformError::Request(format!("no member count for {chat}")))
    }

    async fn is_channel_member(&self, channel: &str, user: UserId) -> Result<bool, PlatformError> {
        if self.failing.contains(&user) {
            return Err(PlatformError::Request(format!("{channel} lookup failed")));
        }
        Ok(self.channel_members.contains(&user))
    }
}
