//! Update stream wiring.
//!
//! Converts incoming Bot API updates into [`IncomingMessage`] and
//! [`MembershipEvent`] values and routes them to the command handler and
//! the reward engine.

use std::sync::Arc;

use chrono::Utc;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::types::{ChatMemberKind, ChatMemberUpdated, Message, Update, User};
use teloxide::Bot;
use tracing::{debug, info, warn};

use super::platform::ChatPlatform;
use crate::commands::{CommandHandler, IncomingMessage, ReplyTarget, Sender};
use crate::dispatch::ContentPayload;
use crate::reward::{Actor, GroupRef, MembershipEvent, RewardEngine, Transition};

/// Everything the update handlers need.
pub struct BotApp {
    pub commands: Arc<CommandHandler>,
    pub rewards: Arc<RewardEngine>,
    pub platform: Arc<dyn ChatPlatform>,
}

impl std::fmt::Debug for BotApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotApp")
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

/// Runs long polling until Ctrl+C.
pub async fn run_updates(bot: Bot, app: Arc<BotApp>) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_my_chat_member().endpoint(on_membership));

    info!("Listening for updates...");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_message(msg: Message, app: Arc<BotApp>) -> anyhow::Result<()> {
    let Some(incoming) = incoming_message(&msg) else {
        return Ok(());
    };

    let Some(result) = app.commands.try_handle(&incoming).await else {
        return Ok(());
    };

    let sent = match &result.notice {
        Some(notice) => app.platform.send_notice(incoming.chat, notice).await,
        None => app.platform.send_text(incoming.chat, &result.message).await,
    };
    if let Err(e) = sent {
        warn!("Failed to reply in chat {}: {}", incoming.chat, e);
    }
    Ok(())
}

async fn on_membership(update: ChatMemberUpdated, app: Arc<BotApp>) -> anyhow::Result<()> {
    let Some(event) = membership_event(&update) else {
        return Ok(());
    };

    match app.rewards.handle(&event, Utc::now()).await {
        Ok(outcome) => debug!("Membership change in {} handled: {:?}", event.group.id, outcome),
        Err(e) => warn!("Membership change in {} not persisted: {}", event.group.id, e),
    }
    Ok(())
}

/// Builds an [`IncomingMessage`] from a text message with a known sender.
fn incoming_message(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    let sender = sender_of(msg.from()?);

    let reply = msg
        .reply_to_message()
        .map_or(ReplyTarget::None, |replied| {
            content_of(replied).map_or(ReplyTarget::Unsupported, ReplyTarget::Content)
        });

    Some(IncomingMessage {
        chat: msg.chat.id.0,
        sender,
        text: text.to_owned(),
        reply,
    })
}

fn sender_of(user: &User) -> Sender {
    Sender {
        id: teloxide::types::ChatId::from(user.id).0,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    }
}

/// Extracts forwardable content. Photos use the largest size.
fn content_of(msg: &Message) -> Option<ContentPayload> {
    let caption = msg.caption().map(str::to_owned);

    if let Some(text) = msg.text() {
        Some(ContentPayload::text(text))
    } else if let Some(photo) = msg.photo().and_then(<[_]>::last) {
        Some(ContentPayload::Photo {
            file_id: photo.file.id.clone(),
            caption,
        })
    } else if let Some(video) = msg.video() {
        Some(ContentPayload::Video {
            file_id: video.file.id.clone(),
            caption,
        })
    } else if let Some(document) = msg.document() {
        Some(ContentPayload::Document {
            file_id: document.file.id.clone(),
            caption,
        })
    } else {
        msg.sticker().map(|sticker| ContentPayload::Sticker {
            file_id: sticker.file.id.clone(),
        })
    }
}

/// Maps the bot's new status to a transition. Other statuses are ignored.
fn transition_of(kind: &ChatMemberKind) -> Option<Transition> {
    if kind.is_member() || kind.is_administrator() {
        Some(Transition::Joined)
    } else if kind.is_left() || kind.is_banned() || kind.is_restricted() {
        Some(Transition::Left)
    } else {
        None
    }
}

/// Builds a [`MembershipEvent`] for groups and supergroups only.
fn membership_event(update: &ChatMemberUpdated) -> Option<MembershipEvent> {
    let chat = &update.chat;
    if !(chat.is_group() || chat.is_supergroup()) {
        return None;
    }

    let transition = transition_of(&update.new_chat_member.kind)?;
    let actor = sender_of(&update.from);

    Some(MembershipEvent {
        actor: Actor {
            id: actor.id,
            first_name: actor.first_name,
            username: actor.username,
        },
        group: GroupRef {
            id: chat.id.0,
            title: chat.title().unwrap_or("Unknown group").to_owned(),
        },
        transition,
    })
}
