//! Command handler implementation.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::types::{
    BotCommand, CommandResult, GrantArgs, IncomingMessage, ReplyTarget, Role, Sender, Setting,
};
use crate::access::{AccountTier, Authority, ChannelGate};
use crate::cooldown::{CooldownDecision, CooldownGate, format_wait};
use crate::dispatch::{ContentPayload, DispatchEngine, Framing, dedup_targets};
use crate::reward::{MIN_GROUP_MEMBERS, MIN_LADDER_GROUPS, extend_expiry};
use crate::scheduler::{AutoShareError, AutoShareRegistry};
use crate::state::{
    ChatId, CooldownKind, Snapshot, StateStore, UserId, insert_id, remove_id,
};
use crate::telegram::Notifier;

const SAVE_FAILED: &str = "⚠️ Failed to save data. Please try again later.";
const DENIED_OWNER: &str = "❌ Access denied:\nOnly owners can use this command!";
const DENIED_DEVELOPER: &str = "❌ Access denied:\nOnly the developer can use this command!";
const DENIED_CEO: &str = "❌ Access denied:\nOnly a CEO or the developer can use this command!";
const DENIED_PREMIUM: &str = "❌ Access denied:\nOnly premium users can use this command!";

/// Handles bot commands against the shared state.
pub struct CommandHandler {
    store: Arc<StateStore>,
    authority: Arc<Authority>,
    dispatch: Arc<DispatchEngine>,
    notifier: Notifier,
    autoshare: Arc<AutoShareRegistry>,
    backup_dir: PathBuf,
    bot_username: String,
    channel_gate: Option<ChannelGate>,
    started_at: DateTime<Utc>,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(
        store: Arc<StateStore>,
        authority: Arc<Authority>,
        dispatch: Arc<DispatchEngine>,
        notifier: Notifier,
        autoshare: Arc<AutoShareRegistry>,
        backup_dir: impl Into<PathBuf>,
        bot_username: impl Into<String>,
    ) -> Self {
        Self {
            store,
            authority,
            dispatch,
            notifier,
            autoshare,
            backup_dir: backup_dir.into(),
            bot_username: bot_username.into(),
            channel_gate: None,
            started_at: Utc::now(),
        }
    }

    /// Requires channel membership before `/start` registers a user.
    #[must_use]
    pub fn with_channel_gate(mut self, gate: ChannelGate) -> Self {
        self.channel_gate = Some(gate);
        self
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle(&self, message: &IncomingMessage) -> Option<CommandResult> {
        self.handle_at(message, Utc::now()).await
    }

    /// Same as [`Self::try_handle`] with an explicit clock.
    pub async fn handle_at(
        &self,
        message: &IncomingMessage,
        now: DateTime<Utc>,
    ) -> Option<CommandResult> {
        let command = BotCommand::parse(&message.text, &self.bot_username)?;

        debug!("Handling command {} from {}", command, message.sender.id);
        let result = self.execute(command, message, now).await;
        info!(
            "Command from {} handled: success={}",
            message.sender.id, result.success
        );

        Some(result)
    }

    /// Executes a parsed command.
    async fn execute(
        &self,
        command: BotCommand,
        message: &IncomingMessage,
        now: DateTime<Utc>,
    ) -> CommandResult {
        let user = message.sender.id;
        match command {
            BotCommand::Start => self.handle_start(&message.sender, now).await,
            BotCommand::Status => self.handle_status(user, now).await,
            BotCommand::Help => Self::handle_help(),
            BotCommand::Ping => self.handle_ping(user, now).await,
            BotCommand::CheckId => Self::handle_check_id(message),
            BotCommand::ShareMsg => self.handle_share(message, CooldownKind::Share, now).await,
            BotCommand::Broadcast => {
                self.handle_share(message, CooldownKind::Broadcast, now)
                    .await
            }
            BotCommand::SetAutoContent => self.handle_set_auto_content(message, now).await,
            BotCommand::Auto(setting) => self.handle_auto(user, setting, now).await,
            BotCommand::SetCooldown(setting) => self.handle_set_cooldown(user, setting, now).await,
            BotCommand::AddRole(role, target) => self.handle_add_role(user, role, target, now).await,
            BotCommand::RemoveRole(role, target) => {
                self.handle_remove_role(user, role, target, now).await
            }
            BotCommand::ListRole(role) => self.handle_list_role(user, role, now).await,
            BotCommand::GrantPremium(args) => self.handle_grant(user, args, now).await,
            BotCommand::RevokePremium(target) => self.handle_revoke(user, target, now).await,
            BotCommand::ListPremium => self.handle_list_premium(user, now).await,
            BotCommand::Maintenance(setting) => self.handle_maintenance(user, setting, now).await,
            BotCommand::Backup => self.handle_backup(message, now).await,
        }
    }

    async fn tier(&self, user: UserId, now: DateTime<Utc>) -> AccountTier {
        self.store
            .view(|s| self.authority.tier_of(user, s, now.timestamp()))
            .await
    }

    /// Blacklist and maintenance gate for user-facing actions.
    fn gate(tier: AccountTier, snapshot: &Snapshot) -> Result<(), String> {
        if tier.is_blacklisted() {
            return Err("⛔ You are blacklisted and cannot use this bot.".to_owned());
        }
        if snapshot.settings.maintenance && !tier.bypasses_gates() {
            return Err("🛠 The bot is under maintenance. Please try again later.".to_owned());
        }
        Ok(())
    }

    async fn handle_start(&self, sender: &Sender, now: DateTime<Utc>) -> CommandResult {
        let user = sender.id;
        if let Some(gate) = &self.channel_gate {
            let tier = self.tier(user, now).await;
            if !tier.bypasses_gates() && !tier.is_blacklisted() && !gate.admits(user).await {
                info!("User {} has not joined the required channel", user);
                return CommandResult::notice(gate.join_notice(&sender.first_name, &self.bot_username));
            }
        }

        let registered = self
            .store
            .try_update(|s| {
                let tier = self.authority.tier_of(user, s, now.timestamp());
                Self::gate(tier, s)?;
                s.register_user(user);
                Ok::<_, String>((tier, s.groups.len(), s.users.len()))
            })
            .await;

        let (tier, groups, users) = match registered {
            Ok(Ok(stats)) => stats,
            Ok(Err(rejection)) => return CommandResult::error(rejection),
            Err(_) => return CommandResult::error(SAVE_FAILED),
        };

        let message = format!(
            "👋 Hi {}!\n\n\
             ▢ Tier: {tier}\n\
             ▢ Groups: {groups}\n\
             ▢ Users: {users}\n\
             ▢ Uptime: {}\n\n\
             Add @{} to groups with at least {MIN_GROUP_MEMBERS} members to earn premium:\n\
             2 groups = 1 day, 4 = 3 days, 6 = 5 days, 8 = 7 days, 10 = permanent.",
            sender.display_name(),
            self.uptime(now),
            self.bot_username,
        );
        CommandResult::success(message)
    }

    async fn handle_status(&self, user: UserId, now: DateTime<Utc>) -> CommandResult {
        let now_secs = now.timestamp();
        let (tier, expiry, groups, minutes) = self
            .store
            .view(|s| {
                (
                    self.authority.tier_of(user, s, now_secs),
                    s.premium_expiry(user).filter(|&e| e > now_secs),
                    s.group_count(user),
                    s.settings.cooldown_minutes(),
                )
            })
            .await;

        let premium = expiry.map_or_else(
            || "none".to_owned(),
            |e| format!("until {} ({} left)", format_date(e), format_duration(e - now_secs)),
        );

        CommandResult::success(format!(
            "📊 Your status\n\
             ▢ ID: {user}\n\
             ▢ Tier: {tier}\n\
             ▢ Premium: {premium}\n\
             ▢ Groups added: {groups}\n\
             ▢ Cooldown: {minutes} minutes"
        ))
    }

    fn handle_help() -> CommandResult {
        let mut lines = vec!["Membership Bot Commands".to_owned(), String::new()];

        for (cmd, tier, desc) in BotCommand::all_commands() {
            let tier_str = if tier.is_empty() {
                String::new()
            } else {
                format!(" [{tier}]")
            };
            lines.push(format!("  {cmd}{tier_str} - {desc}"));
        }

        CommandResult::success(lines.join("\n"))
    }

    async fn handle_ping(&self, user: UserId, now: DateTime<Utc>) -> CommandResult {
        if !self.tier(user, now).await.is_owner_level() {
            return CommandResult::error(DENIED_OWNER);
        }
        CommandResult::success(format!(
            "🏓 Pong!\nUptime: {}\nVersion: {}",
            self.uptime(now),
            env!("CARGO_PKG_VERSION")
        ))
    }

    fn handle_check_id(message: &IncomingMessage) -> CommandResult {
        let sender = &message.sender;
        CommandResult::success(format!(
            "🪪 Telegram ID card\n\n\
             👤 Name: {}\n\
             🆔 User ID: {}\n\
             🌐 Username: {}\n\
             💬 Chat ID: {}",
            sender.first_name,
            sender.id,
            sender
                .username
                .as_deref()
                .map_or_else(|| "none".to_owned(), |u| format!("@{u}")),
            message.chat
        ))
    }

    /// Checks access, cooldown and targets of a share or broadcast.
    fn authorize_dispatch(
        &self,
        snapshot: &Snapshot,
        user: UserId,
        kind: CooldownKind,
        now: i64,
    ) -> Result<(AccountTier, Vec<ChatId>), String> {
        let tier = self.authority.tier_of(user, snapshot, now);
        Self::gate(tier, snapshot)?;

        match kind {
            CooldownKind::Share => {
                let allowed = tier.is_owner_level()
                    || tier == AccountTier::Premium
                    || snapshot.group_count(user) >= MIN_LADDER_GROUPS;
                if !allowed {
                    return Err(DENIED_PREMIUM.to_owned());
                }
            }
            CooldownKind::Broadcast => {
                if !tier.is_owner_level() {
                    return Err(DENIED_OWNER.to_owned());
                }
            }
        }

        let gate = CooldownGate::from_settings(&snapshot.settings);
        if let CooldownDecision::Wait { remaining_secs } =
            gate.check(kind, user, tier, now, &snapshot.cooldowns)
        {
            return Err(format!(
                "🕒 Wait {} before using {} again.",
                format_wait(remaining_secs),
                kind.command()
            ));
        }

        let targets = match kind {
            CooldownKind::Share => snapshot.groups.clone(),
            CooldownKind::Broadcast => dedup_targets(&snapshot.users),
        };
        if targets.is_empty() {
            return Err(match kind {
                CooldownKind::Share => "⚠️ No registered groups to share to.".to_owned(),
                CooldownKind::Broadcast => "⚠️ No registered users to broadcast to.".to_owned(),
            });
        }

        Ok((tier, targets))
    }

    async fn handle_share(
        &self,
        message: &IncomingMessage,
        kind: CooldownKind,
        now: DateTime<Utc>,
    ) -> CommandResult {
        let user = message.sender.id;
        let now_secs = now.timestamp();

        // Access and cooldown come before the reply check; rechecked on commit.
        let precheck = self
            .store
            .view(|s| self.authorize_dispatch(s, user, kind, now_secs).map(|_| ()))
            .await;
        if let Err(rejection) = precheck {
            return CommandResult::error(rejection);
        }

        let content = match reply_content(&message.reply) {
            Ok(content) => content,
            Err(reply) => return CommandResult::error(reply),
        };

        let claimed = self
            .store
            .try_update(|s| {
                let (tier, targets) = self.authorize_dispatch(s, user, kind, now_secs)?;
                CooldownGate::from_settings(&s.settings).record(
                    kind,
                    user,
                    tier,
                    now_secs,
                    &mut s.cooldowns,
                );
                Ok::<_, String>(targets)
            })
            .await;

        let targets = match claimed {
            Ok(Ok(targets)) => targets,
            Ok(Err(rejection)) => return CommandResult::error(rejection),
            Err(_) => return CommandResult::error(SAVE_FAILED),
        };

        let (title, label) = match kind {
            CooldownKind::Share => ("Share", "groups"),
            CooldownKind::Broadcast => ("Broadcast", "users"),
        };
        self.notifier
            .text(
                message.chat,
                &format!("📡 Processing {} to {} {label}...", title.to_lowercase(), targets.len()),
            )
            .await;

        let framing = Framing::header(format!(
            "👤 SHARE BY: {}\n\n",
            message.sender.display_name()
        ));
        let report = self.dispatch.dispatch(&targets, &content, &framing).await;

        CommandResult::success(report.summary(title, label))
    }

    async fn handle_set_auto_content(
        &self,
        message: &IncomingMessage,
        now: DateTime<Utc>,
    ) -> CommandResult {
        let user = message.sender.id;
        if !self.tier(user, now).await.is_owner_level() {
            return CommandResult::error(DENIED_OWNER);
        }

        match reply_content(&message.reply) {
            Ok(content) => {
                self.autoshare.set_content(user, content).await;
                CommandResult::success(
                    "✅ Message saved for auto-share. Use /auto on to start sending it.",
                )
            }
            Err(reply) => CommandResult::error(reply),
        }
    }

    async fn handle_auto(
        &self,
        user: UserId,
        setting: Setting<bool>,
        now: DateTime<Utc>,
    ) -> CommandResult {
        if !self.tier(user, now).await.is_owner_level() {
            return CommandResult::error(DENIED_OWNER);
        }

        match setting {
            Setting::Show => {
                let config = self.autoshare.status(user).await;
                let minutes = self.store.view(|s| s.settings.cooldown_minutes()).await;
                CommandResult::success(format!(
                    "📊 Auto-share status: {}\n📝 Message: {}\n⏱️ Interval: {minutes} minutes",
                    if config.active { "ON ✅" } else { "OFF ❌" },
                    if config.content.is_some() { "set" } else { "not set" },
                ))
            }
            Setting::Set(true) => match self.autoshare.activate(user, now.timestamp_millis()).await {
                Ok(()) => CommandResult::success(
                    "🔄 Auto-share started.\nWaiting one interval before the first send...",
                ),
                Err(AutoShareError::NoContent) => CommandResult::error(
                    "⚠️ No message set yet. Reply to a message with /setpesan first.",
                ),
            },
            Setting::Set(false) => {
                self.autoshare.deactivate(user).await;
                CommandResult::success("❌ Auto-share turned off.")
            }
            Setting::Invalid => CommandResult::error("⚠️ Usage: /auto on | off | status"),
        }
    }

    async fn handle_set_cooldown(
        &self,
        user: UserId,
        setting: Setting<u64>,
        now: DateTime<Utc>,
    ) -> CommandResult {
        if !self.tier(user, now).await.is_owner_level() {
            return CommandResult::error(DENIED_OWNER);
        }

        match setting {
            Setting::Show => {
                let minutes = self.store.view(|s| s.settings.cooldown_minutes()).await;
                CommandResult::success(format!(
                    "⚙️ Current cooldown: {minutes} minutes. Example: /setjeda 15"
                ))
            }
            Setting::Set(minutes) => {
                match self
                    .store
                    .update(|s| s.settings.cooldown.default = minutes)
                    .await
                {
                    Ok(()) => {
                        CommandResult::success(format!("✅ Cooldown set to {minutes} minutes."))
                    }
                    Err(_) => CommandResult::error(SAVE_FAILED),
                }
            }
            Setting::Invalid => CommandResult::error(
                "⚠️ Value must be a number of minutes between 1 and 525600. Example: /setjeda 15",
            ),
        }
    }

    /// Checks that `tier` may manage `role`.
    fn can_manage(role: Role, tier: AccountTier) -> Result<(), &'static str> {
        match role {
            Role::Executive | Role::Blacklist if tier != AccountTier::MainOwner => {
                Err(DENIED_DEVELOPER)
            }
            Role::DelegatedOwner if !tier.can_manage_delegated_owners() => Err(DENIED_CEO),
            _ => Ok(()),
        }
    }

    async fn handle_add_role(
        &self,
        user: UserId,
        role: Role,
        target: Option<UserId>,
        now: DateTime<Utc>,
    ) -> CommandResult {
        if let Err(denied) = Self::can_manage(role, self.tier(user, now).await) {
            return CommandResult::error(denied);
        }
        let Some(target) = target else {
            return CommandResult::error(format!(
                "⚠️ Wrong format. Example: /{} 123",
                BotCommand::AddRole(role, None)
            ));
        };
        if role == Role::Blacklist && self.authority.is_main_owner(target) {
            return CommandResult::error(format!("❌ Main owner {target} cannot be blacklisted."));
        }

        let added = self
            .store
            .try_update(|s| {
                if insert_id(role_list_mut(s, role), target) {
                    Ok(())
                } else {
                    Err(())
                }
            })
            .await;

        match added {
            Ok(Ok(())) => {
                CommandResult::success(format!("✅ User {target} added to {}.", role.label()))
            }
            Ok(Err(())) => {
                CommandResult::error(format!("⚠️ User {target} is already in {}.", role.label()))
            }
            Err(_) => CommandResult::error(SAVE_FAILED),
        }
    }

    async fn handle_remove_role(
        &self,
        user: UserId,
        role: Role,
        target: Option<UserId>,
        now: DateTime<Utc>,
    ) -> CommandResult {
        if let Err(denied) = Self::can_manage(role, self.tier(user, now).await) {
            return CommandResult::error(denied);
        }
        let Some(target) = target else {
            return CommandResult::error(format!(
                "⚠️ Wrong format. Example: /{} 123",
                BotCommand::RemoveRole(role, None)
            ));
        };
        if role == Role::DelegatedOwner && self.authority.is_main_owner(target) {
            return CommandResult::error(format!("❌ Main owner {target} cannot be removed."));
        }

        let removed = self
            .store
            .try_update(|s| {
                if remove_id(role_list_mut(s, role), target) {
                    Ok(())
                } else {
                    Err(())
                }
            })
            .await;

        match removed {
            Ok(Ok(())) => {
                CommandResult::success(format!("✅ User {target} removed from {}.", role.label()))
            }
            Ok(Err(())) => {
                CommandResult::error(format!("⚠️ User {target} is not in {}.", role.label()))
            }
            Err(_) => CommandResult::error(SAVE_FAILED),
        }
    }

    async fn handle_list_role(&self, user: UserId, role: Role, now: DateTime<Utc>) -> CommandResult {
        if let Err(denied) = Self::can_manage(role, self.tier(user, now).await) {
            return CommandResult::error(denied);
        }

        let ids: Vec<UserId> = self
            .store
            .view(|s| match role {
                Role::Executive => s.ceo.clone(),
                Role::Blacklist => s.blacklist.clone(),
                Role::DelegatedOwner => s
                    .owner
                    .iter()
                    .copied()
                    .filter(|&id| !self.authority.is_main_owner(id))
                    .collect(),
            })
            .await;

        if ids.is_empty() {
            return CommandResult::success(format!("📋 The {} list is empty.", role.label()));
        }

        let mut lines = vec![format!("📋 {} list:", capitalize(role.label())), String::new()];
        lines.extend(ids.iter().enumerate().map(|(i, id)| format!("{}. {id}", i + 1)));
        CommandResult::success(lines.join("\n"))
    }

    async fn handle_grant(
        &self,
        user: UserId,
        args: Option<GrantArgs>,
        now: DateTime<Utc>,
    ) -> CommandResult {
        if !self.tier(user, now).await.is_owner_level() {
            return CommandResult::error(DENIED_OWNER);
        }
        let Some(args) = args else {
            return CommandResult::error("⚠️ Wrong format. Example: /addakses 123 1d (d = days, h = hours)");
        };

        let now_secs = now.timestamp();
        let granted = self
            .store
            .update(|s| {
                let expiry = extend_expiry(s.premium_expiry(args.user), now_secs, args.duration_secs());
                s.premium.insert(args.user, expiry);
                expiry
            })
            .await;

        match granted {
            Ok(expiry) => CommandResult::success(format!(
                "✅ User {} received premium for {} {} (until {}).",
                args.user,
                args.amount,
                args.unit.label(),
                format_date(expiry)
            )),
            Err(_) => CommandResult::error(SAVE_FAILED),
        }
    }

    async fn handle_revoke(
        &self,
        user: UserId,
        target: Option<UserId>,
        now: DateTime<Utc>,
    ) -> CommandResult {
        if !self.tier(user, now).await.is_owner_level() {
            return CommandResult::error(DENIED_OWNER);
        }
        let Some(target) = target else {
            return CommandResult::error("⚠️ Wrong format. Example: /delakses 123");
        };

        let removed = self
            .store
            .try_update(|s| s.premium.remove(&target).map(|_| ()).ok_or(()))
            .await;

        match removed {
            Ok(Ok(())) => CommandResult::success(format!("✅ Premium of user {target} removed.")),
            Ok(Err(())) => {
                CommandResult::error(format!("❌ User {target} not found or not premium."))
            }
            Err(_) => CommandResult::error(SAVE_FAILED),
        }
    }

    async fn handle_list_premium(&self, user: UserId, now: DateTime<Utc>) -> CommandResult {
        if !self.tier(user, now).await.is_owner_level() {
            return CommandResult::error(DENIED_OWNER);
        }

        let now_secs = now.timestamp();
        let entries: Vec<String> = self
            .store
            .view(|s| {
                s.premium
                    .iter()
                    .filter(|&(_, &expiry)| expiry > now_secs)
                    .map(|(id, &expiry)| {
                        format!("👤 {id} - {} left", format_duration(expiry - now_secs))
                    })
                    .collect()
            })
            .await;

        if entries.is_empty() {
            return CommandResult::success("📋 Premium list:\n\nNo active premium users.");
        }
        CommandResult::success(format!("📋 Active premium users:\n\n{}", entries.join("\n")))
    }

    async fn handle_maintenance(
        &self,
        user: UserId,
        setting: Setting<bool>,
        now: DateTime<Utc>,
    ) -> CommandResult {
        if self.tier(user, now).await != AccountTier::MainOwner {
            return CommandResult::error(DENIED_DEVELOPER);
        }

        match setting {
            Setting::Show => {
                let enabled = self.store.view(|s| s.settings.maintenance).await;
                CommandResult::success(format!(
                    "⚙️ Maintenance is currently {}. Use /setmaintenance on|off.",
                    if enabled { "🔴 ON" } else { "🟢 OFF" }
                ))
            }
            Setting::Set(enabled) => {
                match self.store.update(|s| s.settings.maintenance = enabled).await {
                    Ok(()) if enabled => CommandResult::success(
                        "🔴 Maintenance mode is ON.\nOnly the developer can use the bot.",
                    ),
                    Ok(()) => CommandResult::success(
                        "🟢 Maintenance mode is OFF.\nThe bot is back to normal.",
                    ),
                    Err(_) => CommandResult::error(SAVE_FAILED),
                }
            }
            Setting::Invalid => {
                CommandResult::error("⚠️ Wrong format. Use /setmaintenance on or /setmaintenance off.")
            }
        }
    }

    async fn handle_backup(&self, message: &IncomingMessage, now: DateTime<Utc>) -> CommandResult {
        if !self.tier(message.sender.id, now).await.is_owner_level() {
            return CommandResult::error(DENIED_OWNER);
        }

        match self.store.backup(&self.backup_dir, now).await {
            Ok(path) => {
                self.notifier.file(message.chat, &path, "Data backup").await;
                CommandResult::success(format!("✅ Backup written to {}", path.display()))
            }
            Err(e) => {
                warn!("Manual backup failed: {}", e);
                CommandResult::error("❌ Failed to create backup.")
            }
        }
    }

    fn uptime(&self, now: DateTime<Utc>) -> String {
        format_duration((now - self.started_at).num_seconds())
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("bot_username", &self.bot_username)
            .field("backup_dir", &self.backup_dir)
            .field("channel_gate", &self.channel_gate)
            .finish_non_exhaustive()
    }
}

fn role_list_mut(snapshot: &mut Snapshot, role: Role) -> &mut Vec<UserId> {
    match role {
        Role::Executive => &mut snapshot.ceo,
        Role::DelegatedOwner => &mut snapshot.owner,
        Role::Blacklist => &mut snapshot.blacklist,
    }
}

/// Extracts forwardable content from the replied message.
fn reply_content(reply: &ReplyTarget) -> Result<ContentPayload, &'static str> {
    match reply {
        ReplyTarget::Content(content) => Ok(content.clone()),
        ReplyTarget::None => Err("⚠️ Please reply to the message you want to send."),
        ReplyTarget::Unsupported => Err("⚠️ This message type is not supported."),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn format_date(epoch_secs: i64) -> String {
    DateTime::from_timestamp(epoch_secs, 0).map_or_else(
        || epoch_secs.to_string(),
        |d| d.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

/// Formats a duration in seconds to a human-readable string.
fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 {
            format!("{hours}h")
        } else {
            format!("{hours}h {mins}m")
        }
    } else {
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3600;
        let mins = (secs % 3600) / 60;
        format!("{days}d {hours}h {mins}m")
    }
}
