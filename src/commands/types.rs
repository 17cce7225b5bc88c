//! Command types and definitions.

use std::fmt;

use crate::dispatch::ContentPayload;
use crate::state::{ChatId, MAX_COOLDOWN_MINUTES, UserId};
use crate::telegram::Notice;

/// Author of an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub first_name: String,
    pub username: Option<String>,
}

impl Sender {
    /// Name shown in share headers: `@username`, else first name and id.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => {
                let name = if self.first_name.trim().is_empty() {
                    "User"
                } else {
                    self.first_name.as_str()
                };
                format!("{name} (ID: {})", self.id)
            }
        }
    }
}

/// What the command message replies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyTarget {
    None,
    /// A reply to something that cannot be forwarded (poll, location...).
    Unsupported,
    Content(ContentPayload),
}

/// Platform-neutral view of an incoming text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat: ChatId,
    pub sender: Sender,
    pub text: String,
    pub reply: ReplyTarget,
}

/// Argument of a command that either shows or changes a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting<T> {
    Show,
    Set(T),
    Invalid,
}

/// Id lists managed through add/del/list commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Executive,
    DelegatedOwner,
    Blacklist,
}

impl Role {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Executive => "CEO",
            Self::DelegatedOwner => "additional owner",
            Self::Blacklist => "blacklist",
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Self::Executive => "ceo",
            Self::DelegatedOwner => "ownjs",
            Self::Blacklist => "bl",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Days,
    Hours,
}

impl DurationUnit {
    #[must_use]
    pub const fn secs(self) -> i64 {
        match self {
            Self::Days => 86_400,
            Self::Hours => 3_600,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Days => "day(s)",
            Self::Hours => "hour(s)",
        }
    }
}

/// Arguments of `/addakses <id> <n><d|h>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantArgs {
    pub user: UserId,
    pub amount: u32,
    pub unit: DurationUnit,
}

impl GrantArgs {
    #[must_use]
    pub fn duration_secs(&self) -> i64 {
        i64::from(self.amount) * self.unit.secs()
    }
}

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Register and show bot information.
    Start,

    /// Show the caller's tier and premium expiry.
    Status,

    /// Show help information.
    Help,

    /// Show uptime.
    Ping,

    /// Show the caller's ids.
    CheckId,

    /// Share the replied content to all groups.
    ShareMsg,

    /// Send the replied content to all registered users.
    Broadcast,

    /// Store the replied content for auto-share.
    SetAutoContent,

    /// Turn auto-share on or off, or show its status.
    Auto(Setting<bool>),

    /// Show or set the global cooldown in minutes.
    SetCooldown(Setting<u64>),

    AddRole(Role, Option<UserId>),
    RemoveRole(Role, Option<UserId>),
    ListRole(Role),

    /// Extend a user's premium. `None` when the arguments are malformed.
    GrantPremium(Option<GrantArgs>),
    RevokePremium(Option<UserId>),
    ListPremium,

    /// Show or toggle maintenance mode.
    Maintenance(Setting<bool>),

    /// Write a snapshot backup and send it.
    Backup,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts an optional `@bot_username` suffix on the command word.
    /// Returns `None` if the message is not a command for this bot.
    #[must_use]
    pub fn parse(text: &str, bot_username: &str) -> Option<Self> {
        let text = text.trim();
        let after_slash = text.strip_prefix('/')?;

        let (word, args) = match after_slash.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (after_slash, ""),
        };

        let cmd = match word.split_once('@') {
            Some((cmd, target)) if target.eq_ignore_ascii_case(bot_username) => cmd,
            Some(_) => return None,
            None => word,
        }
        .to_lowercase();

        let role_command = |prefix: &str| {
            [Role::Executive, Role::DelegatedOwner, Role::Blacklist]
                .into_iter()
                .find(|role| cmd.strip_prefix(prefix) == Some(role.suffix()))
        };

        if let Some(role) = role_command("add") {
            return Some(Self::AddRole(role, parse_user_id(args)));
        }
        if let Some(role) = role_command("del") {
            return Some(Self::RemoveRole(role, parse_user_id(args)));
        }
        if let Some(role) = role_command("list") {
            return Some(Self::ListRole(role));
        }

        match cmd.as_str() {
            "start" => Some(Self::Start),
            "status" | "me" => Some(Self::Status),
            "help" => Some(Self::Help),
            "ping" => Some(Self::Ping),
            "cekid" | "id" => Some(Self::CheckId),
            "sharemsg" | "share" => Some(Self::ShareMsg),
            "broadcast" | "bc" => Some(Self::Broadcast),
            "setpesan" => Some(Self::SetAutoContent),
            "auto" => Some(Self::Auto(match args.to_lowercase().as_str() {
                "" | "status" => Setting::Show,
                other => parse_switch(other),
            })),
            "setjeda" => Some(Self::SetCooldown(match args {
                "" => Setting::Show,
                value => value
                    .parse::<u64>()
                    .ok()
                    .filter(|minutes| (1..=MAX_COOLDOWN_MINUTES).contains(minutes))
                    .map_or(Setting::Invalid, Setting::Set),
            })),
            "addakses" => Some(Self::GrantPremium(parse_grant(args))),
            "delakses" => Some(Self::RevokePremium(parse_user_id(args))),
            "listakses" => Some(Self::ListPremium),
            "setmaintenance" => Some(Self::Maintenance(match args.to_lowercase().as_str() {
                "" => Setting::Show,
                other => parse_switch(other),
            })),
            "backup" => Some(Self::Backup),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Start => "start".to_owned(),
            Self::Status => "status".to_owned(),
            Self::Help => "help".to_owned(),
            Self::Ping => "ping".to_owned(),
            Self::CheckId => "cekid".to_owned(),
            Self::ShareMsg => "sharemsg".to_owned(),
            Self::Broadcast => "broadcast".to_owned(),
            Self::SetAutoContent => "setpesan".to_owned(),
            Self::Auto(_) => "auto".to_owned(),
            Self::SetCooldown(_) => "setjeda".to_owned(),
            Self::AddRole(role, _) => format!("add{}", role.suffix()),
            Self::RemoveRole(role, _) => format!("del{}", role.suffix()),
            Self::ListRole(role) => format!("list{}", role.suffix()),
            Self::GrantPremium(_) => "addakses".to_owned(),
            Self::RevokePremium(_) => "delakses".to_owned(),
            Self::ListPremium => "listakses".to_owned(),
            Self::Maintenance(_) => "setmaintenance".to_owned(),
            Self::Backup => "backup".to_owned(),
        }
    }

    /// Returns all available commands with the tier required and a description.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("/start", "", "Register and show bot info"),
            ("/status", "", "Show your tier and premium expiry"),
            ("/cekid", "", "Show your Telegram ids"),
            ("/sharemsg (reply)", "premium", "Share a message to all groups"),
            ("/broadcast (reply)", "owner", "Send a message to all users"),
            ("/setpesan (reply)", "owner", "Set the auto-share message"),
            ("/auto on|off|status", "owner", "Control auto-share"),
            ("/setjeda [minutes]", "owner", "Show or set the cooldown"),
            ("/addakses <id> <n>d|h", "owner", "Grant premium"),
            ("/delakses <id>", "owner", "Revoke premium"),
            ("/listakses", "owner", "List active premium users"),
            ("/backup", "owner", "Back up the data file"),
            ("/ping", "owner", "Show uptime"),
            ("/addownjs|delownjs <id>", "ceo", "Manage additional owners"),
            ("/listownjs", "ceo", "List additional owners"),
            ("/addceo|delceo <id>", "developer", "Manage CEOs"),
            ("/listceo", "developer", "List CEOs"),
            ("/addbl|delbl <id>", "developer", "Manage the blacklist"),
            ("/listbl", "developer", "Show the blacklist"),
            ("/setmaintenance on|off", "developer", "Toggle maintenance"),
            ("/help", "", "Show this help message"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddRole(_, Some(id)) | Self::RemoveRole(_, Some(id)) | Self::RevokePremium(Some(id)) => {
                write!(f, "{} {id}", self.name())
            }
            Self::GrantPremium(Some(args)) => {
                write!(f, "{} {} {}", self.name(), args.user, args.duration_secs())
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

fn parse_user_id(args: &str) -> Option<UserId> {
    let mut parts = args.split_whitespace();
    let id = parts.next()?;
    if parts.next().is_some() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

fn parse_switch(arg: &str) -> Setting<bool> {
    match arg {
        "on" => Setting::Set(true),
        "off" => Setting::Set(false),
        _ => Setting::Invalid,
    }
}

/// Parses `<id> <n><d|h>`.
fn parse_grant(args: &str) -> Option<GrantArgs> {
    let mut parts = args.split_whitespace();
    let user = parse_user_id(parts.next()?)?;
    let duration = parts.next()?.to_lowercase();
    if parts.next().is_some() {
        return None;
    }

    let (amount, unit) = if let Some(days) = duration.strip_suffix('d') {
        (days, DurationUnit::Days)
    } else if let Some(hours) = duration.strip_suffix('h') {
        (hours, DurationUnit::Hours)
    } else {
        return None;
    };

    let amount: u32 = amount.parse().ok().filter(|&n| n > 0)?;
    Some(GrantArgs { user, amount, unit })
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,

    /// Formatted reply with link buttons, sent instead of `message`.
    pub notice: Option<Notice>,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            notice: None,
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            notice: None,
        }
    }

    /// Creates a refusal carrying a formatted notice.
    #[must_use]
    pub fn notice(notice: Notice) -> Self {
        Self {
            success: false,
            message: notice.html.clone(),
            notice: Some(notice),
        }
    }
}
