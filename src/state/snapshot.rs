//! The persisted bot snapshot and its default-merging loader.
//!
//! The on-disk layout uses the keys `premium`, `owner`, `groups`, `users`,
//! `blacklist`, `ceo`, `settings`, `user_group_count` and `cooldowns`.
//! Loading merges every key independently with its default, so a missing or
//! mistyped field never discards the rest of the file.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Telegram user id.
pub type UserId = i64;

/// Telegram chat id (groups are negative, private chats equal the user id).
pub type ChatId = i64;

/// Default global cooldown in minutes.
pub const DEFAULT_COOLDOWN_MINUTES: u64 = 15;

/// Largest accepted cooldown, one year in minutes.
pub const MAX_COOLDOWN_MINUTES: u64 = 525_600;

/// Actions gated by the per-user cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownKind {
    /// `/sharemsg` to all groups.
    Share,
    /// `/broadcast` to all registered users.
    Broadcast,
}

impl CooldownKind {
    /// Returns the command name used in user-facing messages.
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::Share => "/sharemsg",
            Self::Broadcast => "/broadcast",
        }
    }
}

/// Cooldown section of the global settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CooldownSetting {
    /// Cooldown window in minutes, shared by every gated action.
    pub default: u64,
}

impl Default for CooldownSetting {
    fn default() -> Self {
        Self {
            default: DEFAULT_COOLDOWN_MINUTES,
        }
    }
}

/// Singleton settings mutated only by administrative commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalSettings {
    pub cooldown: CooldownSetting,
    pub maintenance: bool,
}

impl GlobalSettings {
    /// Returns the configured cooldown in minutes.
    #[must_use]
    pub const fn cooldown_minutes(&self) -> u64 {
        self.cooldown.default
    }

    /// Returns the cooldown window in seconds.
    #[must_use]
    pub fn cooldown_window_secs(&self) -> i64 {
        i64::try_from(self.cooldown.default.saturating_mul(60)).unwrap_or(i64::MAX)
    }
}

/// Last-use timestamps per gated action, keyed by user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CooldownTable {
    pub share: BTreeMap<UserId, i64>,
    pub broadcast: BTreeMap<UserId, i64>,
}

impl CooldownTable {
    fn cell(&self, kind: CooldownKind) -> &BTreeMap<UserId, i64> {
        match kind {
            CooldownKind::Share => &self.share,
            CooldownKind::Broadcast => &self.broadcast,
        }
    }

    fn cell_mut(&mut self, kind: CooldownKind) -> &mut BTreeMap<UserId, i64> {
        match kind {
            CooldownKind::Share => &mut self.share,
            CooldownKind::Broadcast => &mut self.broadcast,
        }
    }

    /// Returns the last use of `kind` by `user`, in epoch seconds.
    #[must_use]
    pub fn last_use(&self, kind: CooldownKind, user: UserId) -> Option<i64> {
        self.cell(kind).get(&user).copied()
    }

    /// Records a use of `kind` by `user` at `now`.
    pub fn record(&mut self, kind: CooldownKind, user: UserId, now: i64) {
        self.cell_mut(kind).insert(user, now);
    }
}

/// Complete persisted state of the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Premium grants: user → absolute expiry in epoch seconds.
    pub premium: BTreeMap<UserId, i64>,
    /// Delegated owners, seeded with the static owner ids.
    pub owner: Vec<UserId>,
    /// Groups the bot currently considers itself a member of.
    pub groups: Vec<ChatId>,
    /// Users that have started the bot.
    pub users: Vec<UserId>,
    pub blacklist: Vec<UserId>,
    /// Executives.
    pub ceo: Vec<UserId>,
    pub settings: GlobalSettings,
    /// Number of groups each user has added the bot to.
    pub user_group_count: BTreeMap<UserId, u32>,
    pub cooldowns: CooldownTable,
}

impl Snapshot {
    /// Creates the default snapshot with the delegated owner list seeded.
    #[must_use]
    pub fn with_owners(static_owners: &[UserId]) -> Self {
        Self {
            owner: static_owners.to_vec(),
            ..Self::default()
        }
    }

    /// Builds a snapshot from a parsed JSON document, falling back to the
    /// default for every key that is absent or has the wrong shape.
    #[must_use]
    pub fn merge_value(value: &Value, static_owners: &[UserId]) -> Self {
        let defaults = Self::with_owners(static_owners);
        let field = |key: &str| value.get(key);

        Self {
            premium: parse_id_map(field("premium"), Value::as_i64),
            owner: parse_id_list(field("owner")).unwrap_or(defaults.owner),
            groups: parse_id_list(field("groups")).unwrap_or_default(),
            users: parse_id_list(field("users")).unwrap_or_default(),
            blacklist: parse_id_list(field("blacklist")).unwrap_or_default(),
            ceo: parse_id_list(field("ceo")).unwrap_or_default(),
            settings: parse_settings(field("settings")),
            user_group_count: parse_id_map(field("user_group_count"), |v| {
                v.as_u64().and_then(|n| u32::try_from(n).ok())
            }),
            cooldowns: CooldownTable {
                share: parse_id_map(field("cooldowns").and_then(|c| c.get("share")), Value::as_i64),
                broadcast: parse_id_map(
                    field("cooldowns").and_then(|c| c.get("broadcast")),
                    Value::as_i64,
                ),
            },
        }
    }

    /// Checks whether the bot tracks `group`.
    #[must_use]
    pub fn is_group_tracked(&self, group: ChatId) -> bool {
        self.groups.contains(&group)
    }

    /// Starts tracking `group`. Returns false if it was already tracked.
    pub fn track_group(&mut self, group: ChatId) -> bool {
        insert_id(&mut self.groups, group)
    }

    /// Stops tracking `group`. Returns false if it was not tracked.
    pub fn untrack_group(&mut self, group: ChatId) -> bool {
        remove_id(&mut self.groups, group)
    }

    /// Adds `user` to the registry. Returns false if already present.
    pub fn register_user(&mut self, user: UserId) -> bool {
        insert_id(&mut self.users, user)
    }

    /// Returns how many groups `user` has added the bot to.
    #[must_use]
    pub fn group_count(&self, user: UserId) -> u32 {
        self.user_group_count.get(&user).copied().unwrap_or(0)
    }

    /// Returns the stored premium expiry of `user`, expired or not.
    #[must_use]
    pub fn premium_expiry(&self, user: UserId) -> Option<i64> {
        self.premium.get(&user).copied()
    }
}

/// Appends `id` unless present. Returns whether it was inserted.
pub fn insert_id(list: &mut Vec<i64>, id: i64) -> bool {
    if list.contains(&id) {
        false
    } else {
        list.push(id);
        true
    }
}

/// Removes every occurrence of `id`. Returns whether anything was removed.
pub fn remove_id(list: &mut Vec<i64>, id: i64) -> bool {
    let before = list.len();
    list.retain(|&existing| existing != id);
    list.len() != before
}

/// Parses an id written either as a JSON number or a numeric string.
fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_id_list(value: Option<&Value>) -> Option<Vec<i64>> {
    let items = value?.as_array()?;
    let mut ids = Vec::with_capacity(items.len());
    for id in items.iter().filter_map(parse_id) {
        insert_id(&mut ids, id);
    }
    Some(ids)
}

fn parse_id_map<T>(value: Option<&Value>, parse: impl Fn(&Value) -> Option<T>) -> BTreeMap<i64, T> {
    value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(key, v)| Some((key.trim().parse().ok()?, parse(v)?)))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_settings(value: Option<&Value>) -> GlobalSettings {
    let Some(value) = value else {
        return GlobalSettings::default();
    };

    let minutes = value
        .get("cooldown")
        .and_then(|c| c.get("default"))
        .and_then(Value::as_u64)
        .filter(|&m| m > 0)
        .unwrap_or(DEFAULT_COOLDOWN_MINUTES);

    GlobalSettings {
        cooldown: CooldownSetting { default: minutes },
        maintenance: value.get("maintenance").and_then(Value::as_bool).unwrap_or(false),
    }
}
