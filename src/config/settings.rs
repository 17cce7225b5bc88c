//! Bot credentials, owner configuration and tuning settings.

use std::time::Duration;

use crate::state::UserId;

/// Static bot configuration.
#[derive(Clone)]
pub struct BotConfig {
    /// Bot API token from @BotFather.
    pub token: String,

    /// Main owners. The first one receives audit messages and backups.
    pub owner_ids: Vec<UserId>,

    /// Developer handle shown in footers and renew links (e.g. `@dev`).
    pub developer: String,

    /// Channel handle used for the "channel info" link and the join check.
    pub channel_username: String,

    /// Whether `/start` requires membership in `channel_username`.
    pub require_channel_join: bool,
}

impl BotConfig {
    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` and `OWNER_IDS` to be set; `DEVELOPER` and
    /// `CHANNEL_USERNAME` are optional. The join check is on whenever
    /// `CHANNEL_USERNAME` is set, unless `REQUIRE_CHANNEL_JOIN` says otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let owners = lookup("OWNER_IDS").ok_or(ConfigError::MissingEnvVar("OWNER_IDS"))?;
        let owner_ids = parse_owner_ids(&owners)?;

        let channel = lookup("CHANNEL_USERNAME").filter(|c| !c.trim().is_empty());
        let require_channel_join = lookup("REQUIRE_CHANNEL_JOIN")
            .and_then(|v| parse_flag(&v))
            .unwrap_or(channel.is_some());

        Ok(Self {
            token: token.trim().to_owned(),
            owner_ids,
            developer: lookup("DEVELOPER").unwrap_or_else(|| "@developer".to_owned()),
            channel_username: channel.unwrap_or_else(|| "@channel".to_owned()),
            require_channel_join,
        })
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("owner_ids", &self.owner_ids)
            .field("developer", &self.developer)
            .field("channel_username", &self.channel_username)
            .field("require_channel_join", &self.require_channel_join)
            .finish()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses a comma separated owner list, keeping order and dropping duplicates.
fn parse_owner_ids(raw: &str) -> Result<Vec<UserId>, ConfigError> {
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: UserId = part
            .parse()
            .map_err(|_| ConfigError::InvalidOwnerId(part.to_owned()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err(ConfigError::NoOwners);
    }
    Ok(ids)
}

/// Runtime tuning knobs.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Pause between two sends of a dispatch, in milliseconds.
    pub dispatch_pacing_ms: u64,

    /// Period of the premium expiry sweep in seconds.
    pub expiry_sweep_secs: u64,

    /// Period of the auto-share check in seconds.
    pub autoshare_tick_secs: u64,
}

const fn default_dispatch_pacing_ms() -> u64 {
    300
}

const fn default_expiry_sweep_secs() -> u64 {
    60
}

const fn default_autoshare_tick_secs() -> u64 {
    10
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            dispatch_pacing_ms: default_dispatch_pacing_ms(),
            expiry_sweep_secs: default_expiry_sweep_secs(),
            autoshare_tick_secs: default_autoshare_tick_secs(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates bot settings from a key lookup. Unparsable values fall back to defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            dispatch_pacing_ms: number("DISPATCH_PACING_MS")
                .unwrap_or_else(default_dispatch_pacing_ms),
            expiry_sweep_secs: number("EXPIRY_SWEEP_SECS")
                .filter(|&s| s > 0)
                .unwrap_or_else(default_expiry_sweep_secs),
            autoshare_tick_secs: number("AUTOSHARE_TICK_SECS")
                .filter(|&s| s > 0)
                .unwrap_or_else(default_autoshare_tick_secs),
        }
    }

    #[must_use]
    pub const fn dispatch_pacing(&self) -> Duration {
        Duration::from_millis(self.dispatch_pacing_ms)
    }

    #[must_use]
    pub const fn expiry_sweep_period(&self) -> Duration {
        Duration::from_secs(self.expiry_sweep_secs)
    }

    #[must_use]
    pub const fn autoshare_tick_period(&self) -> Duration {
        Duration::from_secs(self.autoshare_tick_secs)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid owner id '{0}' (must be an integer)")]
    InvalidOwnerId(String),

    #[error("OWNER_IDS must contain at least one id")]
    NoOwners,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.dispatch_pacing(), Duration::from_millis(300));
        assert_eq!(settings.expiry_sweep_secs, 60);
        assert_eq!(settings.autoshare_tick_secs, 10);
    }

    #[test]
    fn test_settings_ignore_bad_values() {
        let settings = BotSettings::from_lookup(lookup(&[
            ("DISPATCH_PACING_MS", "50"),
            ("EXPIRY_SWEEP_SECS", "0"),
            ("AUTOSHARE_TICK_SECS", "soon"),
        ]));
        assert_eq!(settings.dispatch_pacing_ms, 50);
        assert_eq!(settings.expiry_sweep_secs, 60);
        assert_eq!(settings.autoshare_tick_secs, 10);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = BotConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("OWNER_IDS", " 10, 20 ,10,"),
            ("DEVELOPER", "@dev"),
        ]))
        .unwrap();

        assert_eq!(config.token, "123:abc");
        assert_eq!(config.owner_ids, vec![10, 20]);
        assert_eq!(config.developer, "@dev");
        assert_eq!(config.channel_username, "@channel");
        assert!(!config.require_channel_join);
        assert!(!format!("{config:?}").contains("123:abc"));
    }

    #[test]
    fn test_channel_join_flag() {
        let base = [("BOT_TOKEN", "t"), ("OWNER_IDS", "1")];

        let with_channel = BotConfig::from_lookup(lookup(&[
            base[0],
            base[1],
            ("CHANNEL_USERNAME", "@news"),
        ]))
        .unwrap();
        assert!(with_channel.require_channel_join);

        let opted_out = BotConfig::from_lookup(lookup(&[
            base[0],
            base[1],
            ("CHANNEL_USERNAME", "@news"),
            ("REQUIRE_CHANNEL_JOIN", "off"),
        ]))
        .unwrap();
        assert!(!opted_out.require_channel_join);

        let forced = BotConfig::from_lookup(lookup(&[
            base[0],
            base[1],
            ("REQUIRE_CHANNEL_JOIN", "YES"),
        ]))
        .unwrap();
        assert!(forced.require_channel_join);
        assert_eq!(forced.channel_username, "@channel");
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[("OWNER_IDS", "1")])),
            Err(ConfigError::MissingEnvVar("BOT_TOKEN"))
        ));
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("OWNER_IDS", "1,x")])),
            Err(ConfigError::InvalidOwnerId(id)) if id == "x"
        ));
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("OWNER_IDS", " , ")])),
            Err(ConfigError::NoOwners)
        ));
    }
}
