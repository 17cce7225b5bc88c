//! Configuration module for the membership bot.
//!
//! Handles loading of credentials, owner ids and tuning settings from the
//! environment.

mod settings;

pub use settings::{BotConfig, BotSettings, ConfigError};

/// Default path of the persisted data file.
pub const DEFAULT_DATA_FILE: &str = "data.json";

/// Default directory for snapshot backups.
pub const DEFAULT_BACKUP_DIR: &str = "backup";

/// Builds a `t.me` link from a handle such as `@name`. Full URLs pass through.
#[must_use]
pub fn telegram_link(handle: &str) -> String {
    let handle = handle.trim();
    if handle.starts_with("https://") || handle.starts_with("http://") {
        handle.to_owned()
    } else {
        format!("https://t.me/{}", handle.trim_start_matches('@'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_link() {
        assert_eq!(telegram_link("@dev"), "https://t.me/dev");
        assert_eq!(telegram_link("dev"), "https://t.me/dev");
        assert_eq!(telegram_link("https://t.me/+abc"), "https://t.me/+abc");
    }
}
