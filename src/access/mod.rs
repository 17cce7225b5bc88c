//! Access tiers and their resolution.
//!
//! A user's tier is derived from the static owner configuration and the
//! current snapshot, never stored or cached.

mod channel;

pub use channel::ChannelGate;

use crate::state::{Snapshot, UserId};

/// Resolved privilege level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountTier {
    /// Statically configured owner.
    MainOwner,
    /// Elevated role granted by a main owner.
    Executive,
    /// Elevated role granted by a main owner or an executive.
    DelegatedOwner,
    /// User with an unexpired premium grant.
    Premium,
    Standard,
    /// Blocked from using the bot, regardless of any other role.
    Blacklisted,
}

impl AccountTier {
    /// Owner-level tiers may use owner commands (share config, grants, broadcast).
    #[must_use]
    pub const fn is_owner_level(self) -> bool {
        matches!(self, Self::MainOwner | Self::Executive | Self::DelegatedOwner)
    }

    /// Tiers allowed to add and remove delegated owners.
    #[must_use]
    pub const fn can_manage_delegated_owners(self) -> bool {
        matches!(self, Self::MainOwner | Self::Executive)
    }

    /// Main owners skip cooldowns and maintenance mode.
    #[must_use]
    pub const fn bypasses_gates(self) -> bool {
        matches!(self, Self::MainOwner)
    }

    #[must_use]
    pub const fn is_blacklisted(self) -> bool {
        matches!(self, Self::Blacklisted)
    }

    /// Human-readable tier name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MainOwner => "Main Owner",
            Self::Executive => "Executive",
            Self::DelegatedOwner => "Owner",
            Self::Premium => "Premium",
            Self::Standard => "Standard",
            Self::Blacklisted => "Blacklisted",
        }
    }
}

impl std::fmt::Display for AccountTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolves user ids to tiers.
#[derive(Debug, Clone)]
pub struct Authority {
    main_owners: Vec<UserId>,
}

impl Authority {
    /// Creates an authority for the statically configured owners.
    #[must_use]
    pub const fn new(main_owners: Vec<UserId>) -> Self {
        Self { main_owners }
    }

    /// The first configured owner receives audit messages and backups.
    #[must_use]
    pub fn primary_owner(&self) -> Option<UserId> {
        self.main_owners.first().copied()
    }

    #[must_use]
    pub fn is_main_owner(&self, user: UserId) -> bool {
        self.main_owners.contains(&user)
    }

    /// Static owners always count as delegated owners.
    #[must_use]
    pub fn is_delegated_owner(&self, user: UserId, snapshot: &Snapshot) -> bool {
        self.is_main_owner(user) || snapshot.owner.contains(&user)
    }

    #[must_use]
    pub fn is_executive(&self, user: UserId, snapshot: &Snapshot) -> bool {
        snapshot.ceo.contains(&user)
    }

    #[must_use]
    pub fn is_blacklisted(&self, user: UserId, snapshot: &Snapshot) -> bool {
        snapshot.blacklist.contains(&user)
    }

    /// A grant is active strictly before its expiry second.
    #[must_use]
    pub fn is_premium_now(&self, user: UserId, snapshot: &Snapshot, now: i64) -> bool {
        snapshot.premium_expiry(user).is_some_and(|expires_at| now < expires_at)
    }

    /// Resolves the single tier of `user` at `now`.
    #[must_use]
    pub fn tier_of(&self, user: UserId, snapshot: &Snapshot, now: i64) -> AccountTier {
        if self.is_blacklisted(user, snapshot) {
            AccountTier::Blacklisted
        } else if self.is_main_owner(user) {
            AccountTier::MainOwner
        } else if self.is_executive(user, snapshot) {
            AccountTier::Executive
        } else if self.is_delegated_owner(user, snapshot) {
            AccountTier::DelegatedOwner
        } else if self.is_premium_now(user, snapshot, now) {
            AccountTier::Premium
        } else {
            AccountTier::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: UserId = 1;

    fn authority() -> Authority {
        Authority::new(vec![OWNER])
    }

    #[test]
    fn test_main_owner_outranks_everything_but_blacklist() {
        let mut snap = Snapshot::with_owners(&[OWNER]);
        snap.ceo.push(OWNER);
        snap.premium.insert(OWNER, i64::MAX);
        assert_eq!(authority().tier_of(OWNER, &snap, 0), AccountTier::MainOwner);

        snap.blacklist.push(OWNER);
        assert_eq!(authority().tier_of(OWNER, &snap, 0), AccountTier::Blacklisted);
    }

    #[test]
    fn test_executive_outranks_delegated_owner() {
        let mut snap = Snapshot::with_owners(&[OWNER]);
        snap.owner.push(5);
        assert_eq!(authority().tier_of(5, &snap, 0), AccountTier::DelegatedOwner);

        snap.ceo.push(5);
        assert_eq!(authority().tier_of(5, &snap, 0), AccountTier::Executive);
    }

    #[test]
    fn test_static_owner_counts_as_delegated_owner() {
        let snap = Snapshot::default();
        assert!(authority().is_delegated_owner(OWNER, &snap));
        assert!(!authority().is_delegated_owner(2, &snap));
    }

    #[test]
    fn test_premium_boundary_is_exclusive() {
        let mut snap = Snapshot::default();
        snap.premium.insert(7, 1_000);

        assert!(authority().is_premium_now(7, &snap, 999));
        assert!(!authority().is_premium_now(7, &snap, 1_000));
        assert_eq!(authority().tier_of(7, &snap, 999), AccountTier::Premium);
        assert_eq!(authority().tier_of(7, &snap, 1_000), AccountTier::Standard);
    }

    #[test]
    fn test_capabilities() {
        assert!(AccountTier::DelegatedOwner.is_owner_level());
        assert!(!AccountTier::DelegatedOwner.can_manage_delegated_owners());
        assert!(AccountTier::Executive.can_manage_delegated_owners());
        assert!(AccountTier::MainOwner.bypasses_gates());
        assert!(!AccountTier::Executive.bypasses_gates());
        assert!(!AccountTier::Premium.is_owner_level());
    }
}
