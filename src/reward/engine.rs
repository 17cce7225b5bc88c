//! Reward state machine driven by the bot's group membership changes.
//!
//! Each event is handled in two phases. The decision is applied to the
//! snapshot and persisted first; notifications follow and are best-effort.
//! A persistence failure ends the event before anything is sent.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::ladder::{GrantDuration, MIN_GROUP_MEMBERS, MIN_LADDER_GROUPS, apply_grant, grant_for};
use crate::access::Authority;
use crate::state::{ChatId, Snapshot, StateStore, StoreError, UserId};
use crate::telegram::{ChatPlatform, Notice, Notifier, escape_html};

/// Direction of a membership change of the bot in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Bot became member or administrator.
    Joined,
    /// Bot left, was kicked, banned or restricted.
    Left,
}

/// User who caused the membership change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub id: ChatId,
    pub title: String,
}

/// Membership change of the bot in a group or supergroup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEvent {
    pub actor: Actor,
    pub group: GroupRef,
    pub transition: Transition,
}

/// Result of a join transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    AlreadyTracked,
    /// Group too small. The counter increment stands.
    Disqualified { total: u32, member_count: u32 },
    BelowLadder { total: u32 },
    Granted {
        total: u32,
        grant: GrantDuration,
        expires_at: i64,
    },
}

/// Result of a leave transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    NotTracked,
    Removed {
        /// Counter after the decrement; `None` if the user had none.
        remaining: Option<u32>,
        /// Whether an existing grant was deleted.
        revoked: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardOutcome {
    Join(JoinOutcome),
    Leave(LeaveOutcome),
}

/// Applies a join of `group` credited to `user`.
pub fn apply_join(
    snapshot: &mut Snapshot,
    user: UserId,
    group: ChatId,
    member_count: u32,
    now: i64,
) -> JoinOutcome {
    if !snapshot.track_group(group) {
        return JoinOutcome::AlreadyTracked;
    }

    let counter = snapshot.user_group_count.entry(user).or_insert(0);
    *counter = counter.saturating_add(1);
    let total = *counter;

    if member_count < MIN_GROUP_MEMBERS {
        return JoinOutcome::Disqualified {
            total,
            member_count,
        };
    }

    match grant_for(total) {
        Some(grant) => {
            let expires_at = apply_grant(snapshot.premium_expiry(user), now, grant);
            snapshot.premium.insert(user, expires_at);
            JoinOutcome::Granted {
                total,
                grant,
                expires_at,
            }
        }
        None => JoinOutcome::BelowLadder { total },
    }
}

/// Applies a leave of `group` credited to `user`.
pub fn apply_leave(snapshot: &mut Snapshot, user: UserId, group: ChatId) -> LeaveOutcome {
    if !snapshot.untrack_group(group) {
        return LeaveOutcome::NotTracked;
    }

    let Some(counter) = snapshot.user_group_count.get_mut(&user) else {
        return LeaveOutcome::Removed {
            remaining: None,
            revoked: false,
        };
    };
    *counter = counter.saturating_sub(1);
    let remaining = *counter;

    let revoked = remaining < MIN_LADDER_GROUPS && snapshot.premium.remove(&user).is_some();
    LeaveOutcome::Removed {
        remaining: Some(remaining),
        revoked,
    }
}

/// Handles membership events end to end.
pub struct RewardEngine {
    store: Arc<StateStore>,
    platform: Arc<dyn ChatPlatform>,
    notifier: Notifier,
    authority: Arc<Authority>,
    backup_dir: PathBuf,
}

impl RewardEngine {
    pub fn new(
        store: Arc<StateStore>,
        platform: Arc<dyn ChatPlatform>,
        authority: Arc<Authority>,
        backup_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            notifier: Notifier::new(Arc::clone(&platform)),
            platform,
            authority,
            backup_dir: backup_dir.into(),
        }
    }

    /// Processes one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting snapshot could not be persisted.
    pub async fn handle(
        &self,
        event: &MembershipEvent,
        now: DateTime<Utc>,
    ) -> Result<RewardOutcome, StoreError> {
        match event.transition {
            Transition::Joined => self.handle_join(event, now).await.map(RewardOutcome::Join),
            Transition::Left => self.handle_leave(event, now).await.map(RewardOutcome::Leave),
        }
    }

    async fn handle_join(
        &self,
        event: &MembershipEvent,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        let group = event.group.id;
        if self.store.view(|s| s.is_group_tracked(group)).await {
            debug!("Group {} already tracked, ignoring join", group);
            return Ok(JoinOutcome::AlreadyTracked);
        }

        let member_count = self.member_count(group).await;
        let user = event.actor.id;
        let outcome = self
            .store
            .update(|s| apply_join(s, user, group, member_count, now.timestamp()))
            .await?;

        info!(
            "Bot added to {} by {} ({} members): {:?}",
            group, user, member_count, outcome
        );

        match outcome {
            JoinOutcome::AlreadyTracked => return Ok(outcome),
            JoinOutcome::Disqualified { member_count, .. } => {
                let text = format!(
                    "⚠️ Group <b>{}</b> only has {member_count} members.\n\
                     ❌ At least {MIN_GROUP_MEMBERS} members are required.",
                    escape_html(&event.group.title)
                );
                self.notifier.notice(user, &Notice::new(text)).await;
                return Ok(outcome);
            }
            JoinOutcome::BelowLadder { total } => {
                let needed = MIN_LADDER_GROUPS.saturating_sub(total);
                let text = format!(
                    "🎉 You added the bot to <b>{total} group(s) (≥{MIN_GROUP_MEMBERS} members)</b>!\n\
                     ➕ Add {needed} more to unlock premium."
                );
                self.notifier.notice(user, &Notice::new(text)).await;
            }
            JoinOutcome::Granted { total, grant, .. } => {
                let text = format!(
                    "🎉 You added the bot to <b>{total} groups (≥{MIN_GROUP_MEMBERS} members)</b>!\n\
                     ✅ Premium active: <b>{}</b>!",
                    grant.describe()
                );
                self.notifier.notice(user, &Notice::new(text)).await;
            }
        }

        let reward = match outcome {
            JoinOutcome::Granted { grant, .. } => grant.describe(),
            _ => "none yet".to_owned(),
        };
        let audit = format!(
            "<b>➕ Bot added to a new group!</b>\n\n{}\n▢ <b>Reward:</b> {reward}",
            audit_details(event, member_count)
        );
        self.audit(&audit, now).await;
        Ok(outcome)
    }

    async fn handle_leave(
        &self,
        event: &MembershipEvent,
        now: DateTime<Utc>,
    ) -> Result<LeaveOutcome, StoreError> {
        let group = event.group.id;
        if !self.store.view(|s| s.is_group_tracked(group)).await {
            debug!("Group {} not tracked, ignoring leave", group);
            return Ok(LeaveOutcome::NotTracked);
        }

        let user = event.actor.id;
        let outcome = self.store.update(|s| apply_leave(s, user, group)).await?;
        info!("Bot removed from {} by {}: {:?}", group, user, outcome);

        let LeaveOutcome::Removed { revoked, .. } = outcome else {
            return Ok(outcome);
        };

        if revoked {
            let text = "❌ You removed the bot from a group.\n🔒 Premium was revoked automatically.";
            self.notifier.text(user, text).await;
        }

        let member_count = self.member_count(group).await;
        let audit = format!(
            "<b>⚠️ Bot removed from a group!</b>\n\n{}",
            audit_details(event, member_count)
        );
        self.audit(&audit, now).await;
        Ok(outcome)
    }

    async fn member_count(&self, group: ChatId) -> u32 {
        match self.platform.member_count(group).await {
            Ok(count) => count,
            Err(e) => {
                warn!("Member count lookup for {} failed: {}", group, e);
                0
            }
        }
    }

    /// Sends the audit notice and a fresh backup to the primary owner.
    async fn audit(&self, html: &str, now: DateTime<Utc>) {
        let Some(owner) = self.authority.primary_owner() else {
            return;
        };

        self.notifier.notice(owner, &Notice::new(html)).await;

        match self.store.backup(&self.backup_dir, now).await {
            Ok(path) => self.notifier.file(owner, &path, "Automatic data backup").await,
            Err(e) => warn!("Automatic backup failed: {}", e),
        }
    }
}

impl std::fmt::Debug for RewardEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardEngine")
            .field("backup_dir", &self.backup_dir)
            .finish_non_exhaustive()
    }
}

fn audit_details(event: &MembershipEvent, member_count: u32) -> String {
    let actor = &event.actor;
    format!(
        "▢ <b>User:</b> <a href=\"tg://user?id={id}\">{name}</a>\n\
         ▢ <b>User ID:</b> <code>{id}</code>\n\
         ▢ <b>Username:</b> @{username}\n\
         ▢ <b>Group:</b> {title}\n\
         ▢ <b>Group ID:</b> <code>{group}</code>\n\
         ▢ <b>Members:</b> {member_count}",
        id = actor.id,
        name = escape_html(&actor.first_name),
        username = actor.username.as_deref().map_or_else(|| "-".to_owned(), escape_html),
        title = escape_html(&event.group.title),
        group = event.group.id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::ladder::PERMANENT_GRANT_DAYS;
    use crate::state::MemoryStore;
    use crate::telegram::mock::{MockPlatform, SentKind};

    const OWNER: UserId = 1;
    const USER: UserId = 42;
    const G1: ChatId = -1_001;
    const G2: ChatId = -1_002;

    fn event(group: ChatId, transition: Transition) -> MembershipEvent {
        MembershipEvent {
            actor: Actor {
                id: USER,
                first_name: "Alice".to_owned(),
                username: Some("alice".to_owned()),
            },
            group: GroupRef {
                id: group,
                title: format!("Group {group}"),
            },
            transition,
        }
    }

    struct Fixture {
        engine: RewardEngine,
        store: Arc<StateStore>,
        backend: Arc<MemoryStore>,
        platform: Arc<MockPlatform>,
        _backups: tempfile::TempDir,
    }

    fn fixture(platform: MockPlatform) -> Fixture {
        let backend = Arc::new(MemoryStore::new(Snapshot::with_owners(&[OWNER])));
        let store = Arc::new(StateStore::open(Arc::clone(&backend)));
        let platform = Arc::new(platform);
        let backups = tempfile::tempdir().unwrap();
        let engine = RewardEngine::new(
            Arc::clone(&store),
            platform.clone(),
            Arc::new(Authority::new(vec![OWNER])),
            backups.path(),
        );
        Fixture {
            engine,
            store,
            backend,
            platform,
            _backups: backups,
        }
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_apply_join_counts_small_groups() {
        let mut snapshot = Snapshot::default();
        let outcome = apply_join(&mut snapshot, USER, G1, 5, 0);

        assert_eq!(
            outcome,
            JoinOutcome::Disqualified {
                total: 1,
                member_count: 5
            }
        );
        assert_eq!(snapshot.group_count(USER), 1);
        assert!(snapshot.is_group_tracked(G1));
        assert!(snapshot.premium.is_empty());
    }

    #[test]
    fn test_apply_join_ignores_tracked_group() {
        let mut snapshot = Snapshot::default();
        snapshot.track_group(G1);

        assert_eq!(apply_join(&mut snapshot, USER, G1, 50, 0), JoinOutcome::AlreadyTracked);
        assert_eq!(snapshot.group_count(USER), 0);
    }

    #[test]
    fn test_apply_join_tenth_group_is_permanent() {
        let mut snapshot = Snapshot::default();
        snapshot.user_group_count.insert(USER, 9);

        let outcome = apply_join(&mut snapshot, USER, G1, 30, 1_000);
        assert_eq!(
            outcome,
            JoinOutcome::Granted {
                total: 10,
                grant: GrantDuration::Permanent,
                expires_at: 1_000 + PERMANENT_GRANT_DAYS * 86_400,
            }
        );
    }

    #[test]
    fn test_apply_leave_floors_and_revokes() {
        let mut snapshot = Snapshot::default();
        snapshot.track_group(G1);
        snapshot.user_group_count.insert(USER, 0);
        snapshot.premium.insert(USER, 99);

        let outcome = apply_leave(&mut snapshot, USER, G1);
        assert_eq!(
            outcome,
            LeaveOutcome::Removed {
                remaining: Some(0),
                revoked: true
            }
        );
        assert!(snapshot.premium.is_empty());
    }

    #[test]
    fn test_apply_leave_without_counter_keeps_grant() {
        let mut snapshot = Snapshot::default();
        snapshot.track_group(G1);
        snapshot.premium.insert(USER, 99);

        let outcome = apply_leave(&mut snapshot, USER, G1);
        assert_eq!(
            outcome,
            LeaveOutcome::Removed {
                remaining: None,
                revoked: false
            }
        );
        assert_eq!(snapshot.premium_expiry(USER), Some(99));
        assert_eq!(apply_leave(&mut snapshot, USER, G1), LeaveOutcome::NotTracked);
    }

    #[tokio::test]
    async fn test_join_join_leave_scenario() {
        let f = fixture(
            MockPlatform::new()
                .with_member_count(G1, 25)
                .with_member_count(G2, 22),
        );
        let now = 1_700_000_000;

        let first = f.engine.handle(&event(G1, Transition::Joined), ts(now)).await.unwrap();
        assert_eq!(first, RewardOutcome::Join(JoinOutcome::BelowLadder { total: 1 }));
        let snapshot = f.store.read().await;
        assert_eq!(snapshot.group_count(USER), 1);
        assert!(snapshot.is_group_tracked(G1));
        assert!(snapshot.premium.is_empty());
        assert!(f.platform.sent_to(USER)[0].body.contains("Add 1 more"));

        let second = f.engine.handle(&event(G2, Transition::Joined), ts(now)).await.unwrap();
        assert_eq!(
            second,
            RewardOutcome::Join(JoinOutcome::Granted {
                total: 2,
                grant: GrantDuration::Days(1),
                expires_at: now + 86_400,
            })
        );

        let third = f.engine.handle(&event(G1, Transition::Left), ts(now)).await.unwrap();
        assert_eq!(
            third,
            RewardOutcome::Leave(LeaveOutcome::Removed {
                remaining: Some(1),
                revoked: true
            })
        );

        let snapshot = f.store.read().await;
        assert_eq!(snapshot.group_count(USER), 1);
        assert!(snapshot.premium.is_empty());
        assert!(!snapshot.is_group_tracked(G1));
        assert!(snapshot.is_group_tracked(G2));
        assert_eq!(f.backend.stored(), snapshot);

        let owner_msgs = f.platform.sent_to(OWNER);
        let audits = owner_msgs.iter().filter(|s| s.kind == SentKind::Notice).count();
        let backups = owner_msgs.iter().filter(|s| s.kind == SentKind::File).count();
        assert_eq!((audits, backups), (3, 3));
        assert!(
            f.platform
                .sent_to(USER)
                .iter()
                .any(|s| s.body.contains("revoked"))
        );
    }

    #[tokio::test]
    async fn test_small_group_notifies_user_only() {
        let f = fixture(MockPlatform::new().with_member_count(G1, 3));

        let outcome = f.engine.handle(&event(G1, Transition::Joined), ts(10)).await.unwrap();
        assert!(matches!(
            outcome,
            RewardOutcome::Join(JoinOutcome::Disqualified { member_count: 3, .. })
        ));
        assert_eq!(f.platform.sent_to(USER).len(), 1);
        assert!(f.platform.sent_to(OWNER).is_empty());
    }

    #[tokio::test]
    async fn test_member_count_failure_counts_as_zero() {
        let f = fixture(MockPlatform::new());

        let outcome = f.engine.handle(&event(G1, Transition::Joined), ts(10)).await.unwrap();
        assert_eq!(
            outcome,
            RewardOutcome::Join(JoinOutcome::Disqualified {
                total: 1,
                member_count: 0
            })
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_sends_nothing() {
        let f = fixture(MockPlatform::new().with_member_count(G1, 40));
        f.backend.set_fail_saves(true);

        let result = f.engine.handle(&event(G1, Transition::Joined), ts(10)).await;

        assert!(result.is_err());
        assert!(f.platform.sent().is_empty());
        assert!(!f.store.read().await.is_group_tracked(G1));
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_state() {
        let f = fixture(
            MockPlatform::new()
                .with_member_count(G1, 40)
                .fail_for(USER)
                .fail_for(OWNER),
        );

        let outcome = f.engine.handle(&event(G1, Transition::Joined), ts(10)).await.unwrap();
        assert_eq!(outcome, RewardOutcome::Join(JoinOutcome::BelowLadder { total: 1 }));
        assert_eq!(f.backend.stored().group_count(USER), 1);
    }
}
