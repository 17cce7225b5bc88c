//! Recurring auto-share of owner-configured content to every tracked group.
//!
//! Configurations are process-local and are lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::PeriodicTask;
use crate::dispatch::{ContentPayload, DispatchEngine, DispatchReport, Framing};
use crate::state::{StateStore, UserId};

/// Errors returned when changing an auto-share configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutoShareError {
    #[error("No auto-share content set")]
    NoContent,
}

/// Auto-share configuration of one owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoShareConfig {
    pub active: bool,
    pub content: Option<ContentPayload>,
    /// Epoch milliseconds of the last send (or of activation).
    pub last_sent_ms: i64,
}

/// Per-owner auto-share configurations.
#[derive(Debug, Default)]
pub struct AutoShareRegistry {
    configs: Mutex<HashMap<UserId, AutoShareConfig>>,
}

impl AutoShareRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores new content. The configuration is replaced by an inactive one.
    pub async fn set_content(&self, owner: UserId, content: ContentPayload) {
        self.configs.lock().await.insert(
            owner,
            AutoShareConfig {
                active: false,
                content: Some(content),
                last_sent_ms: 0,
            },
        );
    }

    /// Turns auto-share on. The first send waits one full window.
    pub async fn activate(&self, owner: UserId, now_ms: i64) -> Result<(), AutoShareError> {
        let mut configs = self.configs.lock().await;
        let config = configs.entry(owner).or_default();
        if config.content.is_none() {
            return Err(AutoShareError::NoContent);
        }
        config.active = true;
        config.last_sent_ms = now_ms;
        Ok(())
    }

    pub async fn deactivate(&self, owner: UserId) {
        self.configs.lock().await.entry(owner).or_default().active = false;
    }

    /// Returns the owner's configuration, creating an empty one if needed.
    pub async fn status(&self, owner: UserId) -> AutoShareConfig {
        self.configs.lock().await.entry(owner).or_default().clone()
    }

    /// Marks every due configuration as sent at `now_ms` and returns its content.
    pub async fn claim_due(&self, now_ms: i64, window_ms: i64) -> Vec<(UserId, ContentPayload)> {
        let mut configs = self.configs.lock().await;
        let mut due = Vec::new();

        for (&owner, config) in configs.iter_mut() {
            if !config.active || now_ms.saturating_sub(config.last_sent_ms) < window_ms {
                continue;
            }
            if let Some(content) = &config.content {
                config.last_sent_ms = now_ms;
                due.push((owner, content.clone()));
            }
        }
        due
    }
}

/// Periodic task that dispatches due auto-share content to all groups.
pub struct AutoShareScheduler {
    registry: Arc<AutoShareRegistry>,
    store: Arc<StateStore>,
    engine: Arc<DispatchEngine>,
    footer: String,
}

impl AutoShareScheduler {
    pub fn new(
        registry: Arc<AutoShareRegistry>,
        store: Arc<StateStore>,
        engine: Arc<DispatchEngine>,
        developer: &str,
    ) -> Self {
        Self {
            registry,
            store,
            engine,
            footer: format!("\n\n~~ Autoshare By {developer} ~~"),
        }
    }

    /// Dispatches every configuration due at `now_ms`.
    pub async fn run_due(&self, now_ms: i64) -> Vec<(UserId, DispatchReport)> {
        let (groups, window_secs) = self
            .store
            .view(|s| (s.groups.clone(), s.settings.cooldown_window_secs()))
            .await;

        if groups.is_empty() {
            debug!("Auto-share tick skipped: no groups");
            return Vec::new();
        }

        let due = self
            .registry
            .claim_due(now_ms, window_secs.saturating_mul(1000))
            .await;

        let framing = Framing::footer(self.footer.clone());
        let mut reports = Vec::with_capacity(due.len());
        for (owner, content) in due {
            let report = self.engine.dispatch(&groups, &content, &framing).await;
            info!(
                "Auto-share for owner {}: {} succeeded, {} failed",
                owner, report.succeeded, report.failed
            );
            reports.push((owner, report));
        }
        reports
    }
}

#[async_trait]
impl PeriodicTask for AutoShareScheduler {
    fn name(&self) -> &'static str {
        "Auto-share"
    }

    async fn tick(&self) {
        self.run_due(Utc::now().timestamp_millis()).await;
    }
}

impl std::fmt::Debug for AutoShareScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoShareScheduler")
            .field("footer", &self.footer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::{MemoryStore, Snapshot};
    use crate::telegram::mock::MockPlatform;

    const OWNER: UserId = 1;
    const WINDOW_MS: i64 = 15 * 60 * 1000;

    fn scheduler(groups: &[i64], platform: &Arc<MockPlatform>) -> AutoShareScheduler {
        let mut snapshot = Snapshot::default();
        snapshot.groups = groups.to_vec();
        let store = Arc::new(StateStore::open(MemoryStore::new(snapshot)));
        let engine = DispatchEngine::new(platform.clone()).with_pacing(Duration::ZERO);
        AutoShareScheduler::new(
            Arc::new(AutoShareRegistry::new()),
            store,
            Arc::new(engine),
            "@dev",
        )
    }

    #[tokio::test]
    async fn test_activation_requires_content() {
        let registry = AutoShareRegistry::new();
        assert_eq!(registry.activate(OWNER, 0).await, Err(AutoShareError::NoContent));
        assert!(!registry.status(OWNER).await.active);
    }

    #[tokio::test]
    async fn test_new_content_deactivates() {
        let registry = AutoShareRegistry::new();
        registry.set_content(OWNER, ContentPayload::text("a")).await;
        registry.activate(OWNER, 500).await.unwrap();

        registry.set_content(OWNER, ContentPayload::text("b")).await;
        let status = registry.status(OWNER).await;
        assert!(!status.active);
        assert_eq!(status.last_sent_ms, 0);
        assert_eq!(status.content, Some(ContentPayload::text("b")));
    }

    #[tokio::test]
    async fn test_first_send_waits_one_window() {
        let registry = AutoShareRegistry::new();
        registry.set_content(OWNER, ContentPayload::text("a")).await;
        registry.activate(OWNER, 1_000).await.unwrap();

        assert!(registry.claim_due(1_000 + WINDOW_MS - 1, WINDOW_MS).await.is_empty());
        assert_eq!(registry.claim_due(1_000 + WINDOW_MS, WINDOW_MS).await.len(), 1);
        assert!(registry.claim_due(1_000 + WINDOW_MS + 10, WINDOW_MS).await.is_empty());
    }

    #[tokio::test]
    async fn test_run_due_appends_footer() {
        let platform = Arc::new(MockPlatform::new().fail_for(-2));
        let scheduler = scheduler(&[-1, -2, -3], &platform);
        scheduler.registry.set_content(OWNER, ContentPayload::text("promo")).await;
        scheduler.registry.activate(OWNER, 0).await.unwrap();

        let reports = scheduler.run_due(WINDOW_MS).await;

        assert_eq!(reports.len(), 1);
        assert_eq!((reports[0].1.succeeded, reports[0].1.failed), (2, 1));
        assert_eq!(platform.sent_to(-1)[0].body, "promo\n\n~~ Autoshare By @dev ~~");
        assert_eq!(scheduler.registry.status(OWNER).await.last_sent_ms, WINDOW_MS);
    }

    #[tokio::test]
    async fn test_no_groups_is_noop() {
        let platform = Arc::new(MockPlatform::new());
        let scheduler = scheduler(&[], &platform);
        scheduler.registry.set_content(OWNER, ContentPayload::text("promo")).await;
        scheduler.registry.activate(OWNER, 0).await.unwrap();

        assert!(scheduler.run_due(WINDOW_MS).await.is_empty());
        assert_eq!(scheduler.registry.status(OWNER).await.last_sent_ms, 0);
        assert!(platform.attempts().is_empty());
    }
}
