//! Premium expiry sweep.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info};

use super::PeriodicTask;
use crate::state::{Snapshot, StateStore, StoreError, UserId};
use crate::telegram::{LinkButton, Notice, Notifier};

const EXPIRED_NOTICE: &str = "<blockquote>💎 Premium Expired</blockquote>\n\
Your <b>Premium</b> access has <b>ended</b> and was revoked automatically ⏳\n\n\
You can renew it at any time to keep using:\n\
• 🚀 Share &amp; broadcast to groups\n\
• 🧩 Premium-only tools\n\n\
Tap a button below 💎👇";

/// Removes every grant with `expires_at <= now` and returns the affected users.
pub fn evict_expired(snapshot: &mut Snapshot, now: i64) -> Vec<UserId> {
    let expired: Vec<UserId> = snapshot
        .premium
        .iter()
        .filter(|&(_, &expires_at)| expires_at <= now)
        .map(|(&user, _)| user)
        .collect();

    for user in &expired {
        snapshot.premium.remove(user);
    }
    expired
}

/// Periodic sweep revoking expired premium grants.
pub struct ExpirySweeper {
    store: Arc<StateStore>,
    notifier: Notifier,
    renew_url: String,
    channel_url: String,
}

impl ExpirySweeper {
    pub fn new(
        store: Arc<StateStore>,
        notifier: Notifier,
        renew_url: impl Into<String>,
        channel_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            renew_url: renew_url.into(),
            channel_url: channel_url.into(),
        }
    }

    /// Runs one sweep at `now`. The snapshot is saved even when nothing expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be persisted; nobody is
    /// notified in that case.
    pub async fn sweep(&self, now: i64) -> Result<Vec<UserId>, StoreError> {
        let expired = self.store.update(|s| evict_expired(s, now)).await?;

        if expired.is_empty() {
            debug!("Expiry sweep: nothing expired");
            return Ok(expired);
        }

        let notice = Notice::new(EXPIRED_NOTICE)
            .with_button(LinkButton::new("💎 Renew Premium", &self.renew_url))
            .with_button(LinkButton::new("📢 Channel Info", &self.channel_url));

        for &user in &expired {
            info!("Premium expired and revoked for {}", user);
            self.notifier.notice(user, &notice).await;
        }
        Ok(expired)
    }
}

#[async_trait]
impl PeriodicTask for ExpirySweeper {
    fn name(&self) -> &'static str {
        "Premium expiry"
    }

    async fn tick(&self) {
        if let Err(e) = self.sweep(Utc::now().timestamp()).await {
            error!("Premium expiry sweep failed: {}", e);
        }
    }
}

impl std::fmt::Debug for ExpirySweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirySweeper")
            .field("renew_url", &self.renew_url)
            .field("channel_url", &self.channel_url)
            .finish_non_exhaustive()
    }
}
