//! Best-effort notifications.
//!
//! Failures are logged and swallowed; callers get no result to branch on.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{ChatPlatform, Notice};
use crate::state::ChatId;

/// Fire-and-forget sender layered over the chat platform.
#[derive(Clone)]
pub struct Notifier {
    platform: Arc<dyn ChatPlatform>,
}

impl Notifier {
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    pub async fn text(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.platform.send_text(chat, text).await {
            warn!("Notification to {} failed: {}", chat, e);
        }
    }

    pub async fn notice(&self, chat: ChatId, notice: &Notice) {
        match self.platform.send_notice(chat, notice).await {
            Ok(()) => debug!("Notice delivered to {}", chat),
            Err(e) => warn!("Notice to {} failed: {}", chat, e),
        }
    }

    pub async fn file(&self, chat: ChatId, path: &Path, caption: &str) {
        if let Err(e) = self.platform.send_file(chat, path, caption).await {
            warn!("Sending {} to {} failed: {}", path.display(), chat, e);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::mock::MockPlatform;

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let platform = Arc::new(MockPlatform::new().fail_for(5));
        let notifier = Notifier::new(platform.clone());

        notifier.text(5, "lost").await;
        notifier.text(6, "kept").await;

        assert!(platform.sent_to(5).is_empty());
        assert_eq!(platform.sent_to(6).len(), 1);
    }
}
