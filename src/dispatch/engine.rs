//! Paced fan-out of one payload to an ordered list of recipients.
//!
//! Recipients are attempted strictly in order. A failed send is counted and
//! the loop moves on; a fixed pause separates consecutive sends.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{ContentPayload, Framing};
use crate::state::ChatId;
use crate::telegram::{ChatPlatform, PlatformError};

/// Pause between two consecutive sends.
pub const DEFAULT_PACING: Duration = Duration::from_millis(300);

/// Aggregate result of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl DispatchReport {
    /// Multi-line summary shown to the operator.
    #[must_use]
    pub fn summary(&self, title: &str, target_label: &str) -> String {
        format!(
            "✅ {title} finished!\n\
             📊 Result:\n\
             • Total {target_label}: {}\n\
             • ✅ Succeeded: {}\n\
             • ❌ Failed: {}",
            self.total, self.succeeded, self.failed
        )
    }
}

/// Sends content to many recipients with failure isolation.
pub struct DispatchEngine {
    platform: Arc<dyn ChatPlatform>,
    pacing: Duration,
}

impl DispatchEngine {
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self {
            platform,
            pacing: DEFAULT_PACING,
        }
    }

    /// Sets the pause between consecutive sends.
    #[must_use]
    pub const fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Sends `content` to each target in order and tallies the outcome.
    pub async fn dispatch(
        &self,
        targets: &[ChatId],
        content: &ContentPayload,
        framing: &Framing,
    ) -> DispatchReport {
        let mut report = DispatchReport {
            total: targets.len(),
            ..DispatchReport::default()
        };

        for (index, &target) in targets.iter().enumerate() {
            match self.deliver(target, content, framing).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    debug!("Delivery of {} to {} failed: {}", content.kind(), target, e);
                    report.failed += 1;
                }
            }

            if index + 1 < targets.len() && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        info!(
            "Dispatched {} to {} recipients: {} succeeded, {} failed",
            content.kind(),
            report.total,
            report.succeeded,
            report.failed
        );
        report
    }

    async fn deliver(
        &self,
        target: ChatId,
        content: &ContentPayload,
        framing: &Framing,
    ) -> Result<(), PlatformError> {
        match content {
            ContentPayload::Text { text } => {
                self.platform
                    .send_text(target, &framing.apply(Some(text)))
                    .await
            }
            ContentPayload::Photo { file_id, caption } => {
                let caption = framing.caption(caption.as_deref());
                self.platform
                    .send_photo(target, file_id, caption.as_deref())
                    .await
            }
            ContentPayload::Video { file_id, caption } => {
                let caption = framing.caption(caption.as_deref());
                self.platform
                    .send_video(target, file_id, caption.as_deref())
                    .await
            }
            ContentPayload::Document { file_id, caption } => {
                let caption = framing.caption(caption.as_deref());
                self.platform
                    .send_document(target, file_id, caption.as_deref())
                    .await
            }
            ContentPayload::Sticker { file_id } => {
                // Stickers take no caption: the header goes first as its own message.
                if let Some(header) = &framing.header
                    && let Err(e) = self.platform.send_text(target, header.trim_end()).await
                {
                    warn!("Header before sticker to {} failed: {}", target, e);
                }
                self.platform.send_sticker(target, file_id).await
            }
        }
    }
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

/// Removes duplicate ids, keeping the first occurrence of each.
#[must_use]
pub fn dedup_targets(ids: &[ChatId]) -> Vec<ChatId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
