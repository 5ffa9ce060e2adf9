use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crier_core::content::{BroadcastContent, Button};
use crier_core::delivery::{DeliveryResult, MessageSender, RecipientSource};
use crier_core::errors::SourceError;

/// Fixed spacing between consecutive sends. Constant pacing, not an
/// adaptive rate limiter.
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);

/// Executes a confirmed draft against the recipient roster: one
/// snapshot, strictly sequential sends, per-recipient failure
/// isolation. One-shot — no retry, no resume, no cancellation once a
/// pass has started.
pub struct DeliveryDispatcher {
    source: Arc<dyn RecipientSource>,
    sender: Arc<dyn MessageSender>,
    pacing: Duration,
}

impl DeliveryDispatcher {
    pub fn new(source: Arc<dyn RecipientSource>, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            source,
            sender,
            pacing: DEFAULT_PACING,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run one delivery pass. Recipients registered after the snapshot
    /// is taken are not delivered to, even while the pass is still in
    /// progress.
    #[instrument(skip(self, content, button), fields(kind = content.kind()))]
    pub async fn run(
        &self,
        content: &BroadcastContent,
        button: Option<&Button>,
    ) -> Result<DeliveryResult, SourceError> {
        let snapshot = self.source.list_recipients().await?;
        let attempted = snapshot.len();
        let mut succeeded = 0usize;

        for recipient in &snapshot {
            match self.sender.send(recipient, content, button).await {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "delivery failed");
                }
            }
            tokio::time::sleep(self.pacing).await;
        }

        let result = DeliveryResult { attempted, succeeded };
        info!(attempted, succeeded, "broadcast pass complete");
        Ok(result)
    }
}
