use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::{BroadcastContent, Button};
use crate::errors::{SendError, SourceError};
use crate::ids::RecipientId;

/// Outcome of one dispatch pass. Lives only for the duration of the
/// run; nothing here is persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub attempted: usize,
    pub succeeded: usize,
}

impl fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempted {}, succeeded {}", self.attempted, self.succeeded)
    }
}

/// Yields the full current recipient membership at call time.
#[async_trait]
pub trait RecipientSource: Send + Sync {
    async fn list_recipients(&self) -> Result<Vec<RecipientId>, SourceError>;
}

/// Delivers one content item, with an optional action button, to one
/// recipient.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(
        &self,
        recipient: &RecipientId,
        content: &BroadcastContent,
        button: Option<&Button>,
    ) -> Result<(), SendError>;
}
