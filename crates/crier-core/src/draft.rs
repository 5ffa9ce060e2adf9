use serde::{Deserialize, Serialize};

use crate::content::{BroadcastContent, Button};

/// Sentinel the operator sends at the button-label step to skip the
/// button entirely.
pub const NO_BUTTON_SENTINEL: &str = "-";

/// Dialog position of an in-progress draft. A pending button label
/// rides in the state tag so `Draft::button` is only ever a complete
/// label + target pair. Idle is represented by the absence of a draft.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DraftState {
    AwaitingContent,
    AwaitingButtonLabel,
    AwaitingButtonLink { label: String },
    AwaitingConfirmation,
}

/// In-progress broadcast definition assembled by one operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub state: DraftState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BroadcastContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<Button>,
}

impl Draft {
    pub fn new() -> Self {
        Self {
            state: DraftState::AwaitingContent,
            content: None,
            button: None,
        }
    }
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}
