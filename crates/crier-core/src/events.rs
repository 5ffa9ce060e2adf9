use serde::{Deserialize, Serialize};

use crate::content::ContentInput;
use crate::delivery::DeliveryResult;

/// Inbound operator events. The issuing operator's identity travels
/// alongside each event (see `ConversationEngine::handle`), not inside
/// it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperatorEvent {
    StartBroadcast,
    SubmitContent { input: ContentInput },
    SubmitButtonLabel { text: String },
    SubmitButtonLink { text: String },
    Preview,
    Confirm,
    Cancel,
}

impl OperatorEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StartBroadcast => "start_broadcast",
            Self::SubmitContent { .. } => "submit_content",
            Self::SubmitButtonLabel { .. } => "submit_button_label",
            Self::SubmitButtonLink { .. } => "submit_button_link",
            Self::Preview => "preview",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
        }
    }
}

/// Outbound reply for one handled event. `Silent` covers both the
/// unauthorized and the invalid-transition cases.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineReply {
    Silent,
    Prompt { text: String },
    Retry { text: String },
    Preview { rendering: String },
    Cancelled { text: String },
    Completed { result: DeliveryResult },
}

impl EngineReply {
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent)
    }
}
