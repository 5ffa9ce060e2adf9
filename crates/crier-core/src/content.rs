use serde::{Deserialize, Serialize};

/// Raw operator submission before classification. Mirrors what a chat
/// frontend hands over: at most one payload slot populated, plus an
/// optional caption for media.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContentInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl ContentInput {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            text: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn photo(file_ref: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            photo: Some(file_ref.into()),
            caption,
            ..Self::default()
        }
    }

    pub fn video(file_ref: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            video: Some(file_ref.into()),
            caption,
            ..Self::default()
        }
    }
}

/// Broadcast payload. Exactly one kind; captions only exist for media.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BroadcastContent {
    Text {
        body: String,
    },
    Photo {
        file_ref: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Video {
        file_ref: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
}

impl BroadcastContent {
    /// Classify a raw submission into exactly one content kind.
    /// Precedence is photo, then video, then text; an input carrying
    /// none of the three is unclassifiable and the caller should ask
    /// the operator to resubmit.
    pub fn classify(input: ContentInput) -> Option<Self> {
        if let Some(file_ref) = input.photo {
            Some(Self::Photo {
                file_ref,
                caption: input.caption,
            })
        } else if let Some(file_ref) = input.video {
            Some(Self::Video {
                file_ref,
                caption: input.caption,
            })
        } else {
            input.text.map(|body| Self::Text { body })
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Photo { .. } => "photo",
            Self::Video { .. } => "video",
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Photo { caption, .. } | Self::Video { caption, .. } => caption.as_deref(),
        }
    }
}

/// Absolute-URL scheme marker that splits button targets into external
/// links versus in-app views.
const URL_SCHEME_MARKER: &str = "http";

/// Where an action button points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target_kind", rename_all = "snake_case")]
pub enum ButtonTarget {
    External { url: String },
    InAppView { url: String },
}

impl ButtonTarget {
    pub fn classify(target: impl Into<String>) -> Self {
        let target = target.into();
        if target.contains(URL_SCHEME_MARKER) {
            Self::External { url: target }
        } else {
            Self::InAppView { url: target }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::External { url } | Self::InAppView { url } => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::External { .. } => "external",
            Self::InAppView { .. } => "in_app_view",
        }
    }
}

/// Action button attached to delivered content. Constructed whole —
/// there is no representation for a label without a target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub target: ButtonTarget,
}

impl Button {
    pub fn new(label: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ButtonTarget::classify(target),
        }
    }
}
